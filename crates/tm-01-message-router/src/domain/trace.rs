//! Parsing of `key=value` diagnostic trace bodies.
//!
//! ```text
//! fl=29f1
//! ip=203.0.113.7
//! loc=DE
//! colo=FRA
//! ```

use shared_types::GeoTrace;

/// Extract `ip`, `loc` and `colo` from a trace body.
///
/// Lines without `=`, blank lines and unknown keys are skipped. The key is
/// everything before the first `=`; both sides are trimmed. A repeated key
/// keeps its last value.
pub fn parse_trace(body: &str) -> GeoTrace {
    let mut trace = GeoTrace::default();

    for line in body.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim() {
            "ip" => trace.ip = value,
            "loc" => trace.loc = value,
            "colo" => trace.colo = value,
            _ => {}
        }
    }

    trace
}
