//! Cloudflare `cdn-cgi/trace` geo lookup.

use std::time::Duration;

use async_trait::async_trait;
use shared_types::GeoTrace;

use crate::domain::{parse_trace, GeoTraceError};
use crate::ports::GeoTraceSource;

pub const DEFAULT_TRACE_URL: &str = "https://www.cloudflare.com/cdn-cgi/trace";

pub const DEFAULT_TRACE_TIMEOUT: Duration = Duration::from_secs(5);

/// One GET per lookup; the body is parsed with [`parse_trace`].
#[derive(Clone, Debug)]
pub struct CloudflareTrace {
    client: reqwest::Client,
    url: String,
}

impl CloudflareTrace {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, GeoTraceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeoTraceError::Request(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl GeoTraceSource for CloudflareTrace {
    async fn trace(&self) -> Result<GeoTrace, GeoTraceError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| GeoTraceError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoTraceError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeoTraceError::Request(e.to_string()))?;
        Ok(parse_trace(&body))
    }
}
