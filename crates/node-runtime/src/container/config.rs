//! # Node Configuration
//!
//! One immutable snapshot, built once at startup and shared as
//! `Arc<NodeConfig>`.
//!
//! ## Sources (later wins)
//!
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config`)
//! 3. Environment variables
//! 4. Command-line flags (binary only)
//!
//! | Variable | Field |
//! |----------|-------|
//! | `MARKET_WALLET` | `identity.wallet` |
//! | `MARKET_PRICE` | `identity.price` |
//! | `MARKET_ROLE` | `identity.role` |
//! | `LOCAL_ADDR` | `network.local_addr` |
//! | `LOCAL_PORT` | `network.local_port` |
//! | `IPFS_GATEWAY` | `content_store.gateway` |
//! | `NOTIFY_URL` | `sync.notify_url` |
//! | `RUN_MODE` | `runtime.run_mode` |
//!
//! ## Example
//!
//! ```toml
//! [identity]
//! wallet = "0x1B4b8A1a4F2e3c1d0E9f8a7B6c5D4e3F2a1B4413"
//! price = 5
//! role = "provider"
//!
//! [network]
//! local_addr = "203.0.113.7"
//! local_port = 7000
//!
//! [sync]
//! notify_url = "http://127.0.0.1:8080/orders/paid"
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_types::{NodeRole, WalletAddress};
use tm_01_message_router::{NodeIdentity, RouterConfig, DEFAULT_TRACE_URL};
use tm_02_order_processor::ProcessorConfig;
use tm_03_order_sync::{BackoffPolicy, SyncConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Release mode logs at `info`, debug mode at `debug`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Debug,
    #[default]
    Release,
}

impl RunMode {
    pub fn is_debug(self) -> bool {
        self == RunMode::Debug
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(RunMode::Debug),
            "release" => Ok(RunMode::Release),
            other => Err(format!("unknown run mode: {other}")),
        }
    }
}

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub identity: IdentityConfig,
    pub network: NetworkConfig,
    pub content_store: ContentStoreConfig,
    pub diagnostics: DiagnosticsConfig,
    pub sync: SyncSettings,
    pub runtime: RuntimeConfig,
}

/// Who this node is on the market.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Wallet that orders must be addressed to. Also the announced peer id.
    pub wallet: String,
    /// Advertised price per tunnel.
    pub price: u64,
    pub role: NodeRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address advertised to peers.
    pub local_addr: String,
    /// Advertised port. Tunnels are opened on `local_port + 1`.
    pub local_port: u16,
    /// Interface tunnel listeners bind to.
    pub bind_host: IpAddr,
    /// Pub/sub topic name.
    pub topic: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            local_addr: "127.0.0.1".to_string(),
            local_port: 7000,
            bind_host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            topic: shared_bus::DEFAULT_TOPIC.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentStoreConfig {
    pub gateway: String,
    pub fetch_timeout_secs: u64,
}

impl Default for ContentStoreConfig {
    fn default() -> Self {
        Self {
            gateway: tm_02_order_processor::adapters::ipfs_gateway::DEFAULT_GATEWAY.to_string(),
            fetch_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub trace_url: String,
    pub timeout_secs: u64,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            trace_url: DEFAULT_TRACE_URL.to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub enabled: bool,
    pub poll_interval_secs: u64,
    pub notify_delay_secs: u64,
    pub max_age_secs: u64,
    /// Client callback. Notifications are only logged when unset.
    pub notify_url: Option<String>,
    pub notify_timeout_secs: u64,
    pub backoff_initial_secs: u64,
    pub backoff_max_secs: u64,
    pub backoff_reset_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: 30,
            notify_delay_secs: 5,
            max_age_secs: 10 * 60,
            notify_url: None,
            notify_timeout_secs: 5,
            backoff_initial_secs: 1,
            backoff_max_secs: 60,
            backoff_reset_secs: 5 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub run_mode: RunMode,
    /// Print the effective configuration as JSON at startup.
    pub print_config: bool,
    pub heartbeat_interval_secs: u64,
    pub peer_ttl_secs: u64,
    /// How often subsystem statistics are copied into Prometheus gauges.
    pub metrics_interval_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            run_mode: RunMode::Release,
            print_config: false,
            heartbeat_interval_secs: 10,
            peer_ttl_secs: 60,
            metrics_interval_secs: 15,
        }
    }
}

impl NodeConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply overrides from `lookup`. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(wallet) = get("MARKET_WALLET") {
            self.identity.wallet = wallet;
        }
        if let Some(price) = get("MARKET_PRICE") {
            self.identity.price = parse_env("MARKET_PRICE", price)?;
        }
        if let Some(role) = get("MARKET_ROLE") {
            self.identity.role = parse_env("MARKET_ROLE", role)?;
        }
        if let Some(addr) = get("LOCAL_ADDR") {
            self.network.local_addr = addr;
        }
        if let Some(port) = get("LOCAL_PORT") {
            self.network.local_port = parse_env("LOCAL_PORT", port)?;
        }
        if let Some(gateway) = get("IPFS_GATEWAY") {
            self.content_store.gateway = gateway;
        }
        if let Some(url) = get("NOTIFY_URL") {
            self.sync.notify_url = Some(url);
        }
        if let Some(mode) = get("RUN_MODE") {
            self.runtime.run_mode = parse_env("RUN_MODE", mode)?;
        }
        Ok(())
    }

    /// Reject configurations the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.role == NodeRole::Provider && self.identity.wallet.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "provider role requires identity.wallet (MARKET_WALLET)".into(),
            ));
        }
        if self.network.local_port == u16::MAX {
            return Err(ConfigError::Invalid(format!(
                "network.local_port {} leaves no room for the tunnel port",
                self.network.local_port
            )));
        }
        if self.runtime.heartbeat_interval_secs == 0 || self.sync.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "heartbeat and poll intervals must be non-zero".into(),
            ));
        }
        if self.runtime.metrics_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "runtime.metrics_interval_secs must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Effective configuration as pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn wallet(&self) -> WalletAddress {
        WalletAddress::new(self.identity.wallet.clone())
    }

    pub fn node_identity(&self) -> NodeIdentity {
        NodeIdentity {
            wallet: self.wallet(),
            addr: self.network.local_addr.clone(),
            port: self.network.local_port,
            price: self.identity.price,
            role: self.identity.role,
        }
    }

    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            heartbeat_interval: Duration::from_secs(self.runtime.heartbeat_interval_secs),
            peer_ttl: Duration::from_secs(self.runtime.peer_ttl_secs),
        }
    }

    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig::new(self.wallet(), self.network.local_port).with_fetch_timeout(
            Duration::from_secs(self.content_store.fetch_timeout_secs),
        )
    }

    pub fn sync_config(&self) -> SyncConfig {
        let s = &self.sync;
        SyncConfig {
            poll_interval: Duration::from_secs(s.poll_interval_secs),
            notify_delay: Duration::from_secs(s.notify_delay_secs),
            max_age: Duration::from_secs(s.max_age_secs),
            backoff: BackoffPolicy {
                initial: Duration::from_secs(s.backoff_initial_secs),
                max: Duration::from_secs(s.backoff_max_secs),
                reset_after: Duration::from_secs(s.backoff_reset_secs),
            },
        }
    }

    pub fn trace_timeout(&self) -> Duration {
        Duration::from_secs(self.diagnostics.timeout_secs)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.sync.notify_timeout_secs)
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_secs(self.runtime.metrics_interval_secs)
    }
}

fn parse_env<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
{
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert_eq!(config.network.local_port, 7000);
        assert_eq!(config.identity.role, NodeRole::Provider);
        assert_eq!(config.sync.poll_interval_secs, 30);
        assert_eq!(config.processor_config().tunnel_port(), Some(7001));
        assert_eq!(config.router_config().heartbeat_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_parse_partial_toml_keeps_defaults() {
        let config = NodeConfig::parse(
            r#"
            [identity]
            wallet = "0xABC"
            price = 7

            [sync]
            notify_url = "http://127.0.0.1:8080/paid"
            "#,
        )
        .unwrap();

        assert_eq!(config.identity.wallet, "0xABC");
        assert_eq!(config.identity.price, 7);
        assert_eq!(config.sync.notify_url.as_deref(), Some("http://127.0.0.1:8080/paid"));
        assert_eq!(config.network, NetworkConfig::default());
        assert_eq!(config.sync.max_age_secs, 600);
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        assert!(matches!(
            NodeConfig::parse("[identity\nwallet = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = NodeConfig::parse("[identity]\nwallet = \"0xFILE\"").unwrap();
        config
            .apply_env(env(&[
                ("MARKET_WALLET", "0xENV"),
                ("LOCAL_PORT", "9000"),
                ("MARKET_ROLE", "Client"),
                ("RUN_MODE", "debug"),
                ("NOTIFY_URL", ""),
            ]))
            .unwrap();

        assert_eq!(config.identity.wallet, "0xENV");
        assert_eq!(config.network.local_port, 9000);
        assert_eq!(config.identity.role, NodeRole::Client);
        assert!(config.runtime.run_mode.is_debug());
        assert_eq!(config.sync.notify_url, None);
    }

    #[test]
    fn test_env_rejects_unparseable_port() {
        let mut config = NodeConfig::default();
        let err = config
            .apply_env(env(&[("LOCAL_PORT", "seventy")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "LOCAL_PORT", .. }));
    }

    #[test]
    fn test_validate_requires_wallet_for_provider() {
        let mut config = NodeConfig::default();
        assert!(config.validate().is_err());

        config.identity.role = NodeRole::Client;
        assert!(config.validate().is_ok());

        config.identity.role = NodeRole::Provider;
        config.identity.wallet = "0xABC".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_max_port() {
        let mut config = NodeConfig::default();
        config.identity.wallet = "0xABC".into();
        config.network.local_port = u16::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_print_config_round_trips() {
        let mut config = NodeConfig::default();
        config.identity.wallet = "0xABC".into();
        let json = config.to_json().unwrap();
        let back: NodeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
