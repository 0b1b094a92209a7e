//! Client configuration
//!
//! Loaded from TOML or JSON files, or from environment variables (with a
//! `.env` file picked up via dotenvy). Every section has defaults, so a file
//! only needs to name what differs.

use serde::{Deserialize, Serialize};

use crate::rpc_manager::{RetryPolicy, RpcManagerConfig};

pub use crate::rpc_manager::ConfigError;

pub const MAINNET_RPC_URL: &str = "https://rpc.mainnet.near.org";
pub const TESTNET_RPC_URL: &str = "https://rpc.testnet.near.org";

/// Main client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub network: NetworkConfig,

    /// Backoff for idempotent RPC reads
    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub nonce: NonceSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// `mainnet`, `testnet`, or any custom id
    #[serde(default = "default_network_id")]
    pub network_id: String,

    pub rpc: RpcManagerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceSettings {
    /// Re-signs allowed after invalid-nonce rejections
    #[serde(default = "default_max_nonce_retries")]
    pub max_nonce_retries: u32,

    /// Blocks a delegate action stays valid for
    #[serde(default = "default_delegate_block_offset")]
    pub delegate_block_offset: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `near_submit=debug`
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

// Default value functions
fn default_network_id() -> String { "testnet".to_string() }
fn default_max_attempts() -> u32 { 3 }
fn default_base_delay_ms() -> u64 { 100 }
fn default_max_delay_ms() -> u64 { 5_000 }
fn default_jitter_factor() -> f64 { 0.1 }
fn default_multiplier() -> f64 { 2.0 }
fn default_max_nonce_retries() -> u32 { 3 }
fn default_delegate_block_offset() -> u64 { 200 }
fn default_log_level() -> String { "info".to_string() }

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_factor: default_jitter_factor(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetrySettings {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay_ms: self.base_delay_ms,
            max_delay_ms: self.max_delay_ms,
            jitter_factor: self.jitter_factor,
            multiplier: self.multiplier,
        }
    }
}

impl Default for NonceSettings {
    fn default() -> Self {
        Self {
            max_nonce_retries: default_max_nonce_retries(),
            delegate_block_offset: default_delegate_block_offset(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl ClientConfig {
    fn for_network(network_id: &str, url: &str) -> Self {
        Self {
            network: NetworkConfig {
                network_id: network_id.to_string(),
                rpc: RpcManagerConfig::from_urls(&[url.to_string()]),
            },
            retry: RetrySettings::default(),
            nonce: NonceSettings::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn mainnet() -> Self {
        Self::for_network("mainnet", MAINNET_RPC_URL)
    }

    pub fn testnet() -> Self {
        Self::for_network("testnet", TESTNET_RPC_URL)
    }

    /// Preset for a known network id
    pub fn preset(network_id: &str) -> Option<Self> {
        match network_id {
            "mainnet" => Some(Self::mainnet()),
            "testnet" => Some(Self::testnet()),
            _ => None,
        }
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("Failed to read config file {}: {}", path, e)))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("Failed to read config file {}: {}", path, e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the process environment after reading `.env` if present.
    ///
    /// `NEAR_NETWORK_ID` picks a preset (default `testnet`); `NEAR_RPC_URLS`
    /// (comma separated) replaces its endpoints and is required for custom
    /// networks. `NEAR_RPC_API_KEY`, `NEAR_LOG_LEVEL` and `NEAR_LOG_FORMAT`
    /// are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env_vars(|key| std::env::var(key).ok())
    }

    /// [`from_env`](Self::from_env) over an arbitrary variable source
    pub fn from_env_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network_id = var("NEAR_NETWORK_ID").unwrap_or_else(default_network_id);

        let mut config = match (Self::preset(&network_id), var("NEAR_RPC_URLS")) {
            (_, Some(urls)) => {
                let urls: Vec<String> = urls
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                let mut config = Self::for_network(&network_id, TESTNET_RPC_URL);
                config.network.rpc = RpcManagerConfig::from_urls(&urls);
                config
            }
            (Some(preset), None) => preset,
            (None, None) => return Err(ConfigError::MissingEnvVar("NEAR_RPC_URLS".to_string())),
        };

        if let Some(key) = var("NEAR_RPC_API_KEY") {
            for endpoint in &mut config.network.rpc.endpoints {
                endpoint.api_key = Some(key.clone());
            }
        }
        if let Some(level) = var("NEAR_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = var("NEAR_LOG_FORMAT") {
            config.logging.format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                other => {
                    return Err(ConfigError::ValidationError(format!(
                        "Unknown log format: {}",
                        other
                    )))
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.network_id.trim().is_empty() {
            return Err(ConfigError::ValidationError("network_id must not be empty".to_string()));
        }
        self.network.rpc.validate()?;

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be > 0".to_string(),
            ));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::ValidationError(
                "retry.base_delay_ms must not exceed retry.max_delay_ms".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter_factor) {
            return Err(ConfigError::ValidationError(
                "retry.jitter_factor must be within 0.0..=1.0".to_string(),
            ));
        }
        if self.retry.multiplier < 1.0 {
            return Err(ConfigError::ValidationError(
                "retry.multiplier must be >= 1.0".to_string(),
            ));
        }
        if self.nonce.delegate_block_offset == 0 {
            return Err(ConfigError::ValidationError(
                "nonce.delegate_block_offset must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_presets_are_valid() {
        let mainnet = ClientConfig::mainnet();
        assert_eq!(mainnet.network.network_id, "mainnet");
        assert_eq!(mainnet.network.rpc.endpoints[0].url, MAINNET_RPC_URL);
        assert!(mainnet.validate().is_ok());
        assert!(ClientConfig::testnet().validate().is_ok());
        assert_eq!(ClientConfig::testnet().nonce.max_nonce_retries, 3);
        assert_eq!(ClientConfig::testnet().nonce.delegate_block_offset, 200);
    }

    #[test]
    fn test_toml_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[network]
network_id = "localnet"

[[network.rpc.endpoints]]
url = "http://127.0.0.1:3030"
timeout_ms = 2000

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = ClientConfig::from_toml_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.network.network_id, "localnet");
        assert_eq!(config.network.rpc.endpoints[0].timeout_ms, 2000);
        assert!(config.network.rpc.failover_send_on_connect_error);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.retry, RetrySettings::default());
    }

    #[test]
    fn test_json_roundtrip_file() {
        let config = ClientConfig::mainnet();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&config).unwrap()).unwrap();
        let loaded = ClientConfig::from_json_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ClientConfig::from_toml_file("/nonexistent/near-submit.toml"),
            Err(ConfigError::IoError(_))
        ));
    }

    #[test]
    fn test_env_vars() {
        let config = ClientConfig::from_env_vars(env(&[
            ("NEAR_NETWORK_ID", "mainnet"),
            ("NEAR_RPC_URLS", "https://a.example, https://b.example"),
            ("NEAR_RPC_API_KEY", "secret"),
            ("NEAR_LOG_LEVEL", "debug"),
            ("NEAR_LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.network.network_id, "mainnet");
        assert_eq!(config.network.rpc.endpoints.len(), 2);
        assert_eq!(config.network.rpc.endpoints[1].url, "https://b.example");
        assert!(config
            .network
            .rpc
            .endpoints
            .iter()
            .all(|e| e.api_key.as_deref() == Some("secret")));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_env_preset_and_custom_network() {
        let config = ClientConfig::from_env_vars(env(&[])).unwrap();
        assert_eq!(config.network.network_id, "testnet");
        assert_eq!(config.network.rpc.endpoints[0].url, TESTNET_RPC_URL);

        assert_eq!(
            ClientConfig::from_env_vars(env(&[("NEAR_NETWORK_ID", "localnet")])),
            Err(ConfigError::MissingEnvVar("NEAR_RPC_URLS".to_string()))
        );
        assert!(matches!(
            ClientConfig::from_env_vars(env(&[("NEAR_LOG_FORMAT", "xml")])),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = ClientConfig::testnet();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::testnet();
        config.retry.jitter_factor = 1.5;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::testnet();
        config.network.rpc.endpoints.clear();
        assert!(config.validate().is_err());

        let mut config = ClientConfig::testnet();
        config.nonce.delegate_block_offset = 0;
        assert!(config.validate().is_err());
    }
}
