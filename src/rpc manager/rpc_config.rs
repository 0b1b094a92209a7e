use serde::{Deserialize, Serialize};

/// Configuration for an individual RPC endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcEndpointConfig {
    /// The JSON-RPC endpoint URL
    pub url: String,

    /// Optional API key, sent as the `x-api-key` header
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Rate limit (requests per second)
    #[serde(default = "default_rate_limit")]
    pub rate_limit_rps: u32,
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_rate_limit() -> u32 {
    50
}

impl RpcEndpointConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
            rate_limit_rps: default_rate_limit(),
        }
    }
}

/// JSON-RPC transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcManagerConfig {
    /// Endpoints in failover order
    pub endpoints: Vec<RpcEndpointConfig>,

    /// Retry `send_tx` on another endpoint when the connection could not be
    /// established (the request provably never reached a node)
    #[serde(default = "default_true")]
    pub failover_send_on_connect_error: bool,
}

fn default_true() -> bool {
    true
}

impl RpcManagerConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("Failed to read config file {}: {}", path, e)))?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse TOML: {}", e)))
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("Failed to read config file {}: {}", path, e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse JSON: {}", e)))
    }

    /// Load configuration from environment variables.
    /// Expected format: NEAR_RPC_URLS=url1,url2,url3
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoints_str = std::env::var("NEAR_RPC_URLS")
            .map_err(|_| ConfigError::MissingEnvVar("NEAR_RPC_URLS".to_string()))?;

        let urls: Vec<String> = endpoints_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if urls.is_empty() {
            return Err(ConfigError::ValidationError("No RPC endpoints provided".to_string()));
        }

        let mut config = Self::from_urls(&urls);
        if let Ok(key) = std::env::var("NEAR_RPC_API_KEY") {
            for endpoint in &mut config.endpoints {
                endpoint.api_key = Some(key.clone());
            }
        }
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::ValidationError(
                "At least one RPC endpoint must be configured".to_string(),
            ));
        }

        let mut seen_urls = std::collections::HashSet::new();
        for endpoint in &self.endpoints {
            if !seen_urls.insert(&endpoint.url) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate RPC URL: {}",
                    endpoint.url
                )));
            }

            if !endpoint.url.starts_with("http://") && !endpoint.url.starts_with("https://") {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid URL format: {}",
                    endpoint.url
                )));
            }

            if endpoint.timeout_ms == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid timeout_ms for {}: must be > 0",
                    endpoint.url
                )));
            }

            if endpoint.rate_limit_rps == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid rate_limit_rps for {}: must be > 0",
                    endpoint.url
                )));
            }
        }

        Ok(())
    }

    /// Default configuration for a list of URLs
    pub fn from_urls(urls: &[String]) -> Self {
        Self {
            endpoints: urls.iter().map(RpcEndpointConfig::new).collect(),
            failover_send_on_connect_error: default_true(),
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    ValidationError(String),
    MissingEnvVar(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(msg) => write!(f, "IO error: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ConfigError::MissingEnvVar(var) => write!(f, "Missing environment variable: {}", var),
        }
    }
}

impl std::error::Error for ConfigError {}
