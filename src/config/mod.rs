//! Configuration management for nfw-reconciler
//!
//! This module handles loading, parsing, and validating application configuration
//! from YAML files and environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Remote firewall service endpoint configuration
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Retry bounds for the update and read protocols
    #[serde(default)]
    pub retry: RetryConfig,

    /// Configuration validation settings
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Anonymized usage metrics
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(yaml);
        let config: Config = serde_yaml::from_str(&expanded)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables with prefix NFW_
    ///
    /// The variables set by the deployment stack (`SEND_ANONYMIZED_METRICS`,
    /// `METRICS_URL`, `SOLUTION_ID`, `STACK_ID`, `LOG_TYPE`,
    /// `LOG_DESTINATION_TYPE`, `CUSTOM_SDK_USER_AGENT`) are honoured as well.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Ok(endpoint) = std::env::var("NFW_REMOTE_ENDPOINT") {
            config.remote.endpoint = Some(endpoint);
        }
        if let Ok(region) = std::env::var("NFW_REMOTE_REGION") {
            config.remote.region = region;
        }
        if let Ok(timeout) = std::env::var("NFW_REMOTE_TIMEOUT_SECS") {
            config.remote.timeout_secs = timeout
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid remote timeout".to_string()))?;
        }
        if let Ok(agent) = std::env::var("CUSTOM_SDK_USER_AGENT") {
            config.remote.user_agent = Some(agent);
        }

        if let Ok(dir) = std::env::var("NFW_FIREWALL_DIRECTORY") {
            config.validation.firewall_directory = PathBuf::from(dir);
        }

        if let Ok(send) = std::env::var("SEND_ANONYMIZED_METRICS") {
            config.metrics.enabled = send.eq_ignore_ascii_case("yes");
        }
        if let Ok(url) = std::env::var("METRICS_URL") {
            config.metrics.url = Some(url).filter(|u| !u.is_empty());
        }
        if let Ok(solution_id) = std::env::var("SOLUTION_ID") {
            config.metrics.solution_id = Some(solution_id);
        }
        if let Ok(stack_id) = std::env::var("STACK_ID") {
            config.metrics.stack_id = Some(stack_id);
        }
        if let Ok(log_type) = std::env::var("LOG_TYPE") {
            config.metrics.log_type = Some(log_type);
        }
        if let Ok(destination) = std::env::var("LOG_DESTINATION_TYPE") {
            config.metrics.log_destination_type = Some(destination);
        }

        if let Ok(level) = std::env::var("NFW_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("NFW_LOG_FORMAT") {
            config.logging.format = format;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.remote.region.trim().is_empty() {
            return Err(ConfigError::MissingRequired("remote.region".to_string()));
        }
        if self.retry.max_token_retries == 0 {
            return Err(ConfigError::InvalidValue(
                "retry.max_token_retries must be at least 1".to_string(),
            ));
        }
        if self.retry.max_throttle_retries == 0 {
            return Err(ConfigError::InvalidValue(
                "retry.max_throttle_retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Remote firewall service endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteConfig {
    /// Endpoint override, e.g. a signing proxy or local emulator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Service region, selects the regional endpoint when no override is set
    #[serde(default = "default_region")]
    pub region: String,

    /// Per-call network timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Custom user agent appended to requests
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: default_region(),
            timeout_secs: default_timeout(),
            user_agent: None,
        }
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl RemoteConfig {
    /// URL requests are sent to
    pub fn endpoint_url(&self) -> String {
        match self.endpoint.as_deref().map(str::trim) {
            Some(endpoint) if !endpoint.is_empty() => endpoint.to_string(),
            _ => format!("https://network-firewall.{}.amazonaws.com", self.region.trim()),
        }
    }
}

/// Retry bounds for the reconciliation protocols
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Mutation attempts allowed against a stale update token
    #[serde(default = "default_max_token_retries")]
    pub max_token_retries: u32,

    /// Attempts allowed for a throttled describe call
    #[serde(default = "default_max_throttle_retries")]
    pub max_throttle_retries: u32,

    /// Base delay between throttled attempts, 0 disables the delay
    #[serde(default)]
    pub throttle_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_token_retries: default_max_token_retries(),
            max_throttle_retries: default_max_throttle_retries(),
            throttle_backoff_ms: 0,
        }
    }
}

fn default_max_token_retries() -> u32 {
    5
}

fn default_max_throttle_retries() -> u32 {
    3
}

/// Configuration validation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationConfig {
    /// Directory holding the firewall files
    #[serde(default = "default_firewall_directory")]
    pub firewall_directory: PathBuf,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            firewall_directory: default_firewall_directory(),
        }
    }
}

fn default_firewall_directory() -> PathBuf {
    PathBuf::from("firewalls")
}

impl ValidationConfig {
    /// Firewall directory resolved against the given working directory
    pub fn resolve_directory(&self, cwd: &Path) -> PathBuf {
        if self.firewall_directory.is_absolute() {
            self.firewall_directory.clone()
        } else {
            cwd.join(&self.firewall_directory)
        }
    }
}

/// Anonymized usage metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsConfig {
    /// Whether metrics are sent at all
    #[serde(default)]
    pub enabled: bool,

    /// Metrics collection endpoint
    #[serde(default)]
    pub url: Option<String>,

    /// Solution identifier attached to every report
    #[serde(default)]
    pub solution_id: Option<String>,

    /// Deployment stack id, the last 36 characters scope the installation id
    #[serde(default)]
    pub stack_id: Option<String>,

    /// File the anonymous installation id is persisted in
    #[serde(default = "default_uuid_file")]
    pub uuid_file: PathBuf,

    /// Firewall log type reported alongside the counters
    #[serde(default)]
    pub log_type: Option<String>,

    /// Firewall log destination type reported alongside the counters
    #[serde(default)]
    pub log_destination_type: Option<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            solution_id: None,
            stack_id: None,
            uuid_file: default_uuid_file(),
            log_type: None,
            log_destination_type: None,
        }
    }
}

fn default_uuid_file() -> PathBuf {
    PathBuf::from(".nfw-reconciler/metrics-uuid")
}

impl MetricsConfig {
    /// Key the installation id is stored under
    pub fn uuid_key(&self) -> String {
        let stack = self
            .stack_id
            .as_deref()
            .map(|id| {
                let start = id.len().saturating_sub(36);
                id.get(start..).unwrap_or(id)
            })
            .unwrap_or("");
        format!("centralized-network-inspection-solution-uuid-{}", stack)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (`json` or `pretty`)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Configuration error types
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Error reading configuration file
    #[error("Failed to read configuration file: {0}")]
    FileRead(String),

    /// Error parsing configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

/// Expand environment variables in a string
///
/// Supports `${VAR_NAME}` syntax
fn expand_env_vars(input: &str) -> String {
    let re = match regex_lite::Regex::new(r"\$\{([^}]+)\}") {
        Ok(re) => re,
        Err(_) => return input.to_string(),
    };

    re.replace_all(input, |caps: &regex_lite::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
