//! Firewall logging configuration shapes
//!
//! Logging configuration carries no update token; the remote service accepts
//! at most one destination change per update call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single log destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogDestinationConfig {
    /// `ALERT`, `FLOW` or `TLS`
    pub log_type: String,

    /// `S3`, `CloudWatchLogs` or `KinesisDataFirehose`
    pub log_destination_type: String,

    /// Destination specific settings (bucket name, log group, stream)
    #[serde(default)]
    pub log_destination: BTreeMap<String, String>,
}

/// The full set of destinations for one firewall
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoggingConfiguration {
    #[serde(default)]
    pub log_destination_configs: Vec<LogDestinationConfig>,
}

impl LoggingConfiguration {
    pub fn is_empty(&self) -> bool {
        self.log_destination_configs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.log_destination_configs.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeLoggingConfigurationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_arn: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateLoggingConfigurationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_arn: Option<String>,

    pub logging_configuration: LoggingConfiguration,
}

/// Response shared by describe and update logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoggingConfigurationResponse {
    #[serde(default)]
    pub firewall_arn: Option<String>,

    #[serde(default)]
    pub firewall_name: Option<String>,

    #[serde(default)]
    pub logging_configuration: Option<LoggingConfiguration>,
}

impl LoggingConfigurationResponse {
    /// Current configuration, empty when the service returned none
    pub fn configuration(&self) -> LoggingConfiguration {
        self.logging_configuration.clone().unwrap_or_default()
    }
}
