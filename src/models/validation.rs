//! Validation run records and counters

use serde::{Deserialize, Serialize};
use std::fmt;

/// A configuration file that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidFileRecord {
    /// The offending file (or a placeholder when it has no usable path)
    pub path: String,

    /// The file that referenced it, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_in_file: Option<String>,

    /// What was wrong
    pub error: String,
}

impl InvalidFileRecord {
    pub fn new(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            referenced_in_file: None,
            error: error.into(),
        }
    }

    /// Set the referencing file
    pub fn referenced_in(mut self, file: impl Into<String>) -> Self {
        self.referenced_in_file = Some(file.into());
        self
    }
}

impl fmt::Display for InvalidFileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.referenced_in_file {
            Some(parent) => write!(
                f,
                "{} (referenced in {}): {}",
                self.path, parent, self.error
            ),
            None => write!(f, "{}: {}", self.path, self.error),
        }
    }
}

/// Structural counters gathered during one validation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMetrics {
    pub number_of_firewalls: u64,
    pub number_of_policies: u64,
    pub number_of_stateful_rule_groups: u64,
    pub number_of_stateless_rule_groups: u64,
    pub number_of_suricata_rules: u64,
}

/// Outcome of a successful validation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub metrics: ValidationMetrics,
    pub files_checked: usize,
}
