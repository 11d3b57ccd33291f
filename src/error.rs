//! Application error types for nfw-reconciler
//!
//! This module defines common error types used throughout the application.
//! All error types use `thiserror` for ergonomic error handling.
//!
//! Remote failures are classified exactly once, at the transport boundary,
//! into a closed set of [`RemoteErrorKind`]s. Retry logic downstream only
//! ever looks at the kind, never at message text.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::models::InvalidFileRecord;

/// Message the remote service uses when an update token went stale
pub const STALE_TOKEN_MESSAGE: &str = "Update token is invalid.";

/// Closed classification of remote failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    /// The update token no longer matches the resource version
    StaleToken,
    /// Transient rate-limit rejection
    Throttled,
    /// The resource does not exist
    NotFound,
    /// The request was rejected as malformed
    Structural,
    /// Everything else, including transport failures
    Other,
}

impl RemoteErrorKind {
    /// Classify a remote error from its type name and message
    ///
    /// The type name may carry a namespace prefix separated by `#`
    /// (e.g. `com.amazonaws.networkfirewall#ThrottlingException`).
    pub fn classify(name: &str, message: &str) -> Self {
        let short = name.rsplit('#').next().unwrap_or(name);
        let short = short.split(':').next().unwrap_or(short);

        if message == STALE_TOKEN_MESSAGE || short == "InvalidTokenException" {
            return RemoteErrorKind::StaleToken;
        }

        match short {
            "ThrottlingException" | "TooManyRequestsException" => RemoteErrorKind::Throttled,
            "ResourceNotFoundException" => RemoteErrorKind::NotFound,
            "InvalidRequestException"
            | "ValidationException"
            | "MultipleValidationErrors"
            | "UnexpectedParameter" => RemoteErrorKind::Structural,
            _ => RemoteErrorKind::Other,
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RemoteErrorKind::StaleToken => "stale_token",
            RemoteErrorKind::Throttled => "throttled",
            RemoteErrorKind::NotFound => "not_found",
            RemoteErrorKind::Structural => "structural",
            RemoteErrorKind::Other => "other",
        };
        f.write_str(label)
    }
}

/// A classified failure returned by the remote firewall service
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{name}: {message}")]
pub struct RemoteError {
    /// Classification used by retry logic
    pub kind: RemoteErrorKind,
    /// Remote error type name (e.g. `ThrottlingException`)
    pub name: String,
    /// Human readable message
    pub message: String,
    /// HTTP status code, if the failure came from a response
    pub status: Option<u16>,
    /// Remote request id, if the service returned one
    pub request_id: Option<String>,
}

impl RemoteError {
    /// Create a remote error, classifying it from name and message
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        let message = message.into();
        Self {
            kind: RemoteErrorKind::classify(&name, &message),
            name,
            message,
            status: None,
            request_id: None,
        }
    }

    /// Create a remote error with an explicit kind
    pub fn with_kind(
        kind: RemoteErrorKind,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            message: message.into(),
            status: None,
            request_id: None,
        }
    }

    /// Attach HTTP status code
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach remote request id
    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Stale update token rejection
    pub fn stale_token() -> Self {
        Self::with_kind(
            RemoteErrorKind::StaleToken,
            "InvalidTokenException",
            STALE_TOKEN_MESSAGE,
        )
    }

    /// Throttling rejection
    pub fn throttled() -> Self {
        Self::with_kind(
            RemoteErrorKind::Throttled,
            "ThrottlingException",
            "Rate exceeded",
        )
    }

    /// Resource not found
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_kind(
            RemoteErrorKind::NotFound,
            "ResourceNotFoundException",
            message,
        )
    }

    /// Transport-level failure (timeout, connection, decoding)
    pub fn transport(message: impl Into<String>) -> Self {
        Self::with_kind(RemoteErrorKind::Other, "TransportError", message)
    }

    pub fn is_stale_token(&self) -> bool {
        self.kind == RemoteErrorKind::StaleToken
    }

    pub fn is_throttled(&self) -> bool {
        self.kind == RemoteErrorKind::Throttled
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == RemoteErrorKind::NotFound
    }

    pub fn is_structural(&self) -> bool {
        self.kind == RemoteErrorKind::Structural
    }
}

/// Trait for determining if an error is retryable on the read path
pub trait RetryableError {
    /// Returns true if the error is retryable
    fn is_retryable(&self) -> bool;

    /// Returns true if the error means "the resource does not exist"
    fn is_absent(&self) -> bool {
        false
    }
}

impl RetryableError for RemoteError {
    fn is_retryable(&self) -> bool {
        self.is_throttled()
    }

    fn is_absent(&self) -> bool {
        self.is_not_found()
    }
}

/// Token-guarded resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    FirewallPolicy,
    RuleGroup,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::FirewallPolicy => f.write_str("firewall policy"),
            ResourceKind::RuleGroup => f.write_str("rule group"),
        }
    }
}

/// Errors raised by the update and read retry protocols
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    /// Every mutation attempt was rejected with a stale token
    #[error("Maximum token retry attempts exceeded for {resource} update")]
    MaxTokenRetriesExceeded { resource: ResourceKind, attempts: u32 },

    /// A fresh token could not be obtained from a describe call
    #[error("Failed to get valid update token for {resource}")]
    MissingUpdateToken {
        resource: ResourceKind,
        #[source]
        source: Option<RemoteError>,
    },

    /// The read path never succeeded within its bound
    #[error("Unable to resolve request and completed retries.")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last_error: Option<RemoteError>,
    },

    /// Non-retryable remote failure
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Configuration validation run errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// One or more files were recorded as invalid
    #[error("Validation failed: Invalid Files.")]
    InvalidFiles(Vec<InvalidFileRecord>),

    /// The traversal itself could not proceed
    #[error("Validation failed.")]
    Traversal(String),
}

impl ValidationError {
    /// Invalid file records carried by this error, if any
    pub fn invalid_files(&self) -> &[InvalidFileRecord] {
        match self {
            ValidationError::InvalidFiles(records) => records,
            ValidationError::Traversal(_) => &[],
        }
    }
}

/// Configuration file reader errors
#[derive(Debug, Error)]
pub enum ReaderError {
    /// IO error while listing or reading
    #[error("Config file IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid JSON
    #[error("Config file parse error: {0}")]
    Parse(String),

    /// File could not be found
    #[error("Config file not found: {0}")]
    NotFound(String),
}

/// Telemetry errors; never surfaced past the collector
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Metrics request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Metrics id store error: {0}")]
    Store(#[from] std::io::Error),
}

/// Asset packaging errors
#[derive(Debug, Error)]
pub enum AssetError {
    /// Missing input or output path
    #[error("undefined input path")]
    UndefinedPath,

    #[error("Asset IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Asset zip error: {0}")]
    Zip(String),
}

impl From<zip::result::ZipError> for AssetError {
    fn from(err: zip::result::ZipError) -> Self {
        AssetError::Zip(err.to_string())
    }
}

/// Application-level error type
///
/// This is the main error type used at the binary boundary.
/// It aggregates all domain-specific error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Internal error: {0}")]
    Internal(String),
}
