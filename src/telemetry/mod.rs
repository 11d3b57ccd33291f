//! Anonymized usage metrics
//!
//! After a successful validation run the structural counters are handed to a
//! [`TelemetryCollector`]. Collectors never fail the caller: every error is
//! logged and dropped inside `report`.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::MetricsConfig;
use crate::error::TelemetryError;
use crate::models::ValidationMetrics;

/// Request timeout for the metrics endpoint
const METRICS_TIMEOUT: Duration = Duration::from_secs(5);

/// Sink for validation metrics
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelemetryCollector: Send + Sync {
    /// Report metrics; failures are handled internally
    async fn report(&self, metrics: &ValidationMetrics);
}

#[async_trait]
impl<T: TelemetryCollector + ?Sized> TelemetryCollector for Box<T> {
    async fn report(&self, metrics: &ValidationMetrics) {
        (**self).report(metrics).await
    }
}

/// Collector used when metrics are disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCollector;

#[async_trait]
impl TelemetryCollector for NoopCollector {
    async fn report(&self, metrics: &ValidationMetrics) {
        debug!(metrics = ?metrics, "Metrics disabled, not sending");
    }
}

/// Build the collector selected by configuration
pub fn collector_from_config(config: &MetricsConfig) -> Box<dyn TelemetryCollector> {
    if !config.enabled {
        return Box::new(NoopCollector);
    }

    match AnonymousMetricsReporter::new(config.clone()) {
        Ok(reporter) => Box::new(reporter),
        Err(e) => {
            warn!(error = %e, "Failed to create metrics reporter, metrics disabled");
            Box::new(NoopCollector)
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MetricsData {
    #[serde(flatten)]
    metrics: ValidationMetrics,
    log_type: Option<String>,
    log_destination_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct MetricsPayload {
    solution: Option<String>,
    time_stamp: String,
    #[serde(rename = "UUID")]
    uuid: String,
    data: MetricsData,
}

/// Posts anonymized counters to the configured metrics endpoint
#[derive(Debug, Clone)]
pub struct AnonymousMetricsReporter {
    client: Client,
    config: MetricsConfig,
}

impl AnonymousMetricsReporter {
    pub fn new(config: MetricsConfig) -> Result<Self, TelemetryError> {
        let client = Client::builder().timeout(METRICS_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    /// Installation id for this deployment, created on first use
    ///
    /// Ids are kept in `uuid_file` as a JSON map keyed by
    /// [`MetricsConfig::uuid_key`]. A store that cannot be read or written
    /// still yields a fresh id.
    pub async fn installation_id(&self) -> String {
        let key = self.config.uuid_key();
        debug!(key = %key, "Installation id key");

        let mut ids = match self.load_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Using generated id due to store error");
                return uuid::Uuid::new_v4().to_string();
            }
        };

        if let Some(id) = ids.get(&key).filter(|id| !id.is_empty()) {
            return id.clone();
        }

        let id = uuid::Uuid::new_v4().to_string();
        ids.insert(key, id.clone());
        if let Err(e) = self.store_ids(&ids).await {
            error!(error = %e, "Error while persisting installation id");
        }
        id
    }

    async fn load_ids(&self) -> Result<BTreeMap<String, String>, TelemetryError> {
        match tokio::fs::read_to_string(&self.config.uuid_file).await {
            Ok(content) => Ok(serde_json::from_str(&content).unwrap_or_default()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store_ids(&self, ids: &BTreeMap<String, String>) -> Result<(), TelemetryError> {
        if let Some(parent) = self.config.uuid_file.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(ids)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        tokio::fs::write(&self.config.uuid_file, content).await?;
        Ok(())
    }

    fn payload(&self, metrics: &ValidationMetrics, uuid: String) -> MetricsPayload {
        MetricsPayload {
            solution: self.config.solution_id.clone(),
            time_stamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            uuid,
            data: MetricsData {
                metrics: *metrics,
                log_type: self.config.log_type.clone(),
                log_destination_type: self.config.log_destination_type.clone(),
            },
        }
    }

    async fn send(&self, url: &str, metrics: &ValidationMetrics) -> Result<(), TelemetryError> {
        let uuid = self.installation_id().await;
        let payload = self.payload(metrics, uuid);
        debug!(payload = ?payload, "Metrics data");

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        debug!(status = response.status().as_u16(), "Metrics response");
        Ok(())
    }
}

#[async_trait]
impl TelemetryCollector for AnonymousMetricsReporter {
    async fn report(&self, metrics: &ValidationMetrics) {
        if !self.config.enabled {
            return;
        }

        let Some(url) = self.config.url.as_deref().filter(|u| !u.is_empty()) else {
            warn!("Metrics URL is not configured, skipping metrics send");
            return;
        };

        if let Err(e) = self.send(url, metrics).await {
            warn!(url = url, error = %e, "Metrics API request failed");
        }
    }
}
