//! Firewall logging configuration synchronizer
//!
//! The remote service accepts one destination change per update, so the
//! synchronizer clears the current set one entry at a time and then appends
//! the desired destinations one at a time. Failures are tolerated: the
//! synchronizer logs them and resolves to `None`.

use tracing::{debug, info, warn};

use crate::client::RemoteFirewallClient;
use crate::error::RemoteError;
use crate::models::{
    DescribeLoggingConfigurationRequest, LoggingConfiguration, UpdateLoggingConfigurationRequest,
};

/// Sequential add/remove reconciler for log destinations
pub struct LoggingConfigSynchronizer<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C> LoggingConfigSynchronizer<'a, C>
where
    C: RemoteFirewallClient + ?Sized,
{
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Replace the firewall's log destinations with `desired`
    ///
    /// Returns the final configuration reported by the remote service, or
    /// `None` if any step failed.
    pub async fn synchronize(
        &self,
        firewall_name: &str,
        desired: &LoggingConfiguration,
    ) -> Option<LoggingConfiguration> {
        match self.run(firewall_name, desired).await {
            Ok(config) => {
                info!(
                    firewall = firewall_name,
                    destinations = config.len(),
                    "Logging configuration synchronized"
                );
                Some(config)
            }
            Err(err) => {
                warn!(
                    firewall = firewall_name,
                    kind = %err.kind,
                    error = %err,
                    request_id = ?err.request_id,
                    "Failed to update firewall logging configuration"
                );
                None
            }
        }
    }

    async fn run(
        &self,
        firewall_name: &str,
        desired: &LoggingConfiguration,
    ) -> Result<LoggingConfiguration, RemoteError> {
        let current = self
            .client
            .describe_logging_configuration(&DescribeLoggingConfigurationRequest {
                firewall_name: Some(firewall_name.to_string()),
                firewall_arn: None,
            })
            .await?;

        let mut config = current.configuration();
        debug!(
            firewall = firewall_name,
            existing = config.len(),
            desired = desired.len(),
            "Current logging configuration"
        );

        while !config.is_empty() {
            let before = config.len();
            config.log_destination_configs.pop();
            config = self.update(firewall_name, config).await?;

            // The service must shrink the set on every removal
            if config.len() >= before {
                return Err(RemoteError::transport(format!(
                    "Logging destination removal did not take effect ({} remaining)",
                    config.len()
                )));
            }
        }

        for destination in &desired.log_destination_configs {
            config.log_destination_configs.push(destination.clone());
            debug!(
                firewall = firewall_name,
                log_type = %destination.log_type,
                destination_type = %destination.log_destination_type,
                "Adding log destination"
            );
            config = self.update(firewall_name, config).await?;
        }

        Ok(config)
    }

    /// Send one update; the response's configuration replaces the local one
    async fn update(
        &self,
        firewall_name: &str,
        config: LoggingConfiguration,
    ) -> Result<LoggingConfiguration, RemoteError> {
        let response = self
            .client
            .update_logging_configuration(&UpdateLoggingConfigurationRequest {
                firewall_name: Some(firewall_name.to_string()),
                firewall_arn: None,
                logging_configuration: config.clone(),
            })
            .await?;

        Ok(response.logging_configuration.unwrap_or(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockRemoteFirewallClient;
    use crate::models::{LogDestinationConfig, LoggingConfigurationResponse};
    use mockall::predicate::function;
    use mockall::Sequence;
    use std::collections::BTreeMap;

    fn destination(log_type: &str) -> LogDestinationConfig {
        LogDestinationConfig {
            log_type: log_type.to_string(),
            log_destination_type: "S3".to_string(),
            log_destination: BTreeMap::from([("bucketName".to_string(), "logs".to_string())]),
        }
    }

    fn configuration(types: &[&str]) -> LoggingConfiguration {
        LoggingConfiguration {
            log_destination_configs: types.iter().map(|t| destination(t)).collect(),
        }
    }

    fn echo(request: &UpdateLoggingConfigurationRequest) -> LoggingConfigurationResponse {
        LoggingConfigurationResponse {
            firewall_name: request.firewall_name.clone(),
            logging_configuration: Some(request.logging_configuration.clone()),
            ..Default::default()
        }
    }

    // Test 1: Existing destinations are removed one at a time, then desired added
    #[tokio::test]
    async fn test_remove_then_add_sequentially() {
        let mut mock = MockRemoteFirewallClient::new();
        let mut seq = Sequence::new();

        mock.expect_describe_logging_configuration()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(LoggingConfigurationResponse {
                    logging_configuration: Some(configuration(&["ALERT", "FLOW"])),
                    ..Default::default()
                })
            });
        for expected in [1usize, 0, 1, 2] {
            mock.expect_update_logging_configuration()
                .with(function(move |r: &UpdateLoggingConfigurationRequest| {
                    r.logging_configuration.len() == expected
                        && r.firewall_name.as_deref() == Some("fw-1")
                }))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|r| Ok(echo(r)));
        }

        let result = LoggingConfigSynchronizer::new(&mock)
            .synchronize("fw-1", &configuration(&["FLOW", "ALERT"]))
            .await
            .unwrap();

        assert_eq!(result, configuration(&["FLOW", "ALERT"]));
    }

    // Test 2: Empty current configuration only adds
    #[tokio::test]
    async fn test_empty_current_only_adds() {
        let mut mock = MockRemoteFirewallClient::new();
        mock.expect_describe_logging_configuration()
            .times(1)
            .returning(|_| Ok(LoggingConfigurationResponse::default()));
        mock.expect_update_logging_configuration()
            .times(1)
            .returning(|r| Ok(echo(r)));

        let result = LoggingConfigSynchronizer::new(&mock)
            .synchronize("fw-1", &configuration(&["FLOW"]))
            .await;

        assert_eq!(result, Some(configuration(&["FLOW"])));
    }

    // Test 3: Describe failure resolves to no-op
    #[tokio::test]
    async fn test_describe_failure_is_noop() {
        let mut mock = MockRemoteFirewallClient::new();
        mock.expect_describe_logging_configuration()
            .times(1)
            .returning(|_| Err(RemoteError::not_found("no firewall")));
        mock.expect_update_logging_configuration().never();

        let result = LoggingConfigSynchronizer::new(&mock)
            .synchronize("fw-1", &configuration(&["FLOW"]))
            .await;

        assert!(result.is_none());
    }

    // Test 4: Update failure midway aborts the synchronization
    #[tokio::test]
    async fn test_update_failure_aborts() {
        let mut mock = MockRemoteFirewallClient::new();
        mock.expect_describe_logging_configuration()
            .times(1)
            .returning(|_| Ok(LoggingConfigurationResponse::default()));
        mock.expect_update_logging_configuration()
            .times(1)
            .returning(|_| Err(RemoteError::new("InvalidRequestException", "bad bucket")));

        let result = LoggingConfigSynchronizer::new(&mock)
            .synchronize("fw-1", &configuration(&["FLOW", "ALERT"]))
            .await;

        assert!(result.is_none());
    }

    // Test 5: A removal that does not shrink the set stops the loop
    #[tokio::test]
    async fn test_non_shrinking_removal_stops() {
        let mut mock = MockRemoteFirewallClient::new();
        mock.expect_describe_logging_configuration()
            .times(1)
            .returning(|_| {
                Ok(LoggingConfigurationResponse {
                    logging_configuration: Some(configuration(&["FLOW"])),
                    ..Default::default()
                })
            });
        mock.expect_update_logging_configuration()
            .times(1)
            .returning(|_| {
                Ok(LoggingConfigurationResponse {
                    logging_configuration: Some(configuration(&["FLOW"])),
                    ..Default::default()
                })
            });

        let result = LoggingConfigSynchronizer::new(&mock)
            .synchronize("fw-1", &LoggingConfiguration::default())
            .await;

        assert!(result.is_none());
    }
}
