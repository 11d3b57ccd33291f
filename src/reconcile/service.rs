//! Network firewall service facade
//!
//! Wraps a [`RemoteFirewallClient`] with the policies the reconciliation
//! pass relies on: not-found translated to `None` on read paths, throttle
//! retry for rule group lookups, token retry for policy and rule group
//! updates, and best-effort tagging, deletion and logging synchronization.

use tracing::{debug, info, warn};

use super::{LoggingConfigSynchronizer, ThrottleRetryProtocol, UpdateTokenProtocol};
use crate::client::RemoteFirewallClient;
use crate::config::RetryConfig;
use crate::error::{ProtocolError, RemoteError};
use crate::models::{
    AssociateFirewallPolicyRequest, CreateFirewallPolicyRequest, CreateFirewallRequest,
    CreateRuleGroupRequest, DescribeFirewallPolicyRequest, DescribeFirewallPolicyResponse,
    DescribeFirewallResponse, DescribeRuleGroupRequest, DescribeRuleGroupResponse,
    FirewallPolicyResponse, FirewallUpdateResponse, LoggingConfiguration, RuleGroupResponse,
    RuleGroupType, TagResourceRequest, UpdateFirewallDeleteProtectionRequest,
    UpdateFirewallDescriptionRequest, UpdateFirewallPolicyChangeProtectionRequest,
    UpdateFirewallPolicyRequest, UpdateRuleGroupRequest, UpdateSubnetChangeProtectionRequest,
};

/// Translate a not-found failure into an absent result
fn absent_if_not_found<T>(result: Result<T, RemoteError>) -> Result<Option<T>, RemoteError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

/// Firewall operations used by the reconciliation pass
pub struct NetworkFirewallService<C> {
    client: C,
    token: UpdateTokenProtocol,
    throttle: ThrottleRetryProtocol,
}

impl<C: RemoteFirewallClient> NetworkFirewallService<C> {
    /// Create a service with default retry bounds
    pub fn new(client: C) -> Self {
        Self::with_retry_config(client, &RetryConfig::default())
    }

    pub fn with_retry_config(client: C, config: &RetryConfig) -> Self {
        Self {
            client,
            token: UpdateTokenProtocol::from_config(config),
            throttle: ThrottleRetryProtocol::from_config(config),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Create a firewall; `None` when the service reports a missing dependency
    pub async fn create_firewall(
        &self,
        request: &CreateFirewallRequest,
    ) -> Result<Option<DescribeFirewallResponse>, RemoteError> {
        info!(firewall = ?request.firewall_name, "Creating firewall");
        let result = absent_if_not_found(self.client.create_firewall(request).await)?;
        if result.is_none() {
            info!(firewall = ?request.firewall_name, "Firewall not found");
        }
        Ok(result)
    }

    pub async fn create_firewall_policy(
        &self,
        request: &CreateFirewallPolicyRequest,
    ) -> Result<FirewallPolicyResponse, RemoteError> {
        info!(policy = ?request.firewall_policy_name, "Creating firewall policy");
        self.client.create_firewall_policy(request).await
    }

    pub async fn create_rule_group(
        &self,
        request: &CreateRuleGroupRequest,
    ) -> Result<RuleGroupResponse, RemoteError> {
        info!(rule_group = ?request.rule_group_name, "Creating rule group");
        debug!(request = ?request, "Create rule group request");
        self.client.create_rule_group(request).await
    }

    /// Describe a firewall; `None` when it does not exist
    pub async fn describe_firewall(
        &self,
        firewall_name: &str,
    ) -> Result<Option<DescribeFirewallResponse>, RemoteError> {
        info!(firewall = firewall_name, "Describing firewall");
        let result = absent_if_not_found(self.client.describe_firewall(firewall_name).await)
            .map_err(|e| {
                warn!(firewall = firewall_name, kind = %e.kind, error = %e, "Firewall error");
                e
            })?;
        if result.is_none() {
            info!(firewall = firewall_name, "Firewall not found");
        }
        Ok(result)
    }

    /// Describe a firewall policy by name; `None` when it does not exist
    pub async fn describe_firewall_policy(
        &self,
        policy_name: &str,
    ) -> Result<Option<DescribeFirewallPolicyResponse>, RemoteError> {
        let request = DescribeFirewallPolicyRequest::by_name(policy_name);
        let result = absent_if_not_found(self.client.describe_firewall_policy(&request).await)
            .map_err(|e| {
                warn!(policy = policy_name, kind = %e.kind, error = %e, "Firewall policy error");
                e
            })?;
        if result.is_none() {
            info!(policy = policy_name, "Firewall policy not found");
        }
        Ok(result)
    }

    /// Describe a rule group, retrying while throttled
    pub async fn describe_rule_group(
        &self,
        rule_group_name: &str,
        rule_group_type: RuleGroupType,
    ) -> Result<Option<DescribeRuleGroupResponse>, ProtocolError> {
        info!(
            rule_group = rule_group_name,
            rule_group_type = %rule_group_type,
            "Describing rule group"
        );
        let request = DescribeRuleGroupRequest::by_name(rule_group_name, rule_group_type);
        self.throttle
            .execute(|| self.client.describe_rule_group(&request))
            .await
    }

    /// Update a firewall policy under the token protocol
    pub async fn update_firewall_policy(
        &self,
        request: UpdateFirewallPolicyRequest,
    ) -> Result<FirewallPolicyResponse, ProtocolError> {
        self.token.update(&self.client, request).await
    }

    /// Update a rule group under the token protocol
    pub async fn update_rule_group(
        &self,
        request: UpdateRuleGroupRequest,
    ) -> Result<RuleGroupResponse, ProtocolError> {
        let response = self.token.update(&self.client, request).await?;
        debug!(response = ?response, "Rule group updated");
        Ok(response)
    }

    pub async fn associate_firewall_policy(
        &self,
        request: &AssociateFirewallPolicyRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError> {
        self.client.associate_firewall_policy(request).await
    }

    pub async fn update_firewall_description(
        &self,
        request: &UpdateFirewallDescriptionRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError> {
        self.client.update_firewall_description(request).await
    }

    pub async fn update_firewall_delete_protection(
        &self,
        request: &UpdateFirewallDeleteProtectionRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError> {
        self.client.update_firewall_delete_protection(request).await
    }

    pub async fn update_firewall_policy_change_protection(
        &self,
        request: &UpdateFirewallPolicyChangeProtectionRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError> {
        self.client
            .update_firewall_policy_change_protection(request)
            .await
    }

    pub async fn update_subnet_change_protection(
        &self,
        request: &UpdateSubnetChangeProtectionRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError> {
        self.client.update_subnet_change_protection(request).await
    }

    /// Tag a resource; failures are logged and ignored
    pub async fn tag_resource(&self, request: &TagResourceRequest) {
        if let Err(err) = self.client.tag_resource(request).await {
            warn!(
                resource = %request.resource_arn,
                error = %err,
                "Failed to update tags for the resource"
            );
        }
    }

    /// Replace a firewall's log destinations; `None` on any failure
    pub async fn update_logging_configuration(
        &self,
        firewall_name: &str,
        desired: &LoggingConfiguration,
    ) -> Option<LoggingConfiguration> {
        LoggingConfigSynchronizer::new(&self.client)
            .synchronize(firewall_name, desired)
            .await
    }

    /// ARNs referenced by a policy, stateful first; empty on any failure
    pub async fn list_rule_groups_for_policy(&self, policy_name: &str) -> Vec<String> {
        let request = DescribeFirewallPolicyRequest::by_name(policy_name);
        let response = match self.client.describe_firewall_policy(&request).await {
            Ok(response) => response,
            Err(err) => {
                info!(
                    policy = policy_name,
                    kind = %err.kind,
                    error = %err,
                    "Error trying to retrieve current rule groups"
                );
                return Vec::new();
            }
        };

        let Some(policy) = response.firewall_policy else {
            info!(policy = policy_name, "No firewall policy of that name");
            return Vec::new();
        };

        let stateful = policy
            .stateful_references()
            .iter()
            .filter_map(|r| r.resource_arn.clone());
        let stateless = policy
            .stateless_references()
            .iter()
            .filter_map(|r| r.resource_arn.clone());
        stateful.chain(stateless).collect()
    }

    /// Delete a rule group; failures are logged and ignored
    pub async fn delete_rule_group(&self, rule_group_arn: &str) {
        if let Err(err) = self.client.delete_rule_group(rule_group_arn).await {
            info!(
                rule_group = rule_group_arn,
                kind = %err.kind,
                error = %err,
                "Unable to delete rule group"
            );
        }
    }
}
