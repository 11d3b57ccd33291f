//! Remote firewall client trait definition
//!
//! This module defines the transport seam between the reconciler and the
//! remote network firewall service. Implementations surface raw success or a
//! classified [`RemoteError`]; they own no retry policy.

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::models::{
    AssociateFirewallPolicyRequest, CreateFirewallPolicyRequest, CreateFirewallRequest,
    CreateRuleGroupRequest, DescribeFirewallPolicyRequest, DescribeFirewallPolicyResponse,
    DescribeFirewallResponse, DescribeLoggingConfigurationRequest, DescribeRuleGroupRequest,
    DescribeRuleGroupResponse, FirewallPolicyResponse, FirewallUpdateResponse,
    LoggingConfigurationResponse, RuleGroupResponse, TagResourceRequest,
    UpdateFirewallDeleteProtectionRequest, UpdateFirewallDescriptionRequest,
    UpdateFirewallPolicyChangeProtectionRequest, UpdateFirewallPolicyRequest,
    UpdateLoggingConfigurationRequest, UpdateRuleGroupRequest,
    UpdateSubnetChangeProtectionRequest,
};

/// Trait for remote firewall service transports
///
/// Every method maps to exactly one remote call. Dry-run creation is selected
/// through the request's `dry_run` field.
///
/// # Example
///
/// ```ignore
/// use nfw_reconciler::client::RemoteFirewallClient;
/// use nfw_reconciler::models::DescribeRuleGroupRequest;
///
/// async fn token_of(client: &impl RemoteFirewallClient, arn: &str) -> Option<String> {
///     client
///         .describe_rule_group(&DescribeRuleGroupRequest::by_arn(arn))
///         .await
///         .ok()
///         .and_then(|r| r.update_token)
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteFirewallClient: Send + Sync {
    async fn create_firewall(
        &self,
        request: &CreateFirewallRequest,
    ) -> Result<DescribeFirewallResponse, RemoteError>;

    async fn create_firewall_policy(
        &self,
        request: &CreateFirewallPolicyRequest,
    ) -> Result<FirewallPolicyResponse, RemoteError>;

    async fn create_rule_group(
        &self,
        request: &CreateRuleGroupRequest,
    ) -> Result<RuleGroupResponse, RemoteError>;

    async fn describe_firewall(
        &self,
        firewall_name: &str,
    ) -> Result<DescribeFirewallResponse, RemoteError>;

    async fn describe_firewall_policy(
        &self,
        request: &DescribeFirewallPolicyRequest,
    ) -> Result<DescribeFirewallPolicyResponse, RemoteError>;

    async fn describe_rule_group(
        &self,
        request: &DescribeRuleGroupRequest,
    ) -> Result<DescribeRuleGroupResponse, RemoteError>;

    /// Rejected with a stale-token error when `update_token` is outdated
    async fn update_firewall_policy(
        &self,
        request: &UpdateFirewallPolicyRequest,
    ) -> Result<FirewallPolicyResponse, RemoteError>;

    /// Rejected with a stale-token error when `update_token` is outdated
    async fn update_rule_group(
        &self,
        request: &UpdateRuleGroupRequest,
    ) -> Result<RuleGroupResponse, RemoteError>;

    async fn describe_logging_configuration(
        &self,
        request: &DescribeLoggingConfigurationRequest,
    ) -> Result<LoggingConfigurationResponse, RemoteError>;

    async fn update_logging_configuration(
        &self,
        request: &UpdateLoggingConfigurationRequest,
    ) -> Result<LoggingConfigurationResponse, RemoteError>;

    async fn delete_rule_group(&self, rule_group_arn: &str) -> Result<(), RemoteError>;

    async fn associate_firewall_policy(
        &self,
        request: &AssociateFirewallPolicyRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError>;

    async fn tag_resource(&self, request: &TagResourceRequest) -> Result<(), RemoteError>;

    async fn update_firewall_description(
        &self,
        request: &UpdateFirewallDescriptionRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError>;

    async fn update_firewall_delete_protection(
        &self,
        request: &UpdateFirewallDeleteProtectionRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError>;

    async fn update_firewall_policy_change_protection(
        &self,
        request: &UpdateFirewallPolicyChangeProtectionRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError>;

    async fn update_subnet_change_protection(
        &self,
        request: &UpdateSubnetChangeProtectionRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError>;
}
