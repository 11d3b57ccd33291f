//! Domain models for nfw-reconciler
//!
//! This module contains the request/response shapes exchanged with the
//! remote firewall service and the records produced by a validation run.

pub mod firewall;
pub mod logging;
pub mod validation;

// Re-export commonly used types
pub use firewall::{
    AssociateFirewallPolicyRequest, CreateFirewallPolicyRequest, CreateFirewallRequest,
    CreateRuleGroupRequest, DescribeFirewallPolicyRequest, DescribeFirewallPolicyResponse,
    DescribeFirewallResponse, DescribeRuleGroupRequest, DescribeRuleGroupResponse,
    ExtraFields, FirewallDetails, FirewallPolicy, FirewallPolicyResponse,
    FirewallUpdateResponse, PolicyResponse, RuleGroupDetails, RuleGroupResponse, RuleGroupType,
    StatefulRuleGroupReference, StatelessRuleGroupReference, Tag, TagResourceRequest,
    UpdateFirewallDeleteProtectionRequest, UpdateFirewallDescriptionRequest,
    UpdateFirewallPolicyChangeProtectionRequest, UpdateFirewallPolicyRequest,
    UpdateRuleGroupRequest, UpdateSubnetChangeProtectionRequest,
};
pub use logging::{
    DescribeLoggingConfigurationRequest, LogDestinationConfig, LoggingConfiguration,
    LoggingConfigurationResponse, UpdateLoggingConfigurationRequest,
};
pub use validation::{InvalidFileRecord, ValidationMetrics, ValidationReport};
