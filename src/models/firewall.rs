//! Firewall, firewall policy and rule group shapes
//!
//! Field names follow the remote service's PascalCase JSON wire format so the
//! same types are used for configuration files and remote requests. Fields the
//! reconciler does not interpret are preserved verbatim in `extra` and sent
//! along unchanged, letting the remote side decide whether they are valid.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unknown fields carried through untouched
pub type ExtraFields = Map<String, Value>;

/// Rule group evaluation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleGroupType {
    Stateful,
    Stateless,
}

impl RuleGroupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleGroupType::Stateful => "STATEFUL",
            RuleGroupType::Stateless => "STATELESS",
        }
    }
}

impl std::fmt::Display for RuleGroupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key/value resource tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// A firewall file, also the create-firewall request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateFirewallRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_name: Option<String>,

    /// Path of the policy file in configuration, ARN once deployed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_policy_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Reference from a policy to a stateful rule group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatefulRuleGroupReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Reference from a policy to a stateless rule group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatelessRuleGroupReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// The policy body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FirewallPolicy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stateless_default_actions: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stateless_fragment_default_actions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stateful_rule_group_references: Option<Vec<StatefulRuleGroupReference>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stateless_rule_group_references: Option<Vec<StatelessRuleGroupReference>>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl FirewallPolicy {
    /// Declared stateful references, empty when the list is absent
    pub fn stateful_references(&self) -> &[StatefulRuleGroupReference] {
        self.stateful_rule_group_references.as_deref().unwrap_or(&[])
    }

    /// Declared stateless references, empty when the list is absent
    pub fn stateless_references(&self) -> &[StatelessRuleGroupReference] {
        self.stateless_rule_group_references
            .as_deref()
            .unwrap_or(&[])
    }
}

/// A policy file, also the create-policy request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateFirewallPolicyRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_policy_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_policy: Option<FirewallPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// A rule group file, also the create-rule-group request
///
/// Exactly one of `rule_group` (structured definition) and `rules` (path to a
/// raw rule text file in configuration, the rule text itself once resolved)
/// is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateRuleGroupRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_group_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_group: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<String>,

    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub rule_group_type: Option<RuleGroupType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl CreateRuleGroupRequest {
    /// Raw rule text reference, ignoring empty strings
    pub fn rules_reference(&self) -> Option<&str> {
        self.rules.as_deref().filter(|r| !r.is_empty())
    }

    /// Whether a structured rule group definition is present
    pub fn has_structured_rules(&self) -> bool {
        matches!(&self.rule_group, Some(v) if !v.is_null())
    }
}

/// Firewall details returned by the remote service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FirewallDetails {
    #[serde(default)]
    pub firewall_name: Option<String>,

    #[serde(default)]
    pub firewall_arn: Option<String>,

    #[serde(default)]
    pub firewall_policy_arn: Option<String>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Create/describe firewall response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeFirewallResponse {
    #[serde(default)]
    pub update_token: Option<String>,

    #[serde(default)]
    pub firewall: Option<FirewallDetails>,

    #[serde(default)]
    pub firewall_status: Option<Value>,
}

/// Policy metadata returned by the remote service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyResponse {
    #[serde(default)]
    pub firewall_policy_name: Option<String>,

    #[serde(default)]
    pub firewall_policy_arn: Option<String>,

    #[serde(default)]
    pub firewall_policy_id: Option<String>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Create/update policy response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FirewallPolicyResponse {
    #[serde(default)]
    pub update_token: Option<String>,

    #[serde(default)]
    pub firewall_policy_response: Option<PolicyResponse>,
}

/// Describe policy request; name or ARN identifies the policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeFirewallPolicyRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_policy_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_policy_arn: Option<String>,
}

impl DescribeFirewallPolicyRequest {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            firewall_policy_name: Some(name.into()),
            firewall_policy_arn: None,
        }
    }
}

/// Describe policy response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeFirewallPolicyResponse {
    #[serde(default)]
    pub update_token: Option<String>,

    #[serde(default)]
    pub firewall_policy_response: Option<PolicyResponse>,

    #[serde(default)]
    pub firewall_policy: Option<FirewallPolicy>,
}

/// Update policy request, guarded by `update_token`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateFirewallPolicyRequest {
    pub update_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_policy_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_policy_name: Option<String>,

    pub firewall_policy: FirewallPolicy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

/// Rule group metadata returned by the remote service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleGroupDetails {
    #[serde(default)]
    pub rule_group_arn: Option<String>,

    #[serde(default)]
    pub rule_group_name: Option<String>,

    #[serde(default)]
    pub rule_group_id: Option<String>,

    #[serde(rename = "Type", default)]
    pub rule_group_type: Option<RuleGroupType>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Create/update rule group response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleGroupResponse {
    #[serde(default)]
    pub update_token: Option<String>,

    #[serde(default)]
    pub rule_group_response: Option<RuleGroupDetails>,
}

/// Describe rule group request; name plus type, or ARN
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeRuleGroupRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_group_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_group_arn: Option<String>,

    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub rule_group_type: Option<RuleGroupType>,
}

impl DescribeRuleGroupRequest {
    pub fn by_name(name: impl Into<String>, rule_group_type: RuleGroupType) -> Self {
        Self {
            rule_group_name: Some(name.into()),
            rule_group_arn: None,
            rule_group_type: Some(rule_group_type),
        }
    }

    pub fn by_arn(arn: impl Into<String>) -> Self {
        Self {
            rule_group_name: None,
            rule_group_arn: Some(arn.into()),
            rule_group_type: None,
        }
    }
}

/// Describe rule group response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeRuleGroupResponse {
    #[serde(default)]
    pub update_token: Option<String>,

    #[serde(default)]
    pub rule_group: Option<Value>,

    #[serde(default)]
    pub rule_group_response: Option<RuleGroupDetails>,
}

/// Update rule group request, guarded by `update_token`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateRuleGroupRequest {
    pub update_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_group_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_group_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_group: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<String>,

    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub rule_group_type: Option<RuleGroupType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

/// Associate a policy with a firewall
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssociateFirewallPolicyRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_name: Option<String>,

    pub firewall_policy_arn: String,
}

/// Update the firewall description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateFirewallDescriptionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Toggle firewall delete protection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateFirewallDeleteProtectionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_name: Option<String>,

    pub delete_protection: bool,
}

/// Toggle firewall policy change protection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateFirewallPolicyChangeProtectionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_name: Option<String>,

    pub firewall_policy_change_protection: bool,
}

/// Toggle subnet change protection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateSubnetChangeProtectionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_name: Option<String>,

    pub subnet_change_protection: bool,
}

/// Response shared by firewall association and attribute updates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FirewallUpdateResponse {
    #[serde(default)]
    pub update_token: Option<String>,

    #[serde(default)]
    pub firewall_arn: Option<String>,

    #[serde(default)]
    pub firewall_name: Option<String>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Tag a remote resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TagResourceRequest {
    pub resource_arn: String,
    pub tags: Vec<Tag>,
}
