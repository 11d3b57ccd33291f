//! Common test utilities and helpers for integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use nfw_reconciler::client::RemoteFirewallClient;
use nfw_reconciler::error::RemoteError;
use nfw_reconciler::models::{
    AssociateFirewallPolicyRequest, CreateFirewallPolicyRequest, CreateFirewallRequest,
    CreateRuleGroupRequest, DescribeFirewallPolicyRequest, DescribeFirewallPolicyResponse,
    DescribeFirewallResponse, DescribeLoggingConfigurationRequest, DescribeRuleGroupRequest,
    DescribeRuleGroupResponse, FirewallPolicyResponse, FirewallUpdateResponse,
    LoggingConfiguration, LoggingConfigurationResponse, RuleGroupResponse, TagResourceRequest,
    UpdateFirewallDeleteProtectionRequest, UpdateFirewallDescriptionRequest,
    UpdateFirewallPolicyChangeProtectionRequest, UpdateFirewallPolicyRequest,
    UpdateLoggingConfigurationRequest, UpdateRuleGroupRequest,
    UpdateSubnetChangeProtectionRequest, ValidationMetrics,
};
use nfw_reconciler::telemetry::TelemetryCollector;

type Script<T> = VecDeque<Result<T, RemoteError>>;

#[derive(Default)]
struct FakeState {
    calls: Vec<String>,
    rejections: HashMap<String, RemoteError>,
    describe_policy: Script<DescribeFirewallPolicyResponse>,
    describe_rule_group: Script<DescribeRuleGroupResponse>,
    update_policy: Script<FirewallPolicyResponse>,
    update_rule_group: Script<RuleGroupResponse>,
    policy_tokens: Vec<String>,
    rule_group_tokens: Vec<String>,
    logging: LoggingConfiguration,
    dry_run_rules: Vec<Option<String>>,
}

/// In-memory scripted remote firewall service
///
/// Describe and update calls pop scripted results in order; an exhausted
/// describe script answers not-found and an exhausted update script succeeds.
/// Logging configuration is held in memory and, like the real service, an
/// update may change at most one destination.
#[derive(Clone, Default)]
pub struct FakeFirewallClient {
    state: Arc<Mutex<FakeState>>,
}

impl FakeFirewallClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn record(&self, op: &str) {
        self.state().calls.push(op.to_string());
    }

    /// Reject dry-run creation of the named policy or rule group
    pub fn reject_create(&self, resource_name: &str, error: RemoteError) {
        self.state()
            .rejections
            .insert(resource_name.to_string(), error);
    }

    pub fn push_describe_policy(&self, result: Result<DescribeFirewallPolicyResponse, RemoteError>) {
        self.state().describe_policy.push_back(result);
    }

    pub fn push_describe_rule_group(&self, result: Result<DescribeRuleGroupResponse, RemoteError>) {
        self.state().describe_rule_group.push_back(result);
    }

    pub fn push_update_policy(&self, result: Result<FirewallPolicyResponse, RemoteError>) {
        self.state().update_policy.push_back(result);
    }

    pub fn push_update_rule_group(&self, result: Result<RuleGroupResponse, RemoteError>) {
        self.state().update_rule_group.push_back(result);
    }

    pub fn set_logging(&self, configuration: LoggingConfiguration) {
        self.state().logging = configuration;
    }

    pub fn logging(&self) -> LoggingConfiguration {
        self.state().logging.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.state().calls.iter().filter(|c| c.as_str() == op).count()
    }

    /// Tokens presented to `update_firewall_policy`, in order
    pub fn policy_tokens(&self) -> Vec<String> {
        self.state().policy_tokens.clone()
    }

    /// Tokens presented to `update_rule_group`, in order
    pub fn rule_group_tokens(&self) -> Vec<String> {
        self.state().rule_group_tokens.clone()
    }

    /// `Rules` text received by rule group dry runs
    pub fn dry_run_rules(&self) -> Vec<Option<String>> {
        self.state().dry_run_rules.clone()
    }

    fn rejection(&self, name: Option<&str>) -> Option<RemoteError> {
        name.and_then(|n| self.state().rejections.get(n).cloned())
    }
}

#[async_trait]
impl RemoteFirewallClient for FakeFirewallClient {
    async fn create_firewall(
        &self,
        request: &CreateFirewallRequest,
    ) -> Result<DescribeFirewallResponse, RemoteError> {
        self.record("CreateFirewall");
        if let Some(err) = self.rejection(request.firewall_name.as_deref()) {
            return Err(err);
        }
        Ok(DescribeFirewallResponse::default())
    }

    async fn create_firewall_policy(
        &self,
        request: &CreateFirewallPolicyRequest,
    ) -> Result<FirewallPolicyResponse, RemoteError> {
        self.record("CreateFirewallPolicy");
        if let Some(err) = self.rejection(request.firewall_policy_name.as_deref()) {
            return Err(err);
        }
        Ok(FirewallPolicyResponse::default())
    }

    async fn create_rule_group(
        &self,
        request: &CreateRuleGroupRequest,
    ) -> Result<RuleGroupResponse, RemoteError> {
        self.record("CreateRuleGroup");
        self.state().dry_run_rules.push(request.rules.clone());
        if let Some(err) = self.rejection(request.rule_group_name.as_deref()) {
            return Err(err);
        }
        Ok(RuleGroupResponse::default())
    }

    async fn describe_firewall(
        &self,
        firewall_name: &str,
    ) -> Result<DescribeFirewallResponse, RemoteError> {
        self.record("DescribeFirewall");
        Err(RemoteError::not_found(format!(
            "Firewall {} not found",
            firewall_name
        )))
    }

    async fn describe_firewall_policy(
        &self,
        _request: &DescribeFirewallPolicyRequest,
    ) -> Result<DescribeFirewallPolicyResponse, RemoteError> {
        self.record("DescribeFirewallPolicy");
        self.state()
            .describe_policy
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::not_found("Firewall policy not found")))
    }

    async fn describe_rule_group(
        &self,
        _request: &DescribeRuleGroupRequest,
    ) -> Result<DescribeRuleGroupResponse, RemoteError> {
        self.record("DescribeRuleGroup");
        self.state()
            .describe_rule_group
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::not_found("Rule group not found")))
    }

    async fn update_firewall_policy(
        &self,
        request: &UpdateFirewallPolicyRequest,
    ) -> Result<FirewallPolicyResponse, RemoteError> {
        self.record("UpdateFirewallPolicy");
        let mut state = self.state();
        state.policy_tokens.push(request.update_token.clone());
        state
            .update_policy
            .pop_front()
            .unwrap_or_else(|| Ok(FirewallPolicyResponse::default()))
    }

    async fn update_rule_group(
        &self,
        request: &UpdateRuleGroupRequest,
    ) -> Result<RuleGroupResponse, RemoteError> {
        self.record("UpdateRuleGroup");
        let mut state = self.state();
        state.rule_group_tokens.push(request.update_token.clone());
        state
            .update_rule_group
            .pop_front()
            .unwrap_or_else(|| Ok(RuleGroupResponse::default()))
    }

    async fn describe_logging_configuration(
        &self,
        request: &DescribeLoggingConfigurationRequest,
    ) -> Result<LoggingConfigurationResponse, RemoteError> {
        self.record("DescribeLoggingConfiguration");
        Ok(LoggingConfigurationResponse {
            firewall_name: request.firewall_name.clone(),
            firewall_arn: None,
            logging_configuration: Some(self.logging()),
        })
    }

    async fn update_logging_configuration(
        &self,
        request: &UpdateLoggingConfigurationRequest,
    ) -> Result<LoggingConfigurationResponse, RemoteError> {
        self.record("UpdateLoggingConfiguration");
        let mut state = self.state();
        let current = &state.logging.log_destination_configs;
        let next = &request.logging_configuration.log_destination_configs;

        let removed = current.iter().filter(|c| !next.contains(c)).count();
        let added = next.iter().filter(|c| !current.contains(c)).count();
        if removed + added > 1 {
            return Err(RemoteError::new(
                "InvalidRequestException",
                "Only one destination may be added or removed per update",
            ));
        }

        state.logging = request.logging_configuration.clone();
        Ok(LoggingConfigurationResponse {
            firewall_name: request.firewall_name.clone(),
            firewall_arn: None,
            logging_configuration: Some(state.logging.clone()),
        })
    }

    async fn delete_rule_group(&self, _rule_group_arn: &str) -> Result<(), RemoteError> {
        self.record("DeleteRuleGroup");
        Ok(())
    }

    async fn associate_firewall_policy(
        &self,
        _request: &AssociateFirewallPolicyRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError> {
        self.record("AssociateFirewallPolicy");
        Ok(FirewallUpdateResponse::default())
    }

    async fn tag_resource(&self, _request: &TagResourceRequest) -> Result<(), RemoteError> {
        self.record("TagResource");
        Ok(())
    }

    async fn update_firewall_description(
        &self,
        _request: &UpdateFirewallDescriptionRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError> {
        self.record("UpdateFirewallDescription");
        Ok(FirewallUpdateResponse::default())
    }

    async fn update_firewall_delete_protection(
        &self,
        _request: &UpdateFirewallDeleteProtectionRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError> {
        self.record("UpdateFirewallDeleteProtection");
        Ok(FirewallUpdateResponse::default())
    }

    async fn update_firewall_policy_change_protection(
        &self,
        _request: &UpdateFirewallPolicyChangeProtectionRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError> {
        self.record("UpdateFirewallPolicyChangeProtection");
        Ok(FirewallUpdateResponse::default())
    }

    async fn update_subnet_change_protection(
        &self,
        _request: &UpdateSubnetChangeProtectionRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError> {
        self.record("UpdateSubnetChangeProtection");
        Ok(FirewallUpdateResponse::default())
    }
}

/// Telemetry collector that keeps every report
#[derive(Clone, Default)]
pub struct RecordingCollector {
    reports: Arc<Mutex<Vec<ValidationMetrics>>>,
}

impl RecordingCollector {
    pub fn reports(&self) -> Vec<ValidationMetrics> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl TelemetryCollector for RecordingCollector {
    async fn report(&self, metrics: &ValidationMetrics) {
        self.reports.lock().unwrap().push(*metrics);
    }
}

/// Write a JSON file, creating parent directories
pub fn write_json(root: &Path, relative: &str, value: &Value) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

/// Write a plain text file, creating parent directories
pub fn write_text(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, text).unwrap();
}

/// Write a consistent configuration tree
///
/// One firewall referencing one policy, which references one Suricata
/// stateful rule group and one stateless rule group.
pub fn write_valid_tree(root: &Path) {
    write_json(
        root,
        "firewalls/inspection.json",
        &json!({
            "FirewallName": "inspection-fw",
            "FirewallPolicyArn": "policies/central.json",
            "VpcId": "vpc-123",
            "SubnetMappings": [{"SubnetId": "subnet-1"}]
        }),
    );
    write_json(
        root,
        "policies/central.json",
        &json!({
            "FirewallPolicyName": "central",
            "FirewallPolicy": {
                "StatelessDefaultActions": ["aws:forward_to_sfe"],
                "StatelessFragmentDefaultActions": ["aws:forward_to_sfe"],
                "StatefulRuleGroupReferences": [
                    {"ResourceArn": "rulegroups/suricata.json"}
                ],
                "StatelessRuleGroupReferences": [
                    {"ResourceArn": "rulegroups/stateless.json", "Priority": 10}
                ]
            }
        }),
    );
    write_json(
        root,
        "rulegroups/suricata.json",
        &json!({
            "RuleGroupName": "suricata",
            "Type": "STATEFUL",
            "Capacity": 100,
            "Rules": "rules/suricata.rules"
        }),
    );
    write_text(
        root,
        "rules/suricata.rules",
        "drop tcp any any -> any 23 (msg:\"telnet\"; sid:1;)",
    );
    write_json(
        root,
        "rulegroups/stateless.json",
        &json!({
            "RuleGroupName": "stateless",
            "Type": "STATELESS",
            "Capacity": 10,
            "RuleGroup": {
                "RulesSource": {
                    "StatelessRulesAndCustomActions": {"StatelessRules": []}
                }
            }
        }),
    );
}
