//! Integration tests for the update and read protocols
//!
//! The service facade is exercised against the in-memory remote service and
//! against the HTTP transport backed by a mock server.

mod common;

use common::FakeFirewallClient;
use serde_json::json;
use std::collections::BTreeMap;
use wiremock::matchers::{body_partial_json, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nfw_reconciler::client::HttpFirewallClient;
use nfw_reconciler::config::RetryConfig;
use nfw_reconciler::error::{ProtocolError, RemoteError};
use nfw_reconciler::models::{
    DescribeFirewallPolicyResponse, DescribeRuleGroupResponse, FirewallPolicy,
    LogDestinationConfig, LoggingConfiguration, RuleGroupType, StatefulRuleGroupReference,
    StatelessRuleGroupReference, UpdateFirewallPolicyRequest, UpdateRuleGroupRequest,
};
use nfw_reconciler::reconcile::NetworkFirewallService;

fn policy_update(token: &str) -> UpdateFirewallPolicyRequest {
    UpdateFirewallPolicyRequest {
        update_token: token.to_string(),
        firewall_policy_name: Some("central".to_string()),
        firewall_policy: FirewallPolicy {
            stateless_default_actions: vec!["aws:forward_to_sfe".to_string()],
            stateless_fragment_default_actions: vec!["aws:forward_to_sfe".to_string()],
            ..Default::default()
        },
        ..Default::default()
    }
}

fn rule_group_update(token: &str) -> UpdateRuleGroupRequest {
    UpdateRuleGroupRequest {
        update_token: token.to_string(),
        rule_group_arn: Some("arn:aws:network-firewall:us-east-1:1:stateful-rulegroup/sg".to_string()),
        rules: Some("pass ip any any -> any any (sid:1;)".to_string()),
        ..Default::default()
    }
}

fn destination(log_type: &str, bucket: &str) -> LogDestinationConfig {
    LogDestinationConfig {
        log_type: log_type.to_string(),
        log_destination_type: "S3".to_string(),
        log_destination: BTreeMap::from([("bucketName".to_string(), bucket.to_string())]),
    }
}

fn policy_token(token: &str) -> Result<DescribeFirewallPolicyResponse, RemoteError> {
    Ok(DescribeFirewallPolicyResponse {
        update_token: Some(token.to_string()),
        ..Default::default()
    })
}

fn rule_group_token(token: &str) -> Result<DescribeRuleGroupResponse, RemoteError> {
    Ok(DescribeRuleGroupResponse {
        update_token: Some(token.to_string()),
        ..Default::default()
    })
}

#[tokio::test]
async fn test_policy_update_recovers_from_stale_tokens() {
    let client = FakeFirewallClient::new();
    client.push_update_policy(Err(RemoteError::stale_token()));
    client.push_update_policy(Err(RemoteError::stale_token()));
    client.push_describe_policy(policy_token("t1"));
    client.push_describe_policy(policy_token("t2"));

    let service = NetworkFirewallService::new(client.clone());
    service.update_firewall_policy(policy_update("t0")).await.unwrap();

    assert_eq!(client.policy_tokens(), vec!["t0", "t1", "t2"]);
    assert_eq!(client.call_count("DescribeFirewallPolicy"), 2);
}

#[tokio::test]
async fn test_rule_group_update_stops_after_five_attempts() {
    let client = FakeFirewallClient::new();
    for n in 0..5 {
        client.push_update_rule_group(Err(RemoteError::stale_token()));
        client.push_describe_rule_group(rule_group_token(&format!("t{}", n + 1)));
    }

    let service = NetworkFirewallService::new(client.clone());
    let err = service
        .update_rule_group(rule_group_update("t0"))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Maximum token retry attempts exceeded for rule group update"
    );
    assert_eq!(client.call_count("UpdateRuleGroup"), 5);
    // No refresh after the final rejection
    assert_eq!(client.call_count("DescribeRuleGroup"), 4);
}

#[tokio::test]
async fn test_missing_token_aborts_update() {
    let client = FakeFirewallClient::new();
    client.push_update_policy(Err(RemoteError::stale_token()));
    client.push_describe_policy(Ok(DescribeFirewallPolicyResponse::default()));

    let service = NetworkFirewallService::new(client.clone());
    let err = service
        .update_firewall_policy(policy_update("t0"))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Failed to get valid update token for firewall policy"
    );
    assert_eq!(client.call_count("UpdateFirewallPolicy"), 1);
}

#[tokio::test]
async fn test_retry_bound_follows_config() {
    let client = FakeFirewallClient::new();
    client.push_update_policy(Err(RemoteError::stale_token()));
    client.push_update_policy(Err(RemoteError::stale_token()));
    client.push_describe_policy(policy_token("t1"));

    let config = RetryConfig {
        max_token_retries: 2,
        ..Default::default()
    };
    let service = NetworkFirewallService::with_retry_config(client.clone(), &config);
    let err = service
        .update_firewall_policy(policy_update("t0"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ProtocolError::MaxTokenRetriesExceeded { attempts: 2, .. }
    ));
}

#[tokio::test]
async fn test_describe_rule_group_throttled_then_found() {
    let client = FakeFirewallClient::new();
    client.push_describe_rule_group(Err(RemoteError::throttled()));
    client.push_describe_rule_group(Err(RemoteError::throttled()));
    client.push_describe_rule_group(rule_group_token("found"));

    let service = NetworkFirewallService::new(client.clone());
    let response = service
        .describe_rule_group("suricata", RuleGroupType::Stateful)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(response.update_token.as_deref(), Some("found"));
    assert_eq!(client.call_count("DescribeRuleGroup"), 3);
}

#[tokio::test]
async fn test_describe_rule_group_exhausts_on_throttling() {
    let client = FakeFirewallClient::new();
    for _ in 0..4 {
        client.push_describe_rule_group(Err(RemoteError::throttled()));
    }

    let service = NetworkFirewallService::new(client.clone());
    let err = service
        .describe_rule_group("suricata", RuleGroupType::Stateful)
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Unable to resolve request and completed retries."
    );
    assert_eq!(client.call_count("DescribeRuleGroup"), 3);
}

#[tokio::test]
async fn test_describe_rule_group_absent() {
    let client = FakeFirewallClient::new();

    let service = NetworkFirewallService::new(client.clone());
    let response = service
        .describe_rule_group("missing", RuleGroupType::Stateless)
        .await
        .unwrap();

    assert!(response.is_none());
    assert_eq!(client.call_count("DescribeRuleGroup"), 1);
}

#[tokio::test]
async fn test_logging_replaced_one_change_at_a_time() {
    let client = FakeFirewallClient::new();
    client.set_logging(LoggingConfiguration {
        log_destination_configs: vec![destination("FLOW", "old-flow"), destination("ALERT", "old-alert")],
    });
    let desired = LoggingConfiguration {
        log_destination_configs: vec![destination("FLOW", "new-flow"), destination("ALERT", "new-alert")],
    };

    let service = NetworkFirewallService::new(client.clone());
    let result = service
        .update_logging_configuration("inspection-fw", &desired)
        .await;

    assert_eq!(result.as_ref(), Some(&desired));
    assert_eq!(client.logging(), desired);
    assert_eq!(client.call_count("UpdateLoggingConfiguration"), 4);
}

#[tokio::test]
async fn test_list_rule_groups_for_policy() {
    let client = FakeFirewallClient::new();
    client.push_describe_policy(Ok(DescribeFirewallPolicyResponse {
        firewall_policy: Some(FirewallPolicy {
            stateful_rule_group_references: Some(vec![StatefulRuleGroupReference {
                resource_arn: Some("arn:stateful".to_string()),
                ..Default::default()
            }]),
            stateless_rule_group_references: Some(vec![StatelessRuleGroupReference {
                resource_arn: Some("arn:stateless".to_string()),
                priority: Some(1),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }));

    let service = NetworkFirewallService::new(client.clone());

    assert_eq!(
        service.list_rule_groups_for_policy("central").await,
        vec!["arn:stateful", "arn:stateless"]
    );
    // Script exhausted: not found yields an empty list
    assert!(service.list_rule_groups_for_policy("central").await.is_empty());
}

#[tokio::test]
async fn test_http_throttling_retried_through_service() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", "NetworkFirewall_20201112.DescribeRuleGroup"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", "NetworkFirewall_20201112.DescribeRuleGroup"))
        .and(body_partial_json(json!({"RuleGroupName": "suricata", "Type": "STATEFUL"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "UpdateToken": "tok",
            "RuleGroupResponse": {"RuleGroupName": "suricata", "Type": "STATEFUL"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpFirewallClient::with_client(reqwest::Client::new(), mock_server.uri());
    let service = NetworkFirewallService::new(client);

    let response = service
        .describe_rule_group("suricata", RuleGroupType::Stateful)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(response.update_token.as_deref(), Some("tok"));
}

#[tokio::test]
async fn test_http_stale_token_refreshed_through_service() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", "NetworkFirewall_20201112.UpdateFirewallPolicy"))
        .and(body_partial_json(json!({"UpdateToken": "t0"})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "InvalidTokenException",
            "message": "Update token is invalid."
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", "NetworkFirewall_20201112.DescribeFirewallPolicy"))
        .and(body_partial_json(json!({"FirewallPolicyName": "central"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"UpdateToken": "t1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", "NetworkFirewall_20201112.UpdateFirewallPolicy"))
        .and(body_partial_json(json!({"UpdateToken": "t1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "UpdateToken": "t2",
            "FirewallPolicyResponse": {"FirewallPolicyName": "central"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpFirewallClient::with_client(reqwest::Client::new(), mock_server.uri());
    let service = NetworkFirewallService::new(client);

    let response = service
        .update_firewall_policy(policy_update("t0"))
        .await
        .unwrap();

    assert_eq!(response.update_token.as_deref(), Some("t2"));
}
