//! HTTP transport for the remote firewall service
//!
//! This module speaks the service's JSON 1.0 protocol: every operation is a
//! `POST /` with an `X-Amz-Target` header naming the operation and a
//! PascalCase JSON body. Failures are classified once, here, into
//! [`RemoteErrorKind`]s.
//!
//! Request signing is expected to be handled by the endpoint in front of the
//! service (a signing proxy or a local emulator).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::RemoteFirewallClient;
use crate::config::RemoteConfig;
use crate::error::{RemoteError, RemoteErrorKind};
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

/// Service target prefix for the `X-Amz-Target` header
pub const TARGET_PREFIX: &str = "NetworkFirewall_20201112";

const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.0";
const REQUEST_ID_HEADER: &str = "x-amzn-requestid";
const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// JSON-protocol client for the remote firewall service
#[derive(Debug, Clone)]
pub struct HttpFirewallClient {
    client: Client,
    endpoint: String,
}

impl HttpFirewallClient {
    /// Create a client from remote configuration
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let agent = match &config.user_agent {
            Some(extra) => format!("nfw-reconciler/{} {}", env!("CARGO_PKG_VERSION"), extra),
            None => format!("nfw-reconciler/{}", env!("CARGO_PKG_VERSION")),
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(agent)
            .build()
            .map_err(|e| RemoteError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config.endpoint_url()))
    }

    /// Create a client around a custom reqwest Client
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Invoke one remote operation
    async fn call<Req, Resp>(&self, operation: &str, request: &Req) -> Result<Resp, RemoteError>
    where
        Req: Serialize + ?Sized + Sync,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(request).map_err(|e| {
            RemoteError::transport(format!("Failed to encode {} request: {}", operation, e))
        })?;

        debug!(operation = operation, endpoint = %self.endpoint, "Sending remote request");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header("X-Amz-Target", format!("{}.{}", TARGET_PREFIX, operation))
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RemoteError::transport(format!("{} timed out", operation))
                } else {
                    RemoteError::transport(e.to_string())
                }
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let request_id = header_value(&headers, REQUEST_ID_HEADER);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteError::transport(e.to_string()))?;

        if status.is_success() {
            debug!(
                operation = operation,
                status = status.as_u16(),
                body_size = bytes.len(),
                "Received remote response"
            );
            let payload: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };
            return serde_json::from_slice(payload).map_err(|e| {
                RemoteError::transport(format!("Failed to decode {} response: {}", operation, e))
            });
        }

        let err = decode_error(status, &headers, &bytes, request_id);
        warn!(
            operation = operation,
            kind = %err.kind,
            name = %err.name,
            message = %err.message,
            status = ?err.status,
            request_id = ?err.request_id,
            "Remote call failed"
        );
        Err(err)
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Build a classified error from a non-success response
fn decode_error(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
    request_id: Option<String>,
) -> RemoteError {
    let parsed: Value = serde_json::from_slice(body).unwrap_or(Value::Null);

    let name = header_value(headers, ERROR_TYPE_HEADER)
        .or_else(|| string_field(&parsed, &["__type", "code", "Code"]))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("UnknownError")
                .replace(' ', "")
        });
    let message = string_field(&parsed, &["message", "Message"]).unwrap_or_default();

    let mut err = if status == StatusCode::TOO_MANY_REQUESTS {
        RemoteError::with_kind(RemoteErrorKind::Throttled, name, message)
    } else {
        RemoteError::new(name, message)
    };
    err = err.status(status.as_u16());
    if let Some(id) = request_id {
        err = err.request_id(id);
    }
    err
}

fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .map(String::from)
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct FirewallNameRequest<'a> {
    firewall_name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RuleGroupArnRequest<'a> {
    rule_group_arn: &'a str,
}

#[async_trait]
impl RemoteFirewallClient for HttpFirewallClient {
    async fn create_firewall(
        &self,
        request: &CreateFirewallRequest,
    ) -> Result<DescribeFirewallResponse, RemoteError> {
        self.call("CreateFirewall", request).await
    }

    async fn create_firewall_policy(
        &self,
        request: &CreateFirewallPolicyRequest,
    ) -> Result<FirewallPolicyResponse, RemoteError> {
        self.call("CreateFirewallPolicy", request).await
    }

    async fn create_rule_group(
        &self,
        request: &CreateRuleGroupRequest,
    ) -> Result<RuleGroupResponse, RemoteError> {
        self.call("CreateRuleGroup", request).await
    }

    async fn describe_firewall(
        &self,
        firewall_name: &str,
    ) -> Result<DescribeFirewallResponse, RemoteError> {
        self.call("DescribeFirewall", &FirewallNameRequest { firewall_name })
            .await
    }

    async fn describe_firewall_policy(
        &self,
        request: &DescribeFirewallPolicyRequest,
    ) -> Result<DescribeFirewallPolicyResponse, RemoteError> {
        self.call("DescribeFirewallPolicy", request).await
    }

    async fn describe_rule_group(
        &self,
        request: &DescribeRuleGroupRequest,
    ) -> Result<DescribeRuleGroupResponse, RemoteError> {
        self.call("DescribeRuleGroup", request).await
    }

    async fn update_firewall_policy(
        &self,
        request: &UpdateFirewallPolicyRequest,
    ) -> Result<FirewallPolicyResponse, RemoteError> {
        self.call("UpdateFirewallPolicy", request).await
    }

    async fn update_rule_group(
        &self,
        request: &UpdateRuleGroupRequest,
    ) -> Result<RuleGroupResponse, RemoteError> {
        self.call("UpdateRuleGroup", request).await
    }

    async fn describe_logging_configuration(
        &self,
        request: &DescribeLoggingConfigurationRequest,
    ) -> Result<LoggingConfigurationResponse, RemoteError> {
        self.call("DescribeLoggingConfiguration", request).await
    }

    async fn update_logging_configuration(
        &self,
        request: &UpdateLoggingConfigurationRequest,
    ) -> Result<LoggingConfigurationResponse, RemoteError> {
        self.call("UpdateLoggingConfiguration", request).await
    }

    async fn delete_rule_group(&self, rule_group_arn: &str) -> Result<(), RemoteError> {
        let _: Value = self
            .call("DeleteRuleGroup", &RuleGroupArnRequest { rule_group_arn })
            .await?;
        Ok(())
    }

    async fn associate_firewall_policy(
        &self,
        request: &AssociateFirewallPolicyRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError> {
        self.call("AssociateFirewallPolicy", request).await
    }

    async fn tag_resource(&self, request: &TagResourceRequest) -> Result<(), RemoteError> {
        let _: Value = self.call("TagResource", request).await?;
        Ok(())
    }

    async fn update_firewall_description(
        &self,
        request: &UpdateFirewallDescriptionRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError> {
        self.call("UpdateFirewallDescription", request).await
    }

    async fn update_firewall_delete_protection(
        &self,
        request: &UpdateFirewallDeleteProtectionRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError> {
        self.call("UpdateFirewallDeleteProtection", request).await
    }

    async fn update_firewall_policy_change_protection(
        &self,
        request: &UpdateFirewallPolicyChangeProtectionRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError> {
        self.call("UpdateFirewallPolicyChangeProtection", request)
            .await
    }

    async fn update_subnet_change_protection(
        &self,
        request: &UpdateSubnetChangeProtectionRequest,
    ) -> Result<FirewallUpdateResponse, RemoteError> {
        self.call("UpdateSubnetChangeProtection", request).await
    }
}
