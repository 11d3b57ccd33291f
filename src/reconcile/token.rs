//! Optimistic-concurrency update protocol
//!
//! Firewall policies and rule groups are guarded by a server-issued update
//! token that goes stale on any intervening write. [`UpdateTokenProtocol`]
//! retries a mutation against a stale token a bounded number of times,
//! describing the resource between attempts to obtain a fresh token.
//!
//! Each iteration threads an immutable `{request, attempt}` pair through the
//! loop; the caller's request is never mutated.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::client::RemoteFirewallClient;
use crate::config::RetryConfig;
use crate::error::{ProtocolError, RemoteError, ResourceKind};
use crate::models::{
    DescribeFirewallPolicyRequest, DescribeRuleGroupRequest, FirewallPolicyResponse,
    RuleGroupResponse, UpdateFirewallPolicyRequest, UpdateRuleGroupRequest,
};

/// A mutation request guarded by an update token
#[async_trait]
pub trait TokenGuardedUpdate: Send + Sync + Sized {
    /// Response of a successful mutation
    type Response: Send;

    /// Resource kind, used in error messages
    const RESOURCE: ResourceKind;

    /// Same request carrying a different token
    fn with_token(self, token: String) -> Self;

    /// Issue the mutation once
    async fn apply<C>(&self, client: &C) -> Result<Self::Response, RemoteError>
    where
        C: RemoteFirewallClient + ?Sized;

    /// Describe the guarded resource and return its current token
    async fn refresh_token<C>(&self, client: &C) -> Result<Option<String>, RemoteError>
    where
        C: RemoteFirewallClient + ?Sized;
}

#[async_trait]
impl TokenGuardedUpdate for UpdateFirewallPolicyRequest {
    type Response = FirewallPolicyResponse;
    const RESOURCE: ResourceKind = ResourceKind::FirewallPolicy;

    fn with_token(self, token: String) -> Self {
        Self {
            update_token: token,
            ..self
        }
    }

    async fn apply<C>(&self, client: &C) -> Result<Self::Response, RemoteError>
    where
        C: RemoteFirewallClient + ?Sized,
    {
        client.update_firewall_policy(self).await
    }

    async fn refresh_token<C>(&self, client: &C) -> Result<Option<String>, RemoteError>
    where
        C: RemoteFirewallClient + ?Sized,
    {
        // Name first; the ARN only when the request was built without one
        let request = DescribeFirewallPolicyRequest {
            firewall_policy_name: self.firewall_policy_name.clone(),
            firewall_policy_arn: match self.firewall_policy_name {
                Some(_) => None,
                None => self.firewall_policy_arn.clone(),
            },
        };
        let response = client.describe_firewall_policy(&request).await?;
        Ok(response.update_token)
    }
}

#[async_trait]
impl TokenGuardedUpdate for UpdateRuleGroupRequest {
    type Response = RuleGroupResponse;
    const RESOURCE: ResourceKind = ResourceKind::RuleGroup;

    fn with_token(self, token: String) -> Self {
        Self {
            update_token: token,
            ..self
        }
    }

    async fn apply<C>(&self, client: &C) -> Result<Self::Response, RemoteError>
    where
        C: RemoteFirewallClient + ?Sized,
    {
        client.update_rule_group(self).await
    }

    async fn refresh_token<C>(&self, client: &C) -> Result<Option<String>, RemoteError>
    where
        C: RemoteFirewallClient + ?Sized,
    {
        let request = match (&self.rule_group_arn, &self.rule_group_name, self.rule_group_type) {
            (Some(arn), _, _) => DescribeRuleGroupRequest::by_arn(arn.clone()),
            (None, Some(name), Some(kind)) => DescribeRuleGroupRequest::by_name(name.clone(), kind),
            (None, name, kind) => DescribeRuleGroupRequest {
                rule_group_name: name.clone(),
                rule_group_arn: None,
                rule_group_type: kind,
            },
        };
        let response = client.describe_rule_group(&request).await?;
        Ok(response.update_token)
    }
}

/// State carried from one attempt to the next
struct Attempt<R> {
    request: R,
    attempt: u32,
}

/// Bounded stale-token retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateTokenProtocol {
    max_attempts: u32,
}

impl Default for UpdateTokenProtocol {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl UpdateTokenProtocol {
    /// Create a protocol allowing `max_attempts` mutation attempts
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_token_retries)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Apply `request`, refreshing its token on each stale-token rejection
    ///
    /// Fails with [`ProtocolError::MaxTokenRetriesExceeded`] after
    /// `max_attempts` stale-token rejections, with
    /// [`ProtocolError::MissingUpdateToken`] when a describe yields no usable
    /// token, and with [`ProtocolError::Remote`] for any other failure.
    pub async fn update<C, R>(&self, client: &C, request: R) -> Result<R::Response, ProtocolError>
    where
        C: RemoteFirewallClient + ?Sized,
        R: TokenGuardedUpdate,
    {
        let mut state = Attempt {
            request,
            attempt: 0,
        };

        loop {
            let err = match state.request.apply(client).await {
                Ok(response) => {
                    debug!(
                        resource = %R::RESOURCE,
                        attempts = state.attempt + 1,
                        "Update applied"
                    );
                    return Ok(response);
                }
                Err(err) if err.is_stale_token() => err,
                Err(err) => {
                    debug!(resource = %R::RESOURCE, error = %err, "Update failed");
                    return Err(ProtocolError::Remote(err));
                }
            };

            let attempt = state.attempt + 1;
            if attempt >= self.max_attempts {
                warn!(
                    resource = %R::RESOURCE,
                    attempts = attempt,
                    max_attempts = self.max_attempts,
                    "Maximum token retry attempts exceeded"
                );
                return Err(ProtocolError::MaxTokenRetriesExceeded {
                    resource: R::RESOURCE,
                    attempts: attempt,
                });
            }

            info!(
                resource = %R::RESOURCE,
                attempt = attempt,
                error = %err,
                "Stale update token, refreshing"
            );

            let token = match state.request.refresh_token(client).await {
                Ok(Some(token)) if !token.is_empty() => token,
                Ok(_) => {
                    warn!(resource = %R::RESOURCE, "Describe returned no update token");
                    return Err(ProtocolError::MissingUpdateToken {
                        resource: R::RESOURCE,
                        source: None,
                    });
                }
                Err(source) => {
                    warn!(resource = %R::RESOURCE, error = %source, "Token refresh failed");
                    return Err(ProtocolError::MissingUpdateToken {
                        resource: R::RESOURCE,
                        source: Some(source),
                    });
                }
            };

            state = Attempt {
                request: state.request.with_token(token),
                attempt,
            };
        }
    }
}
