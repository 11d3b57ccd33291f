//! Configuration graph validation
//!
//! Walks firewall files, the policy each one references, and the rule groups
//! each policy references. Broken references and structural problems are
//! recorded as [`InvalidFileRecord`]s; one bad branch never stops the walk.
//! Policies and rule groups that resolve are dry-run against the remote
//! service, and only its structural rejections are recorded.
//!
//! The run fails once the walk is complete if anything was recorded.
//! Otherwise the gathered counters are handed to the telemetry collector.

use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, error, info, warn};

use super::reader::ConfigFileReader;
use crate::client::RemoteFirewallClient;
use crate::error::{ReaderError, RemoteError, ValidationError};
use crate::models::{
    CreateFirewallPolicyRequest, CreateFirewallRequest, CreateRuleGroupRequest,
    InvalidFileRecord, RuleGroupType, ValidationMetrics, ValidationReport,
};
use crate::telemetry::TelemetryCollector;

pub const UNKNOWN_FIREWALL: &str = "[unknown firewall]";
pub const UNNAMED_FIREWALL: &str = "[unnamed firewall]";
pub const UNKNOWN_POLICY: &str = "[unknown policy]";
pub const UNKNOWN_RULE_GROUP: &str = "[unknown rule group]";

const FILE_NOT_AVAILABLE: &str =
    "The file in the attribute path is not available in the configuration.";
const NAME_AND_POLICY_REQUIRED: &str =
    "FirewallName and FirewallPolicyArn are both required in the firewall.";
const NAME_REQUIRED: &str = "FirewallName is required in the firewall.";
const POLICY_REQUIRED: &str = "FirewallPolicyArn is required in the firewall.";
const BOTH_RULE_FIELDS: &str = "Both RuleGroup and Rules have data, You must provide either the rule group setting or a Rules setting, but not both. ";
const INVALID_RULES_PATH: &str = "Rules attribute has invalid file path. ";

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Check that a firewall names itself and its policy
///
/// Returns at most one record. Empty strings count as missing.
pub fn check_firewall_name_and_policy(firewall: &CreateFirewallRequest) -> Option<InvalidFileRecord> {
    let name = non_empty(firewall.firewall_name.as_deref());
    let policy = non_empty(firewall.firewall_policy_arn.as_deref());

    match (name, policy) {
        (Some(_), Some(_)) => None,
        (None, None) => Some(
            InvalidFileRecord::new(UNKNOWN_FIREWALL, NAME_AND_POLICY_REQUIRED)
                .referenced_in(UNKNOWN_FIREWALL),
        ),
        (None, Some(policy)) => {
            Some(InvalidFileRecord::new(UNNAMED_FIREWALL, NAME_REQUIRED).referenced_in(policy))
        }
        (Some(name), None) => {
            Some(InvalidFileRecord::new(name, POLICY_REQUIRED).referenced_in(name))
        }
    }
}

/// Why a referenced file could not be loaded as a model
#[derive(Debug)]
enum LoadError {
    /// Missing, unreadable or not JSON
    Unavailable(ReaderError),
    /// Valid JSON that does not fit the expected shape
    Shape(String),
}

/// State owned by one validation run
#[derive(Debug, Default)]
struct ValidationRun {
    invalid_files: Vec<InvalidFileRecord>,
    metrics: ValidationMetrics,
    files_checked: usize,
}

impl ValidationRun {
    fn record(&mut self, record: InvalidFileRecord) {
        debug!(path = %record.path, error = %record.error, "Recording invalid file");
        self.invalid_files.push(record);
    }
}

/// Validates the firewall → policy → rule group file graph
pub struct ConfigGraphValidator<C, R, T> {
    client: C,
    reader: R,
    telemetry: T,
}

impl<C, R, T> ConfigGraphValidator<C, R, T>
where
    C: RemoteFirewallClient,
    R: ConfigFileReader,
    T: TelemetryCollector,
{
    pub fn new(client: C, reader: R, telemetry: T) -> Self {
        Self {
            client,
            reader,
            telemetry,
        }
    }

    /// Validate every firewall file under `root_directory`
    ///
    /// # Errors
    ///
    /// - [`ValidationError::Traversal`] if the directory cannot be listed or
    ///   a firewall file cannot be read as JSON
    /// - [`ValidationError::InvalidFiles`] with every recorded problem
    pub async fn validate(&self, root_directory: &Path) -> Result<ValidationReport, ValidationError> {
        info!("Starting firewall config validation");
        info!(directory = %root_directory.display(), "Config file path");

        let mut run = ValidationRun::default();

        let firewall_files = self.reader.list_config_files(root_directory).await.map_err(|e| {
            error!(directory = %root_directory.display(), error = %e, "Unable to list firewall files");
            ValidationError::Traversal(e.to_string())
        })?;
        run.metrics.number_of_firewalls = firewall_files.len() as u64;

        for firewall_file in &firewall_files {
            self.validate_firewall_file(firewall_file, &mut run).await?;
        }

        log_invalid_files(&run.invalid_files);
        if !run.invalid_files.is_empty() {
            error!("Validation failed: Invalid Files.");
            return Err(ValidationError::InvalidFiles(run.invalid_files));
        }

        debug!(metrics = ?run.metrics, "Send metrics");
        self.telemetry.report(&run.metrics).await;

        Ok(ValidationReport {
            metrics: run.metrics,
            files_checked: run.files_checked,
        })
    }

    async fn load<D: DeserializeOwned>(&self, path: &str) -> Result<D, LoadError> {
        let value = self
            .reader
            .parse_file(path)
            .await
            .map_err(LoadError::Unavailable)?;
        serde_json::from_value(value).map_err(|e| LoadError::Shape(e.to_string()))
    }

    async fn validate_firewall_file(
        &self,
        firewall_file: &str,
        run: &mut ValidationRun,
    ) -> Result<(), ValidationError> {
        info!(file = firewall_file, "Validating the file paths for the firewall file");

        let firewall: CreateFirewallRequest = match self.load(firewall_file).await {
            Ok(firewall) => firewall,
            Err(LoadError::Unavailable(e)) => {
                error!(file = firewall_file, error = %e, "Unable to parse firewall file");
                return Err(ValidationError::Traversal(e.to_string()));
            }
            Err(LoadError::Shape(message)) => {
                warn!(file = firewall_file, error = %message, "Firewall file has an invalid shape");
                run.files_checked += 1;
                run.record(InvalidFileRecord::new(firewall_file, message));
                return Ok(());
            }
        };
        run.files_checked += 1;

        if let Some(record) = check_firewall_name_and_policy(&firewall) {
            run.record(record);
        }

        let Some(policy_ref) = non_empty(firewall.firewall_policy_arn.as_deref()) else {
            run.record(InvalidFileRecord::new(UNKNOWN_POLICY, FILE_NOT_AVAILABLE));
            return Ok(());
        };

        let policy: CreateFirewallPolicyRequest = match self.load(policy_ref).await {
            Ok(policy) => policy,
            Err(LoadError::Unavailable(e)) => {
                info!(policy = policy_ref, error = %e, "Failed to validate the firewall policy");
                run.record(
                    InvalidFileRecord::new(policy_ref, FILE_NOT_AVAILABLE).referenced_in(policy_ref),
                );
                return Ok(());
            }
            Err(LoadError::Shape(message)) => {
                info!(policy = policy_ref, error = %message, "Firewall policy has an invalid shape");
                run.files_checked += 1;
                run.record(InvalidFileRecord::new(policy_ref, message).referenced_in(firewall_file));
                return Ok(());
            }
        };

        run.metrics.number_of_policies += 1;
        run.files_checked += 1;

        self.dry_run_policy(&policy, policy_ref, run).await;

        let body = policy.firewall_policy.as_ref();
        let stateful: Vec<Option<&str>> = body
            .map(|p| p.stateful_references())
            .unwrap_or(&[])
            .iter()
            .map(|r| r.resource_arn.as_deref())
            .collect();
        let stateless: Vec<Option<&str>> = body
            .map(|p| p.stateless_references())
            .unwrap_or(&[])
            .iter()
            .map(|r| r.resource_arn.as_deref())
            .collect();

        self.validate_rule_group_references(RuleGroupType::Stateful, &stateful, policy_ref, run)
            .await;
        self.validate_rule_group_references(RuleGroupType::Stateless, &stateless, policy_ref, run)
            .await;

        Ok(())
    }

    async fn validate_rule_group_references(
        &self,
        kind: RuleGroupType,
        references: &[Option<&str>],
        policy_ref: &str,
        run: &mut ValidationRun,
    ) {
        // Declared references count, resolved or not
        match kind {
            RuleGroupType::Stateful => {
                run.metrics.number_of_stateful_rule_groups += references.len() as u64
            }
            RuleGroupType::Stateless => {
                run.metrics.number_of_stateless_rule_groups += references.len() as u64
            }
        }
        debug!(
            rule_group_type = %kind,
            count = references.len(),
            policy = policy_ref,
            "Firewall policy rule group references"
        );

        for reference in references {
            let Some(path) = non_empty(*reference) else {
                run.record(
                    InvalidFileRecord::new(UNKNOWN_RULE_GROUP, FILE_NOT_AVAILABLE)
                        .referenced_in(policy_ref),
                );
                continue;
            };

            match self.load::<CreateRuleGroupRequest>(path).await {
                Ok(rule_group) => {
                    run.files_checked += 1;
                    if kind == RuleGroupType::Stateful && rule_group.rules_reference().is_some() {
                        run.metrics.number_of_suricata_rules += 1;
                    }
                    self.dry_run_rule_group(rule_group, path, run).await;
                }
                Err(LoadError::Unavailable(e)) => {
                    debug!(rule_group = path, error = %e, "Rule group file not available");
                    run.record(
                        InvalidFileRecord::new(path, FILE_NOT_AVAILABLE).referenced_in(policy_ref),
                    );
                }
                Err(LoadError::Shape(message)) => {
                    run.files_checked += 1;
                    run.record(InvalidFileRecord::new(path, message).referenced_in(policy_ref));
                }
            }
        }
    }

    async fn dry_run_policy(
        &self,
        policy: &CreateFirewallPolicyRequest,
        path: &str,
        run: &mut ValidationRun,
    ) {
        let request = CreateFirewallPolicyRequest {
            dry_run: Some(true),
            ..policy.clone()
        };

        match self.client.create_firewall_policy(&request).await {
            Ok(response) => {
                debug!(path = path, response = ?response, "Create firewall policy dry run passed")
            }
            Err(e) => record_structural(path, e, run),
        }
    }

    async fn dry_run_rule_group(
        &self,
        rule_group: CreateRuleGroupRequest,
        path: &str,
        run: &mut ValidationRun,
    ) {
        if rule_group.has_structured_rules() && rule_group.rules_reference().is_some() {
            debug!(path = path, "Rule group file has both Rules and RuleGroup fields");
            run.record(InvalidFileRecord::new(path, BOTH_RULE_FIELDS));
            return;
        }

        let mut request = CreateRuleGroupRequest {
            dry_run: Some(true),
            ..rule_group
        };

        if let Some(rules_path) = request.rules_reference().map(str::to_string) {
            match self.reader.read_raw_text(&rules_path).await {
                Some(text) if !text.is_empty() => request.rules = Some(text),
                _ => {
                    let error = format!("{}{}", INVALID_RULES_PATH, rules_path);
                    run.record(InvalidFileRecord::new(path, error));
                    return;
                }
            }
        }

        match self.client.create_rule_group(&request).await {
            Ok(response) => {
                debug!(path = path, response = ?response, "Create rule group dry run passed")
            }
            Err(e) => record_structural(path, e, run),
        }
    }
}

/// Record structural dry-run rejections and log the rest
fn record_structural(path: &str, err: RemoteError, run: &mut ValidationRun) {
    if err.is_structural() {
        let message = if err.message.is_empty() {
            err.to_string()
        } else {
            err.message
        };
        run.record(InvalidFileRecord::new(path, message));
    } else {
        debug!(
            path = path,
            kind = %err.kind,
            error = %err,
            request_id = ?err.request_id,
            "Ignoring non-structural dry run error"
        );
    }
}

fn log_invalid_files(records: &[InvalidFileRecord]) {
    info!(count = records.len(), "Number of invalid files");
    info!("-----------INVALID FILES START-----------");
    for record in records {
        error!(
            path = %record.path,
            referenced_in_file = ?record.referenced_in_file,
            error = %record.error,
            "Invalid file"
        );
    }
    info!("-----------INVALID FILES END--------------");
}
