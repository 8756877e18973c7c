// AWS collaborators backed by the aws command line tool

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use panther_deploy_orchestration::{
    AccountIdentity, ExistingUser, OutputSet, ProvisioningClient, ProvisioningError, StackSpec,
    TableCatalog, UserDirectory,
};
use panther_deploy_process::{CommandOutput, CommandRunner, ProcessConfig, ProcessError};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{CliError, CliResult};

/// Lambda function serving the user management API
pub const USERS_API_FUNCTION: &str = "panther-users-api";

/// Glue databases whose table definitions feed the tables signature
pub const LOG_DATABASES: &[&str] = &[
    "panther_logs",
    "panther_cloudsecurity",
    "panther_rule_matches",
    "panther_rule_errors",
];

const CAPABILITIES: &[&str] = &[
    "CAPABILITY_AUTO_EXPAND",
    "CAPABILITY_IAM",
    "CAPABILITY_NAMED_IAM",
];

/// Error codes the aws tool prints when a resource is missing
const NOT_FOUND_MARKERS: &[&str] = &[
    "does not exist",
    "ResourceNotFoundException",
    "EntityNotFoundException",
];

fn classify(err: ProcessError) -> ProvisioningError {
    let stderr = err.stderr().trim();
    if NOT_FOUND_MARKERS.iter().any(|m| stderr.contains(m)) {
        ProvisioningError::NotFound(stderr.to_string())
    } else if stderr.is_empty() {
        ProvisioningError::Backend(err.to_string())
    } else {
        ProvisioningError::Backend(stderr.to_string())
    }
}

fn invalid_json(what: &str, err: serde_json::Error) -> ProvisioningError {
    ProvisioningError::Backend(format!("unexpected {} output: {}", what, err))
}

/// Talks to CloudFormation, Lambda, Glue and STS through `aws`
pub struct AwsCli {
    runner: Arc<dyn CommandRunner>,
    region: String,
    scratch_dir: PathBuf,
}

impl AwsCli {
    pub fn new(runner: Arc<dyn CommandRunner>, region: impl Into<String>) -> Self {
        Self {
            runner,
            region: region.into(),
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// Directory for Lambda response payloads
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn command(&self, service: &str, operation: &str) -> ProcessConfig {
        ProcessConfig::new("aws")
            .args([service, operation])
            .arg("--region")
            .arg(&self.region)
    }

    async fn run(&self, config: ProcessConfig) -> Result<CommandOutput, ProvisioningError> {
        self.runner.run(config).await.map_err(classify)
    }

    async fn glue_tables(&self, database: &str) -> Result<Vec<Value>, ProvisioningError> {
        let config = self
            .command("glue", "get-tables")
            .extend_args(["--database-name", database, "--output", "json"]);
        match self.run(config).await {
            Ok(output) => {
                let listing: TableListing = serde_json::from_str(&output.stdout)
                    .map_err(|e| invalid_json("glue get-tables", e))?;
                Ok(listing.table_list)
            }
            // The database is created by the log analysis stack itself
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

/// `aws cloudformation deploy` arguments for a stack request
pub fn deploy_args(stack: &StackSpec) -> Vec<String> {
    let mut args = vec![
        "--template-file".to_string(),
        stack.template.clone(),
        "--stack-name".to_string(),
        stack.stack_name().to_string(),
    ];
    if let Some(bucket) = &stack.artifact_bucket {
        args.push("--s3-bucket".to_string());
        args.push(bucket.clone());
    }
    args.push("--capabilities".to_string());
    args.extend(CAPABILITIES.iter().map(|c| c.to_string()));
    args.push("--no-fail-on-empty-changeset".to_string());

    if !stack.parameters.is_empty() {
        args.push("--parameter-overrides".to_string());
        args.extend(stack.parameters.iter().map(|(k, v)| format!("{}={}", k, v)));
    }
    args
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackOutput {
    output_key: String,
    #[serde(default)]
    output_value: String,
}

/// Parse `describe-stacks --query Stacks[0].Outputs` output
pub fn parse_stack_outputs(json: &str) -> Result<OutputSet, ProvisioningError> {
    let outputs: Option<Vec<StackOutput>> =
        serde_json::from_str(json).map_err(|e| invalid_json("describe-stacks", e))?;
    Ok(outputs
        .unwrap_or_default()
        .into_iter()
        .map(|o| (o.output_key, o.output_value))
        .collect())
}

#[derive(Debug, Deserialize)]
struct InvokeMetadata {
    #[serde(rename = "FunctionError", default)]
    function_error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListUsersOutput {
    #[serde(default)]
    users: Vec<UserRecord>,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    #[serde(default)]
    email: String,
}

/// Parse the users API response payload
pub fn parse_users(payload: &str) -> Result<Vec<ExistingUser>, ProvisioningError> {
    let output: ListUsersOutput =
        serde_json::from_str(payload).map_err(|e| invalid_json("users api", e))?;
    Ok(output
        .users
        .into_iter()
        .map(|u| ExistingUser { email: u.email })
        .collect())
}

#[derive(Debug, Deserialize)]
struct TableListing {
    #[serde(rename = "TableList", default)]
    table_list: Vec<Value>,
}

/// Stable digest over table names and column layouts.
///
/// Volatile fields such as update timestamps are ignored so only a schema
/// change moves the signature.
pub fn tables_signature(databases: &[(String, Vec<Value>)]) -> String {
    let mut entries: Vec<String> = databases
        .iter()
        .flat_map(|(database, tables)| {
            tables.iter().map(move |table| {
                let name = table.get("Name").and_then(Value::as_str).unwrap_or_default();
                let columns = table
                    .pointer("/StorageDescriptor/Columns")
                    .cloned()
                    .unwrap_or(Value::Null);
                let partitions = table.get("PartitionKeys").cloned().unwrap_or(Value::Null);
                format!("{}.{}:{}:{}", database, name, columns, partitions)
            })
        })
        .collect();
    entries.sort();

    let mut hasher = Sha256::new();
    for entry in &entries {
        hasher.update(entry.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl ProvisioningClient for AwsCli {
    async fn deploy_template(&self, stack: &StackSpec) -> Result<OutputSet, ProvisioningError> {
        let name = stack.stack_name();
        let config = self.command("cloudformation", "deploy").extend_args(deploy_args(stack));

        self.runner
            .run(config)
            .await
            .map_err(|e| ProvisioningError::Rejected {
                stack: name.to_string(),
                message: if e.stderr().trim().is_empty() {
                    e.to_string()
                } else {
                    e.stderr().trim().to_string()
                },
            })?;

        self.stack_outputs(name).await
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<(), ProvisioningError> {
        info!(stack = %stack_name, "deleting stack");
        let delete = self
            .command("cloudformation", "delete-stack")
            .extend_args(["--stack-name", stack_name]);
        let wait = self
            .command("cloudformation", "wait")
            .extend_args(["stack-delete-complete", "--stack-name", stack_name]);

        for config in [delete, wait] {
            match self.run(config).await {
                Ok(_) => {}
                Err(e) if e.is_not_found() => {
                    debug!(stack = %stack_name, "stack already gone");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn stack_outputs(&self, stack_name: &str) -> Result<OutputSet, ProvisioningError> {
        let config = self.command("cloudformation", "describe-stacks").extend_args([
            "--stack-name",
            stack_name,
            "--query",
            "Stacks[0].Outputs",
            "--output",
            "json",
        ]);
        let output = self.run(config).await?;
        parse_stack_outputs(&output.stdout)
    }
}

#[async_trait]
impl UserDirectory for AwsCli {
    async fn list_users(&self) -> Result<Vec<ExistingUser>, ProvisioningError> {
        let payload_path = self
            .scratch_dir
            .join(format!("panther-list-users-{}.json", std::process::id()));
        let config = self.command("lambda", "invoke").extend_args([
            "--function-name".to_string(),
            USERS_API_FUNCTION.to_string(),
            "--cli-binary-format".to_string(),
            "raw-in-base64-out".to_string(),
            "--payload".to_string(),
            r#"{"listUsers":{}}"#.to_string(),
            "--output".to_string(),
            "json".to_string(),
            payload_path.display().to_string(),
        ]);

        let output = self.run(config).await?;
        let payload = tokio::fs::read_to_string(&payload_path)
            .await
            .map_err(|e| ProvisioningError::Backend(format!("users api payload: {}", e)));
        let _ = tokio::fs::remove_file(&payload_path).await;
        let payload = payload?;

        let metadata: InvokeMetadata =
            serde_json::from_str(&output.stdout).map_err(|e| invalid_json("lambda invoke", e))?;
        if let Some(kind) = metadata.function_error {
            return Err(ProvisioningError::Backend(format!(
                "{} returned {} error: {}",
                USERS_API_FUNCTION, kind, payload
            )));
        }
        parse_users(&payload)
    }
}

#[async_trait]
impl TableCatalog for AwsCli {
    async fn deployed_tables_signature(&self) -> Result<String, ProvisioningError> {
        let mut databases = Vec::with_capacity(LOG_DATABASES.len());
        for database in LOG_DATABASES {
            databases.push((database.to_string(), self.glue_tables(database).await?));
        }
        Ok(tables_signature(&databases))
    }
}

#[async_trait]
impl AccountIdentity for AwsCli {
    async fn account_id(&self) -> Result<String, ProvisioningError> {
        let config = self
            .command("sts", "get-caller-identity")
            .extend_args(["--query", "Account", "--output", "text"]);
        let output = self.run(config).await?;
        Ok(output.stdout_trimmed().to_string())
    }
}

/// Region from the flag, then the environment, then the aws profile
pub async fn resolve_region(flag: Option<String>, runner: &dyn CommandRunner) -> CliResult<String> {
    let from_env = ["AWS_REGION", "AWS_DEFAULT_REGION"]
        .iter()
        .find_map(|key| std::env::var(key).ok());

    if let Some(region) = flag.or(from_env).filter(|r| !r.trim().is_empty()) {
        return Ok(region.trim().to_string());
    }

    let output = runner
        .run(ProcessConfig::new("aws").args(["configure", "get", "region"]))
        .await
        .map_err(|e| CliError::Region(e.to_string()))?;
    let region = output.stdout_trimmed();
    if region.is_empty() {
        return Err(CliError::Region("no region configured".to_string()));
    }
    Ok(region.to_string())
}
