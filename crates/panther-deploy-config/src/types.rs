//! Deployment settings types
//!
//! Mirrors the layout of `panther_config.yml`. Every section and field has a
//! default so a partial settings file (or none at all) still deserializes.

use serde::{Deserialize, Serialize};

/// Top-level deployment settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct DeploySettings {
    /// Account bootstrap options
    pub setup: SetupConfig,
    /// Alarms, logging and tracing
    pub monitoring: MonitoringConfig,
    /// Web application options
    pub web: WebConfig,
    /// Lambda infrastructure options
    pub infra: InfraConfig,
}

/// Options applied while setting up the account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SetupConfig {
    /// Onboard this account as a cloud-security source
    pub onboard_self: bool,
    /// Enable CloudTrail when onboarding self
    pub enable_cloud_trail: bool,
    /// Enable GuardDuty when onboarding self
    pub enable_guard_duty: bool,
    /// Enable S3 access logging on created buckets
    pub enable_s3_access_logs: bool,
    /// Existing bucket to receive S3 access logs
    pub s3_access_logs_bucket: String,
    /// Bucket receiving a replica of processed data
    pub data_replication_bucket: String,
    /// Principals allowed to subscribe to processed logs
    pub log_subscriptions: LogSubscriptions,
    /// Company branding used in alerts
    pub company: Company,
    /// Analysis packs installed on first deploy
    pub initial_analysis_sets: Vec<String>,
    /// Initial admin user; empty means "resolve at deploy time"
    pub first_user: FirstUser,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            onboard_self: true,
            enable_cloud_trail: false,
            enable_guard_duty: false,
            enable_s3_access_logs: true,
            s3_access_logs_bucket: String::new(),
            data_replication_bucket: String::new(),
            log_subscriptions: LogSubscriptions::default(),
            company: Company::default(),
            initial_analysis_sets: vec![
                "https://github.com/panther-labs/panther-analysis/releases/latest/download/panther-analysis-all.zip"
                    .to_string(),
            ],
            first_user: FirstUser::default(),
        }
    }
}

/// Log subscription principals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct LogSubscriptions {
    /// IAM principal ARNs
    pub principal_arns: Vec<String>,
}

/// Company branding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Company {
    pub display_name: String,
    pub email: String,
}

/// Identity of the first admin user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct FirstUser {
    pub given_name: String,
    pub family_name: String,
    pub email: String,
}

impl FirstUser {
    /// A first user is considered configured once an email is present
    pub fn is_set(&self) -> bool {
        !self.email.trim().is_empty()
    }
}

/// Monitoring options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MonitoringConfig {
    /// SNS topic for CloudWatch alarms (created when empty)
    pub alarm_sns_topic_arn: String,
    /// Retention for every CloudWatch log group
    pub cloudwatch_log_retention_days: u32,
    /// Verbose Lambda logging
    pub debug: bool,
    /// X-Ray tracing mode: empty, `Active` or `PassThrough`
    pub tracing_mode: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            alarm_sns_topic_arn: String::new(),
            cloudwatch_log_retention_days: 365,
            debug: false,
            tracing_mode: String::new(),
        }
    }
}

/// Web application options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct WebConfig {
    /// Custom domain for the load balancer
    pub custom_domain: String,
    /// ACM certificate for the custom domain
    pub certificate_arn: String,
}

/// Lambda infrastructure options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InfraConfig {
    /// Comma-separated layer ARNs attached to every function
    pub base_layer_version_arns: String,
    /// Pre-built python layer; when empty the layer is built from `pip_layer`
    pub python_layer_version_arn: String,
    /// Python libraries packaged into the analysis layer
    pub pip_layer: Vec<String>,
    /// Memory for the log processor function (MB)
    pub log_processor_lambda_memory_size: u32,
}

impl Default for InfraConfig {
    fn default() -> Self {
        Self {
            base_layer_version_arns: String::new(),
            python_layer_version_arn: String::new(),
            pip_layer: vec![
                "policyuniverse==1.3.2.2".to_string(),
                "requests==2.23.0".to_string(),
            ],
            log_processor_lambda_memory_size: 1024,
        }
    }
}
