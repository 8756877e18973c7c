//! Per-stack parameter maps
//!
//! Every function here is pure: settings and upstream outputs in, a
//! string-typed parameter map out. Upstream keys that are missing become
//! empty strings and the backend decides whether that is acceptable.

use panther_deploy_config::DeploySettings;

use crate::{
    context::DeploymentContext,
    models::{OutputSet, Parameters},
};

fn params<const N: usize>(pairs: [(&str, String); N]) -> Parameters {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn https(endpoint: &str) -> String {
    format!("https://{}", endpoint)
}

/// Builds the parameter map for each stack from a deployment context
pub struct ParameterAssembler<'a> {
    ctx: &'a DeploymentContext,
}

impl<'a> ParameterAssembler<'a> {
    pub fn new(ctx: &'a DeploymentContext) -> Self {
        Self { ctx }
    }

    fn settings(&self) -> &DeploySettings {
        self.ctx.settings()
    }

    fn retention_days(&self) -> String {
        self.settings().monitoring.cloudwatch_log_retention_days.to_string()
    }

    fn debug(&self) -> String {
        self.settings().monitoring.debug.to_string()
    }

    fn tracing_mode(&self) -> String {
        self.settings().monitoring.tracing_mode.clone()
    }

    fn layer_arns(&self) -> String {
        self.settings().infra.base_layer_version_arns.clone()
    }

    /// Bootstrap reads settings only
    pub fn bootstrap(&self) -> Parameters {
        let s = self.settings();
        params([
            ("AccessLogsBucket", s.setup.s3_access_logs_bucket.clone()),
            ("AlarmTopicArn", s.monitoring.alarm_sns_topic_arn.clone()),
            ("CloudWatchLogRetentionDays", self.retention_days()),
            ("CustomDomain", s.web.custom_domain.clone()),
            ("DataReplicationBucket", s.setup.data_replication_bucket.clone()),
            ("Debug", self.debug()),
            ("DeployFromSource", "true".to_string()),
            ("EnableS3AccessLogs", s.setup.enable_s3_access_logs.to_string()),
            (
                "LogSubscriptionPrincipals",
                s.setup.log_subscriptions.principal_arns.join(","),
            ),
            ("TracingMode", self.tracing_mode()),
        ])
    }

    pub fn gateway(&self, outputs: &OutputSet) -> Parameters {
        params([
            ("AlarmTopicArn", outputs.get("AlarmTopicArn").to_string()),
            ("AthenaResultsBucket", outputs.get("AthenaResultsBucket").to_string()),
            ("AuditLogsBucket", outputs.get("AuditLogsBucket").to_string()),
            ("CloudWatchLogRetentionDays", self.retention_days()),
            ("CustomResourceVersion", self.ctx.custom_resource_version()),
            ("ImageRegistryName", outputs.get("ImageRegistryName").to_string()),
            ("LayerVersionArns", self.layer_arns()),
            ("ProcessedDataBucket", outputs.get("ProcessedDataBucket").to_string()),
            (
                "PythonLayerVersionArn",
                self.settings().infra.python_layer_version_arn.clone(),
            ),
            ("TracingMode", self.tracing_mode()),
            ("UserPoolId", outputs.get("UserPoolId").to_string()),
        ])
    }

    pub fn appsync(&self, outputs: &OutputSet) -> Parameters {
        params([
            ("AlarmTopicArn", outputs.get("AlarmTopicArn").to_string()),
            ("AnalysisApi", https(outputs.get("AnalysisApiEndpoint"))),
            ("ApiId", outputs.get("GraphQLApiId").to_string()),
            ("ComplianceApi", https(outputs.get("ComplianceApiEndpoint"))),
            ("CustomResourceVersion", self.ctx.custom_resource_version()),
            ("RemediationApi", https(outputs.get("RemediationApiEndpoint"))),
            ("ResourcesApi", https(outputs.get("ResourcesApiEndpoint"))),
            ("ServiceRole", outputs.get("AppsyncServiceRoleArn").to_string()),
        ])
    }

    pub fn cloud_security(&self, outputs: &OutputSet) -> Parameters {
        params([
            ("AlarmTopicArn", outputs.get("AlarmTopicArn").to_string()),
            ("AnalysisApiId", outputs.get("AnalysisApiId").to_string()),
            ("CloudWatchLogRetentionDays", self.retention_days()),
            ("ComplianceApiId", outputs.get("ComplianceApiId").to_string()),
            ("CustomResourceVersion", self.ctx.custom_resource_version()),
            ("Debug", self.debug()),
            ("LayerVersionArns", self.layer_arns()),
            ("ProcessedDataBucket", outputs.get("ProcessedDataBucket").to_string()),
            ("ProcessedDataTopicArn", outputs.get("ProcessedDataTopicArn").to_string()),
            ("PythonLayerVersionArn", outputs.get("PythonLayerVersionArn").to_string()),
            ("RemediationApiId", outputs.get("RemediationApiId").to_string()),
            ("ResourcesApiId", outputs.get("ResourcesApiId").to_string()),
            ("SqsKeyId", outputs.get("QueueEncryptionKeyId").to_string()),
            ("TracingMode", self.tracing_mode()),
        ])
    }

    pub fn core(&self, outputs: &OutputSet) -> Parameters {
        let s = self.settings();
        params([
            ("AlarmTopicArn", outputs.get("AlarmTopicArn").to_string()),
            ("AnalysisApiEndpoint", outputs.get("AnalysisApiEndpoint").to_string()),
            ("AnalysisApiId", outputs.get("AnalysisApiId").to_string()),
            ("AnalysisVersionsBucket", outputs.get("AnalysisVersionsBucket").to_string()),
            ("AppDomainURL", outputs.get("LoadBalancerUrl").to_string()),
            ("AthenaResultsBucket", outputs.get("AthenaResultsBucket").to_string()),
            ("CloudWatchLogRetentionDays", self.retention_days()),
            ("CompanyDisplayName", s.setup.company.display_name.clone()),
            ("CompanyEmail", s.setup.company.email.clone()),
            ("ComplianceApiId", outputs.get("ComplianceApiId").to_string()),
            ("CustomResourceVersion", self.ctx.custom_resource_version()),
            ("Debug", self.debug()),
            ("DynamoScalingRoleArn", outputs.get("DynamoScalingRoleArn").to_string()),
            ("InitialAnalysisPackUrls", s.setup.initial_analysis_sets.join(",")),
            ("LayerVersionArns", self.layer_arns()),
            ("OutputsKeyId", outputs.get("OutputsEncryptionKeyId").to_string()),
            ("ProcessedDataBucket", outputs.get("ProcessedDataBucket").to_string()),
            ("SqsKeyId", outputs.get("QueueEncryptionKeyId").to_string()),
            ("TracingMode", self.tracing_mode()),
            ("UserPoolId", outputs.get("UserPoolId").to_string()),
        ])
    }

    /// Dashboards take no parameters
    pub fn dashboards(&self) -> Parameters {
        Parameters::new()
    }

    /// `tables_signature` forces the catalog updater to run when tables drifted
    pub fn log_analysis(&self, outputs: &OutputSet, tables_signature: &str) -> Parameters {
        params([
            ("AlarmTopicArn", outputs.get("AlarmTopicArn").to_string()),
            ("AnalysisApiId", outputs.get("AnalysisApiId").to_string()),
            ("AthenaResultsBucket", outputs.get("AthenaResultsBucket").to_string()),
            ("CloudWatchLogRetentionDays", self.retention_days()),
            ("CustomResourceVersion", self.ctx.custom_resource_version()),
            ("Debug", self.debug()),
            ("LayerVersionArns", self.layer_arns()),
            (
                "LogProcessorLambdaMemorySize",
                self.settings().infra.log_processor_lambda_memory_size.to_string(),
            ),
            ("ProcessedDataBucket", outputs.get("ProcessedDataBucket").to_string()),
            ("ProcessedDataTopicArn", outputs.get("ProcessedDataTopicArn").to_string()),
            ("PythonLayerVersionArn", outputs.get("PythonLayerVersionArn").to_string()),
            ("SqsKeyId", outputs.get("QueueEncryptionKeyId").to_string()),
            ("TablesSignature", tables_signature.to_string()),
            ("TracingMode", self.tracing_mode()),
        ])
    }

    pub fn onboard(&self, outputs: &OutputSet) -> Parameters {
        let setup = &self.settings().setup;
        params([
            ("AlarmTopicArn", outputs.get("AlarmTopicArn").to_string()),
            ("AuditLogsBucket", outputs.get("AuditLogsBucket").to_string()),
            ("CustomResourceVersion", self.ctx.custom_resource_version()),
            ("EnableCloudTrail", setup.enable_cloud_trail.to_string()),
            ("EnableGuardDuty", setup.enable_guard_duty.to_string()),
            ("EnableS3AccessLogs", setup.enable_s3_access_logs.to_string()),
        ])
    }

    /// Web server parameters; `image` is the published frontend image URI
    pub fn frontend(&self, outputs: &OutputSet, image: &str) -> Parameters {
        let s = self.settings();
        let user = &s.setup.first_user;
        params([
            ("AlarmTopicArn", outputs.get("AlarmTopicArn").to_string()),
            ("AppClientId", outputs.get("AppClientId").to_string()),
            ("CertificateArn", s.web.certificate_arn.clone()),
            ("CloudWatchLogRetentionDays", self.retention_days()),
            ("ElbArn", outputs.get("LoadBalancerArn").to_string()),
            ("ElbFullName", outputs.get("LoadBalancerFullName").to_string()),
            ("ElbTargetGroup", outputs.get("LoadBalancerTargetGroup").to_string()),
            ("FirstUserEmail", user.email.clone()),
            ("FirstUserFamilyName", user.family_name.clone()),
            ("FirstUserGivenName", user.given_name.clone()),
            ("GraphQLApiEndpoint", outputs.get("GraphQLApiEndpoint").to_string()),
            ("Image", image.to_string()),
            ("PantherVersion", self.ctx.version.to_string()),
            ("SecurityGroup", outputs.get("WebSecurityGroup").to_string()),
            ("SubnetOneId", outputs.get("SubnetOneId").to_string()),
            ("SubnetTwoId", outputs.get("SubnetTwoId").to_string()),
            ("UserPoolId", outputs.get("UserPoolId").to_string()),
        ])
    }
}
