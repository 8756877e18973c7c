// CLI error types

use panther_deploy_config::ConfigError;
use panther_deploy_orchestration::DeployError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Could not determine the AWS region: {0}")]
    Region(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            CliError::Region(msg) => {
                format!(
                    "Could not determine the AWS region: {}\n\nPass --region or set AWS_REGION.",
                    msg
                )
            }
            CliError::Config(e) => {
                format!("Configuration error: {}\n\nCheck panther_config.yml.", e)
            }
            CliError::Deploy(DeployError::UnknownStack(name)) => {
                format!(
                    "unknown stack '{}'\n\nSTACK accepts a stack name such as 'core' or 'panther-web'.",
                    name
                )
            }
            CliError::Deploy(e) => e.to_string(),
            CliError::Io(e) => format!("File operation failed: {}", e),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deploy_errors_pass_through() {
        let err = CliError::from(DeployError::UnsupportedRegion("us-west-1".into()));
        assert_eq!(err.user_message(), "panther is not supported in us-west-1 region");
    }

    #[test]
    fn test_unknown_stack_suggests_names() {
        let err = CliError::from(DeployError::UnknownStack("webb".into()));
        assert!(err.user_message().contains("'core'"));
    }

    #[test]
    fn test_region_error_points_at_flag() {
        let err = CliError::Region("no profile region".into());
        assert_eq!(
            err.user_message(),
            "Could not determine the AWS region: no profile region\n\nPass --region or set AWS_REGION."
        );
    }

    #[test]
    fn test_config_errors_point_at_settings_file() {
        let err = CliError::from(ConfigError::Validation("bad email".into()));
        assert!(err.user_message().starts_with("Configuration error: Validation error: bad email"));
        assert!(err.user_message().ends_with("Check panther_config.yml."));
    }
}
