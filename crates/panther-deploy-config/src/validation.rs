//! Settings and input validation

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{ConfigError, Result},
    types::DeploySettings,
};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));

const MIN_LAMBDA_MEMORY_MB: u32 = 128;
const MAX_LAMBDA_MEMORY_MB: u32 = 10240;
const TRACING_MODES: &[&str] = &["", "Active", "PassThrough"];

/// Reject blank input
pub fn non_empty(input: &str) -> std::result::Result<(), String> {
    if input.trim().is_empty() {
        Err("input is blank".to_string())
    } else {
        Ok(())
    }
}

/// Reject anything that does not look like an email address
pub fn email(input: &str) -> std::result::Result<(), String> {
    if EMAIL.is_match(input.trim()) {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid email address", input.trim()))
    }
}

/// Check the loaded settings for values the backend would reject later
pub fn validate_settings(settings: &DeploySettings) -> Result<()> {
    if settings.monitoring.cloudwatch_log_retention_days == 0 {
        return Err(ConfigError::Validation(
            "monitoring.cloudwatch_log_retention_days must be greater than 0".to_string(),
        ));
    }

    let memory = settings.infra.log_processor_lambda_memory_size;
    if !(MIN_LAMBDA_MEMORY_MB..=MAX_LAMBDA_MEMORY_MB).contains(&memory) {
        return Err(ConfigError::Validation(format!(
            "infra.log_processor_lambda_memory_size must be between {} and {} MB, found {}",
            MIN_LAMBDA_MEMORY_MB, MAX_LAMBDA_MEMORY_MB, memory
        )));
    }

    if !TRACING_MODES.contains(&settings.monitoring.tracing_mode.as_str()) {
        return Err(ConfigError::Validation(format!(
            "monitoring.tracing_mode must be one of Active, PassThrough or empty, found '{}'",
            settings.monitoring.tracing_mode
        )));
    }

    let first_user = &settings.setup.first_user;
    if first_user.is_set() {
        email(&first_user.email).map_err(ConfigError::Validation)?;
    }

    Ok(())
}
