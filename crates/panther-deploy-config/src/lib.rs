//! Panther deployment settings
//!
//! Loads `panther_config.yml` (overlaid with `PANTHER__*` environment
//! variables), validates it, and exposes it read-only to the orchestrator.

pub mod error;
pub mod manager;
pub mod types;
pub mod validation;

pub use error::{ConfigError, Result};
pub use manager::{SettingsLoader, SettingsProvider, DEFAULT_SETTINGS_FILE, ENV_PREFIX};
pub use types::{
    Company, DeploySettings, FirstUser, InfraConfig, LogSubscriptions, MonitoringConfig,
    SetupConfig, WebConfig,
};
pub use validation::validate_settings;
