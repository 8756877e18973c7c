//! Settings loader implementation

use std::path::PathBuf;

use config::{Config, Environment, File};
use tracing::debug;

use crate::{
    error::{ConfigError, Result},
    types::DeploySettings,
    validation::validate_settings,
};

/// Default settings file, relative to the repository root
pub const DEFAULT_SETTINGS_FILE: &str = "panther_config.yml";

/// Environment prefix for setting overrides, e.g. `PANTHER__MONITORING__DEBUG=true`
pub const ENV_PREFIX: &str = "PANTHER";

/// Read-only source of deployment settings
pub trait SettingsProvider: Send + Sync {
    /// Load and validate settings
    fn load_settings(&self) -> Result<DeploySettings>;
}

/// Loads settings from a YAML file overlaid with environment variables
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    /// Settings file path
    path: PathBuf,
    /// Fail when the file is missing
    required: bool,
    /// Environment prefix
    env_prefix: String,
}

impl SettingsLoader {
    /// Loader for the default settings file; a missing file yields defaults
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SETTINGS_FILE),
            required: false,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Loader for an explicit settings file, which must exist
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: true,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Override the environment prefix
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Settings file this loader reads
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn load_error(&self, err: impl ToString) -> ConfigError {
        ConfigError::Load {
            path: self.path.display().to_string(),
            message: err.to_string(),
        }
    }
}

impl SettingsProvider for SettingsLoader {
    fn load_settings(&self) -> Result<DeploySettings> {
        debug!(path = %self.path.display(), "Loading deployment settings");

        let builder = Config::builder()
            .add_source(File::from(self.path.clone()).required(self.required))
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build().map_err(|e| self.load_error(e))?;
        let settings: DeploySettings = config.try_deserialize().map_err(|e| self.load_error(e))?;

        validate_settings(&settings)?;
        Ok(settings)
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}
