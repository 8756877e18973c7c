//! Resolution of the first admin user
//!
//! Settings win. Otherwise an existing deployment with users keeps the field
//! blank. Only when both are empty is the operator asked.

use async_trait::async_trait;
use panther_deploy_config::{validation, DeploySettings, FirstUser};
use tracing::{debug, info};

use crate::{
    error::{DeployError, Result},
    provisioning::UserDirectory,
};

/// Validates one line of operator input
pub type Validator = fn(&str) -> std::result::Result<(), String>;

/// Asks the operator questions.
///
/// Waiting for an answer can take minutes, so implementations reading a
/// terminal must not block the async runtime while they wait.
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Ask until `validator` accepts the answer; returns the trimmed answer
    async fn prompt(&self, question: &str, validator: Validator) -> Result<String>;

    /// Show a line of text without expecting input
    fn say(&self, message: &str);
}

/// Where the first user came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstUserResolution {
    /// Already present in the settings file
    FromSettings,
    /// The deployment already has this many users; left blank
    ExistingUsers(usize),
    /// Entered by the operator
    Prompted,
}

pub async fn resolve_first_user(
    settings: &mut DeploySettings,
    users: &dyn UserDirectory,
    prompter: &dyn Prompter,
) -> Result<FirstUserResolution> {
    if settings.setup.first_user.is_set() {
        debug!("first user taken from settings");
        return Ok(FirstUserResolution::FromSettings);
    }

    let existing = match users.list_users().await {
        Ok(users) => users,
        Err(e) if e.is_not_found() => {
            debug!("user service not deployed yet, treating as no users");
            Vec::new()
        }
        Err(e) => {
            return Err(DeployError::Lookup(format!(
                "failed to list existing users: {}",
                e
            )))
        }
    };

    if !existing.is_empty() {
        info!(users = existing.len(), "users already exist, not setting a first user");
        return Ok(FirstUserResolution::ExistingUsers(existing.len()));
    }

    prompter.say("Who will be the initial Panther admin user?");
    let given_name = prompter.prompt("First name: ", validation::non_empty).await?;
    let family_name = prompter.prompt("Last name: ", validation::non_empty).await?;
    let email = prompter.prompt("Email: ", validation::email).await?;

    settings.setup.first_user = FirstUser {
        given_name,
        family_name,
        email,
    };
    Ok(FirstUserResolution::Prompted)
}
