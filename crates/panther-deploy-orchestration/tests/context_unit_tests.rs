//! Environment lookups for the deployment context.
//!
//! CUSTOM_RESOURCE_VERSION is process-wide, so every case touching it lives
//! in the single test below, inside this file's own test binary.

use panther_deploy_orchestration::{
    custom_resource_override_from_env, custom_resource_version, GitVersion,
    CUSTOM_RESOURCE_VERSION_ENV,
};

/// Restores the variable's previous value when dropped
struct EnvGuard {
    previous: Option<String>,
}

impl EnvGuard {
    fn new() -> Self {
        Self {
            previous: std::env::var(CUSTOM_RESOURCE_VERSION_ENV).ok(),
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.previous {
            Some(value) => std::env::set_var(CUSTOM_RESOURCE_VERSION_ENV, value),
            None => std::env::remove_var(CUSTOM_RESOURCE_VERSION_ENV),
        }
    }
}

#[test]
fn test_custom_resource_override_from_env() {
    let _guard = EnvGuard::new();

    std::env::set_var(CUSTOM_RESOURCE_VERSION_ENV, " force-2024.10 ");
    let value = custom_resource_override_from_env();
    assert_eq!(value.as_deref(), Some(" force-2024.10 "));
    assert_eq!(
        custom_resource_version(value.as_deref(), &GitVersion::new("v1.2.3-4-gabc")),
        " force-2024.10 "
    );

    std::env::set_var(CUSTOM_RESOURCE_VERSION_ENV, "");
    assert_eq!(custom_resource_override_from_env(), None);

    std::env::remove_var(CUSTOM_RESOURCE_VERSION_ENV);
    assert_eq!(custom_resource_override_from_env(), None);
    assert_eq!(
        custom_resource_version(
            custom_resource_override_from_env().as_deref(),
            &GitVersion::new("v1.2.3-4-gabc")
        ),
        "v1.2.3"
    );
}
