use log::warn;

use crate::common::errors::EnvironmentError;
use crate::config::RegenConfig;

/// Regenerating in production needs an explicit `force`; without it the
/// run is declined before anything is selected.
pub fn confirm_to_proceed(config: &RegenConfig, force: bool) -> Result<(), EnvironmentError> {
    if !config.is_production() || force {
        return Ok(());
    }
    warn!("Application in production; set REGENERATE_FORCE=true to regenerate anyway");
    Err(EnvironmentError::ConfirmationDeclined(config.app_env.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(app_env: &str) -> RegenConfig {
        RegenConfig::from_vars(vec![("REGEN_APP_ENV".to_string(), app_env.to_string())]).unwrap()
    }

    #[test]
    fn production_requires_force() {
        assert!(confirm_to_proceed(&config("production"), false).is_err());
        assert!(confirm_to_proceed(&config("production"), true).is_ok());
    }

    #[test]
    fn other_environments_proceed() {
        assert!(confirm_to_proceed(&config("local"), false).is_ok());
        assert!(confirm_to_proceed(&config("staging"), false).is_ok());
    }
}
