use crate::args::ConfigArgs;
use crate::error::CliError;
use core::time::Duration;
use keel_core::EngineConfig;

impl ConfigArgs {
    /// Flags win over environment variables (clap resolves both); anything
    /// unset keeps the engine default.
    pub fn engine_config(&self) -> Result<EngineConfig, CliError> {
        let mut config = EngineConfig::new(
            self.url.clone().unwrap_or_default(),
            self.user.clone().unwrap_or_default(),
            self.password.clone().unwrap_or_default(),
        )?;

        if !self.schemas.is_empty() {
            config.schemas = self.schemas.clone();
        }
        if !self.locations.is_empty() {
            config.locations = self.locations.clone();
        }
        if let Some(table) = &self.table {
            config.table = table.clone();
        }
        if let Some(secs) = self.lock_timeout_secs {
            config.lock_timeout = Duration::from_secs(secs);
        }
        if let Some(installed_by) = &self.installed_by {
            config.installed_by = Some(installed_by.clone());
        }
        if let Some(v) = self.out_of_order {
            config.out_of_order = v;
        }
        if let Some(v) = self.validate_on_migrate {
            config.validate_on_migrate = v;
        }
        if let Some(v) = self.clean_disabled {
            config.clean_disabled = v;
        }
        if let Some(v) = self.baseline_on_migrate {
            config.baseline_on_migrate = v;
        }
        if let Some(version) = &self.baseline_version {
            config.baseline_version = version.clone();
        }

        config.validate()?;
        tracing::debug!(?config, "configuration resolved");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use crate::args::ConfigArgs;
    use core::time::Duration;
    use std::path::PathBuf;

    fn args() -> ConfigArgs {
        ConfigArgs {
            url: Some("postgres://localhost:5432/app".to_string()),
            user: Some("app".to_string()),
            password: Some("secret".to_string()),
            ..ConfigArgs::default()
        }
    }

    #[test]
    fn unset_options_keep_engine_defaults() {
        let config = args().engine_config().unwrap();
        assert_eq!(config.schemas, vec!["public"]);
        assert_eq!(config.locations, vec![PathBuf::from("db/migration")]);
        assert!(config.clean_disabled);
        assert!(config.validate_on_migrate);
    }

    #[test]
    fn flags_override_defaults() {
        let args = ConfigArgs {
            schemas: vec!["billing".to_string()],
            lock_timeout_secs: Some(5),
            clean_disabled: Some(false),
            out_of_order: Some(true),
            ..args()
        };

        let config = args.engine_config().unwrap();
        assert_eq!(config.history_schema(), "billing");
        assert_eq!(config.lock_timeout, Duration::from_secs(5));
        assert!(!config.clean_disabled);
        assert!(config.out_of_order);
    }

    #[test]
    fn largest_lock_timeout_is_accepted() {
        let args = ConfigArgs {
            lock_timeout_secs: Some(u64::MAX),
            ..args()
        };
        let config = args.engine_config().unwrap();
        assert_eq!(config.lock_timeout, Duration::from_secs(u64::MAX));
    }

    #[test]
    fn missing_password_is_a_user_error() {
        let args = ConfigArgs {
            password: None,
            ..args()
        };
        let err = args.engine_config().unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(err.action().unwrap().contains("DATABASE_PASSWORD"));
    }
}
