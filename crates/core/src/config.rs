use core::fmt;
use core::str::FromStr;
use core::time::Duration;
use keel_history::{validate_ident, DEFAULT_TABLE};
use keel_migration::Version;
use sqlx::postgres::PgConnectOptions;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_LOCATION: &str = "db/migration";
pub const DEFAULT_BASELINE_DESCRIPTION: &str = "<< Baseline >>";
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("invalid database url: {message}")]
    InvalidUrl { message: String },
    #[error("at least one {field} entry is required")]
    Empty { field: &'static str },
    #[error("invalid {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Everything the engine needs for one run. Built by the caller; nothing
/// here reads the environment.
#[derive(Clone)]
pub struct EngineConfig {
    pub url: String,
    pub user: String,
    pub password: String,
    /// The first schema holds the history table and names the run lock.
    pub schemas: Vec<String>,
    pub locations: Vec<PathBuf>,
    pub table: String,
    pub validate_on_migrate: bool,
    pub clean_disabled: bool,
    pub baseline_on_migrate: bool,
    pub baseline_version: Version,
    pub baseline_description: String,
    pub out_of_order: bool,
    pub lock_timeout: Duration,
    /// Defaults to the database's `current_user`.
    pub installed_by: Option<String>,
}

impl EngineConfig {
    /// Connection target plus defaults for every other option.
    pub fn new(
        url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let url = required("url", url.into())?;
        let user = required("user", user.into())?;
        let password = required("password", password.into())?;

        Ok(Self {
            url,
            user,
            password,
            schemas: vec![DEFAULT_SCHEMA.to_string()],
            locations: vec![PathBuf::from(DEFAULT_LOCATION)],
            table: DEFAULT_TABLE.to_string(),
            validate_on_migrate: true,
            clean_disabled: true,
            baseline_on_migrate: false,
            baseline_version: Version::parse("1").map_err(|e| ConfigError::Invalid {
                field: "baseline_version",
                message: e.to_string(),
            })?,
            baseline_description: DEFAULT_BASELINE_DESCRIPTION.to_string(),
            out_of_order: false,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            installed_by: None,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        required("url", self.url.clone())?;
        required("user", self.user.clone())?;
        required("password", self.password.clone())?;

        if self.schemas.is_empty() {
            return Err(ConfigError::Empty { field: "schemas" });
        }
        if self.locations.is_empty() {
            return Err(ConfigError::Empty { field: "locations" });
        }

        for schema in &self.schemas {
            validate_ident(schema).map_err(|e| ConfigError::Invalid {
                field: "schemas",
                message: e.to_string(),
            })?;
        }
        validate_ident(&self.table).map_err(|e| ConfigError::Invalid {
            field: "table",
            message: e.to_string(),
        })?;

        self.connect_options().map(|_| ())
    }

    pub fn history_schema(&self) -> &str {
        self.schemas.first().map(String::as_str).unwrap_or(DEFAULT_SCHEMA)
    }

    /// Accepts `postgres://` URLs and JDBC-style `jdbc:postgresql://` URLs.
    /// `user` and `password` override credentials embedded in the URL.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        let url = self.url.strip_prefix("jdbc:").unwrap_or(&self.url);

        let options = PgConnectOptions::from_str(url).map_err(|e| ConfigError::InvalidUrl {
            message: e.to_string(),
        })?;

        Ok(options
            .username(&self.user)
            .password(&self.password)
            .application_name("keel")
            .options([("search_path", self.schemas.join(","))]))
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("schemas", &self.schemas)
            .field("locations", &self.locations)
            .field("table", &self.table)
            .field("validate_on_migrate", &self.validate_on_migrate)
            .field("clean_disabled", &self.clean_disabled)
            .field("baseline_on_migrate", &self.baseline_on_migrate)
            .field("baseline_version", &self.baseline_version)
            .field("out_of_order", &self.out_of_order)
            .field("lock_timeout", &self.lock_timeout)
            .finish_non_exhaustive()
    }
}

fn required(field: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing { field });
    }
    Ok(value)
}
