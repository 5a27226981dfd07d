use core::fmt;
use keel_core::{ConfigError, EngineError};
use keel_history::HistoryStoreError;
use keel_lock::LockError;
use keel_migration::ResolveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    UserError = 1,
    MigrationFailed = 2,
    LockUnavailable = 3,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Error shown to the operator: a title plus optional explanation blocks.
#[derive(Debug, Clone)]
pub struct CliError {
    code: ExitCode,
    title: String,
    reason: Option<String>,
    meaning: Option<String>,
    action: Option<String>,
}

impl CliError {
    fn new(code: ExitCode, title: impl Into<String>) -> Self {
        Self {
            code,
            title: title.into(),
            reason: None,
            meaning: None,
            action: None,
        }
    }

    pub fn user_error(title: impl Into<String>) -> Self {
        Self::new(ExitCode::UserError, title)
    }

    pub fn migration_failed(title: impl Into<String>) -> Self {
        Self::new(ExitCode::MigrationFailed, title)
    }

    pub fn lock_unavailable(title: impl Into<String>) -> Self {
        Self::new(ExitCode::LockUnavailable, title)
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_meaning(mut self, meaning: impl Into<String>) -> Self {
        self.meaning = Some(meaning.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn meaning(&self) -> Option<&str> {
        self.meaning.as_deref()
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn code(&self) -> ExitCode {
        self.code
    }

    pub fn exit_code(&self) -> i32 {
        self.code.as_i32()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let action = match &err {
            ConfigError::Missing { field: "url" } => "Pass --url or set DATABASE_URL.",
            ConfigError::Missing { field: "user" } => "Pass --user or set DATABASE_USERNAME.",
            ConfigError::Missing { field: "password" } => {
                "Pass --password or set DATABASE_PASSWORD."
            }
            _ => "Check the flags and KEEL_* environment variables.",
        };

        CliError::user_error("Invalid configuration")
            .with_reason(err.to_string())
            .with_action(action)
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Config(e) => e.into(),
            EngineError::Connect { message } => CliError::user_error("Database connection failed")
                .with_reason(message)
                .with_action("Check the database URL and credentials."),
            EngineError::Discovery(e) => CliError::user_error("Migration discovery failed")
                .with_reason(e.to_string())
                .with_meaning("No database changes were made.")
                .with_action("Fix the script names or contents in the configured locations."),
            EngineError::History(e @ HistoryStoreError::Corrupt { .. }) => {
                CliError::user_error("History table is not usable")
                    .with_reason(e.to_string())
                    .with_meaning("The table exists but does not have the expected columns.")
                    .with_action("Point --table at a fresh name or fix the table by hand.")
            }
            EngineError::History(e) => {
                CliError::migration_failed("History table access failed").with_reason(e.to_string())
            }
            EngineError::Resolve(ResolveError::PendingRepair {
                version,
                description,
            }) => CliError::user_error(format!("Migration {version} ({description}) previously failed"))
                .with_meaning("Its failed attempt is recorded, so no further migrations will run.")
                .with_action(
                    "Fix the script, undo any partial changes, then run `keel repair` and `keel migrate`.",
                ),
            EngineError::Resolve(ResolveError::OutOfOrder {
                version,
                highest_applied,
            }) => CliError::user_error(format!("Migration {version} is out of order"))
                .with_reason(format!(
                    "version {version} is lower than the highest applied version {highest_applied}"
                ))
                .with_action(format!(
                    "Renumber the script above {highest_applied}, or rerun with --out-of-order."
                )),
            EngineError::Validation { mismatches } => CliError::user_error("Validation failed")
                .with_reason(
                    mismatches
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("\n"),
                )
                .with_meaning("Applied migrations no longer match the scripts on disk.")
                .with_action(
                    "Restore the applied scripts and put new changes in a new version.",
                ),
            EngineError::Lock(e @ LockError::Timeout { .. }) => {
                CliError::lock_unavailable("Another migration process is currently running")
                    .with_reason(e.to_string())
                    .with_action("Wait for it to finish or raise --lock-timeout-secs.")
            }
            EngineError::Lock(e) => {
                CliError::lock_unavailable("Failed to acquire migration lock").with_reason(e.to_string())
            }
            EngineError::Executor(e) => CliError::migration_failed("Migration bookkeeping failed")
                .with_reason(e.to_string())
                .with_meaning("The history table may not reflect the last attempted migration.")
                .with_action("Run `keel info` before retrying."),
            EngineError::MigrationFailed { failed, applied } => {
                let reason = match (failed.statement_ordinal, &failed.statement) {
                    (Some(ordinal), Some(statement)) => {
                        format!("statement {ordinal}: {statement}\n{}", failed.message)
                    }
                    _ => failed.message.clone(),
                };
                let meaning = if failed.transactional {
                    format!(
                        "Its changes were rolled back. {} earlier migration(s) in this run stay applied.",
                        applied.len()
                    )
                } else {
                    "It ran without a transaction; statements before the failure stay applied."
                        .to_string()
                };

                CliError::migration_failed(format!(
                    "Migration failed at version {} ({})",
                    failed.version, failed.script
                ))
                .with_reason(reason)
                .with_meaning(meaning)
                .with_action("Fix the script, then run `keel repair` and `keel migrate`.")
            }
            EngineError::BaselineRefused { records } => CliError::user_error("Baseline refused")
                .with_reason(format!("history table already has {records} record(s)"))
                .with_meaning("Baseline only applies to a database without migration history."),
            EngineError::CleanDisabled => CliError::user_error("Clean is disabled")
                .with_meaning("Clean drops every configured schema.")
                .with_action("Pass --clean-disabled=false to allow it."),
            EngineError::Database { operation, message } => {
                CliError::user_error(format!("Database operation '{operation}' failed"))
                    .with_reason(message)
            }
        }
    }
}
