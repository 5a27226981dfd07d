use crate::config::ConfigError;
use keel_executor::{ExecutorError, FailedMigration};
use keel_history::HistoryStoreError;
use keel_lock::LockError;
use keel_migration::{DiscoveryError, Mismatch, ResolveError, Version};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to connect to database: {message}")]
    Connect { message: String },

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    History(#[from] HistoryStoreError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("validation failed with {} mismatch(es): {}", mismatches.len(), summarize(mismatches))]
    Validation { mismatches: Vec<Mismatch> },

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("migration {} failed: {}", failed.version, failed.message)]
    MigrationFailed {
        failed: Box<FailedMigration>,
        applied: Vec<Version>,
    },

    #[error("baseline refused: history table already has {records} record(s)")]
    BaselineRefused { records: usize },

    #[error("clean is disabled")]
    CleanDisabled,

    #[error("database operation '{operation}' failed: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },
}

impl EngineError {
    pub(crate) fn database(operation: &'static str, err: sqlx::Error) -> Self {
        EngineError::Database {
            operation,
            message: err.to_string(),
        }
    }
}

fn summarize(mismatches: &[Mismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
