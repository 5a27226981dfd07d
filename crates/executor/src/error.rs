use keel_migration::Version;
use thiserror::Error;

/// Failures of the executor's own bookkeeping. A migration whose statements
/// fail is not an error here; it is recorded and reported in the
/// [`crate::ExecutionReport`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("transaction begin failed (version={version}): {message}")]
    TransactionBeginFailed { version: Version, message: String },
    #[error("transaction rollback failed (version={version}): {message}; original_error={original_error}")]
    TransactionRollbackFailed {
        version: Version,
        message: String,
        original_error: String,
    },
    #[error("history write failed (version={version}): {message}{}", original_suffix(.original_error))]
    HistoryWriteFailed {
        version: Version,
        message: String,
        original_error: Option<String>,
    },
}

fn original_suffix(original_error: &Option<String>) -> String {
    match original_error {
        Some(original_error) => format!("; original_error={original_error}"),
        None => String::new(),
    }
}
