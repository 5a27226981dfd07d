use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryStoreError {
    #[error("invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: String },
    #[error("history store operation '{operation}' failed: {message}")]
    Query { operation: String, message: String },
    #[error("history table {table} is corrupt: {reason}")]
    Corrupt { table: String, reason: String },
}

impl HistoryStoreError {
    pub(crate) fn query(operation: &str, err: sqlx::Error) -> Self {
        HistoryStoreError::Query {
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }
}
