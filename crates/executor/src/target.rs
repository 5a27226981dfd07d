use async_trait::async_trait;
use keel_migration::NewHistoryRecord;
use keel_sql::SqlStatement;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TargetError {
    pub message: String,
}

impl TargetError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The single session migrations are applied through.
///
/// Transactions are explicit: statements executed outside `begin`/`commit`
/// run in autocommit mode.
#[async_trait]
pub trait Target: Send {
    async fn begin(&mut self) -> Result<(), TargetError>;
    async fn commit(&mut self) -> Result<(), TargetError>;
    async fn rollback(&mut self) -> Result<(), TargetError>;
    async fn execute(&mut self, statement: &SqlStatement) -> Result<(), TargetError>;
    /// Writes a history row and returns its rank.
    async fn append(&mut self, record: &NewHistoryRecord) -> Result<i32, TargetError>;
}
