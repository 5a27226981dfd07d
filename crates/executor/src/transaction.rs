use crate::error::ExecutorError;
use crate::target::Target;
use keel_migration::{NewHistoryRecord, Version};

pub async fn begin<T: Target + ?Sized>(target: &mut T, version: &Version) -> Result<(), ExecutorError> {
    target
        .begin()
        .await
        .map_err(|e| ExecutorError::TransactionBeginFailed {
            version: version.clone(),
            message: e.message,
        })
}

pub async fn rollback<T: Target + ?Sized>(
    target: &mut T,
    version: &Version,
    original_error: &str,
) -> Result<(), ExecutorError> {
    target
        .rollback()
        .await
        .map_err(|e| ExecutorError::TransactionRollbackFailed {
            version: version.clone(),
            message: e.message,
            original_error: original_error.to_string(),
        })
}

/// Writes `record` in a transaction of its own.
pub async fn record_alone<T: Target + ?Sized>(
    target: &mut T,
    record: &NewHistoryRecord,
    original_error: Option<&str>,
) -> Result<i32, ExecutorError> {
    let history_err = |message: String| ExecutorError::HistoryWriteFailed {
        version: record.version.clone(),
        message,
        original_error: original_error.map(str::to_string),
    };

    target.begin().await.map_err(|e| history_err(e.message))?;

    let rank = match target.append(record).await {
        Ok(rank) => rank,
        Err(e) => {
            let _ = target.rollback().await;
            return Err(history_err(e.message));
        }
    };

    target.commit().await.map_err(|e| history_err(e.message))?;
    Ok(rank)
}
