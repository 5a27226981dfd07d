use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LockError {
    #[error("migration lock for '{name}' unavailable after {timeout_ms} ms; another migration run holds it")]
    Timeout { name: String, timeout_ms: u64 },
    #[error("lock acquire failed: {message}")]
    AcquireFailed { message: String },
    #[error("lock release failed: {message}")]
    ReleaseFailed { message: String },
}
