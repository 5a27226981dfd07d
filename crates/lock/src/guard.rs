use crate::advisory;
use crate::error::LockError;
use core::time::Duration;
use sqlx::{Connection, PgConnection};
use tokio::time::{sleep, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Session-level advisory lock that owns the connection holding it.
///
/// Migration work runs on [`AdvisoryLockGuard::connection`], so the lock and
/// the work share one session. Dropping the guard without calling
/// [`AdvisoryLockGuard::release`] drops the connection, and PostgreSQL frees
/// session locks when the session ends.
pub struct AdvisoryLockGuard {
    conn: PgConnection,
    key: i64,
    name: String,
}

impl AdvisoryLockGuard {
    /// Polls `pg_try_advisory_lock` until it succeeds or `timeout` passes.
    pub async fn acquire(
        mut conn: PgConnection,
        name: &str,
        timeout: Duration,
    ) -> Result<Self, LockError> {
        let key = advisory::lock_key(name);
        let deadline = deadline_after(timeout);
        let timeout_ms = saturating_millis(timeout);
        let mut announced = false;

        loop {
            if advisory::try_lock(&mut conn, key).await? {
                tracing::debug!(lock = name, key, "migration lock acquired");
                return Ok(Self {
                    conn,
                    key,
                    name: name.to_string(),
                });
            }

            if deadline.is_some_and(|d| Instant::now() >= d) {
                let _ = conn.close().await;
                return Err(LockError::Timeout {
                    name: name.to_string(),
                    timeout_ms,
                });
            }

            if !announced {
                tracing::info!(lock = name, timeout_ms, "waiting for migration lock");
                announced = true;
            }

            sleep(POLL_INTERVAL).await;
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    /// Unlocks and closes the connection.
    pub async fn release(self) -> Result<(), LockError> {
        let Self { mut conn, key, name } = self;

        let unlock_res = advisory::unlock(&mut conn, key).await;
        let close_res = conn.close().await;

        let close_msg = match close_res {
            Ok(()) => String::new(),
            Err(e) => format!("; close_error={e}"),
        };

        match unlock_res {
            Ok(true) if close_msg.is_empty() => {
                tracing::debug!(lock = %name, "migration lock released");
                Ok(())
            }
            Ok(true) => Err(LockError::ReleaseFailed {
                message: format!("connection close failed{close_msg}"),
            }),
            Ok(false) => Err(LockError::ReleaseFailed {
                message: format!("pg_advisory_unlock returned false{close_msg}"),
            }),
            Err(err) => Err(LockError::ReleaseFailed {
                message: format!("{err}{close_msg}"),
            }),
        }
    }
}

/// `None` when the timeout reaches past what `Instant` can represent; such a
/// wait never expires.
fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

fn saturating_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::{deadline_after, saturating_millis};
    use core::time::Duration;

    #[test]
    fn huge_timeout_has_no_deadline() {
        assert!(deadline_after(Duration::from_secs(u64::MAX)).is_none());
        assert!(deadline_after(Duration::MAX).is_none());
        assert!(deadline_after(Duration::from_secs(30)).is_some());
    }

    #[test]
    fn millis_saturate() {
        assert_eq!(saturating_millis(Duration::from_secs(u64::MAX)), u64::MAX);
        assert_eq!(saturating_millis(Duration::from_millis(1500)), 1500);
    }
}
