use crate::error::LockError;
use sqlx::PgConnection;

pub const KEEL_LOCK_KEY_NAMESPACE: u64 = 0x4b45_454c_4d49_4752;

/// Stable 64-bit advisory lock key for `name` (FNV-1a, namespaced).
pub fn lock_key(name: &str) -> i64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in name.as_bytes() {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }

    let mixed = hash ^ KEEL_LOCK_KEY_NAMESPACE;
    mixed as i64
}

pub async fn try_lock(conn: &mut PgConnection, key: i64) -> Result<bool, LockError> {
    let row: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .bind(key)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| LockError::AcquireFailed {
            message: format!("pg_try_advisory_lock failed: {e}"),
        })?;

    Ok(row.0)
}

pub async fn unlock(conn: &mut PgConnection, key: i64) -> Result<bool, LockError> {
    let row: (bool,) = sqlx::query_as("SELECT pg_advisory_unlock($1)")
        .bind(key)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| LockError::ReleaseFailed {
            message: format!("pg_advisory_unlock failed: {e}"),
        })?;

    Ok(row.0)
}

#[cfg(test)]
mod tests {
    use super::lock_key;

    #[test]
    fn key_is_stable_per_name() {
        assert_eq!(lock_key("public"), lock_key("public"));
        assert_ne!(lock_key("public"), lock_key("billing"));
    }

    #[test]
    fn run_and_creation_keys_differ() {
        assert_ne!(
            lock_key("public"),
            lock_key("public.keel_schema_history:create")
        );
    }
}
