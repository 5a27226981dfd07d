//! Runs against PostgreSQL when `KEEL_TEST_DATABASE_URL` is set.

use core::time::Duration;
use keel_lock::{AdvisoryLockGuard, LockError};
use sqlx::{Connection, PgConnection};

async fn connect() -> Option<PgConnection> {
    let url = std::env::var("KEEL_TEST_DATABASE_URL").ok()?;
    Some(PgConnection::connect(&url).await.expect("connect to test database"))
}

#[tokio::test]
async fn second_runner_times_out_while_lock_is_held() {
    let (Some(first), Some(second)) = (connect().await, connect().await) else {
        return;
    };

    let name = "keel_lock_test_exclusion";
    let held = AdvisoryLockGuard::acquire(first, name, Duration::from_secs(1))
        .await
        .unwrap();

    let err = AdvisoryLockGuard::acquire(second, name, Duration::from_millis(300))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, LockError::Timeout { .. }));

    held.release().await.unwrap();

    let third = connect().await.unwrap();
    let guard = AdvisoryLockGuard::acquire(third, name, Duration::from_secs(1))
        .await
        .unwrap();
    guard.release().await.unwrap();
}

#[tokio::test]
async fn dropping_the_guard_frees_the_lock() {
    let Some(first) = connect().await else {
        return;
    };

    let name = "keel_lock_test_drop";
    let held = AdvisoryLockGuard::acquire(first, name, Duration::from_secs(1))
        .await
        .unwrap();
    drop(held);

    let second = connect().await.unwrap();
    let guard = AdvisoryLockGuard::acquire(second, name, Duration::from_secs(5))
        .await
        .unwrap();
    guard.release().await.unwrap();
}
