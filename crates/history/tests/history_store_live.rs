//! Runs against PostgreSQL when `KEEL_TEST_DATABASE_URL` is set.

use keel_history::{HistoryStore, HistoryStoreError};
use keel_migration::{NewHistoryRecord, RecordKind, Version};
use sqlx::{Connection, PgConnection};

async fn connect() -> Option<PgConnection> {
    let url = std::env::var("KEEL_TEST_DATABASE_URL").ok()?;
    Some(PgConnection::connect(&url).await.expect("connect to test database"))
}

async fn reset(conn: &mut PgConnection, schema: &str) {
    sqlx::raw_sql(&format!("DROP SCHEMA IF EXISTS \"{schema}\" CASCADE"))
        .execute(&mut *conn)
        .await
        .unwrap();
}

fn record(version: &str, success: bool) -> NewHistoryRecord {
    NewHistoryRecord {
        version: Version::parse(version).unwrap(),
        description: format!("step {version}"),
        kind: RecordKind::Sql,
        script: format!("V{version}__step.sql"),
        checksum: Some("abc".to_string()),
        installed_by: "tester".to_string(),
        execution_time_ms: 7,
        success,
    }
}

#[tokio::test]
async fn ensure_schema_is_idempotent_and_ranks_follow_inserts() {
    let Some(mut conn) = connect().await else {
        return;
    };
    let schema = "keel_history_it_ranks";
    reset(&mut conn, schema).await;

    let store = HistoryStore::new(schema, "keel_schema_history").unwrap();
    assert!(!store.exists(&mut conn).await.unwrap());

    store.ensure_schema(&mut conn).await.unwrap();
    store.ensure_schema(&mut conn).await.unwrap();
    assert!(store.exists(&mut conn).await.unwrap());

    let first = store.append(&mut conn, &record("1", true)).await.unwrap();
    let second = store.append(&mut conn, &record("2", false)).await.unwrap();
    assert!(second > first);

    let records = store.load_all(&mut conn).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].version.as_str(), "1");
    assert!(records[0].success);
    assert!(!records[1].success);
    assert_eq!(records[1].installed_by, "tester");

    assert_eq!(store.delete_failed(&mut conn).await.unwrap(), vec!["2".to_string()]);
    assert_eq!(store.load_all(&mut conn).await.unwrap().len(), 1);

    reset(&mut conn, schema).await;
}

#[tokio::test]
async fn second_success_for_a_version_is_rejected() {
    let Some(mut conn) = connect().await else {
        return;
    };
    let schema = "keel_history_it_unique";
    reset(&mut conn, schema).await;

    let store = HistoryStore::new(schema, "keel_schema_history").unwrap();
    store.ensure_schema(&mut conn).await.unwrap();

    store.append(&mut conn, &record("1", false)).await.unwrap();
    store.append(&mut conn, &record("1", true)).await.unwrap();
    let err = store.append(&mut conn, &record("1", true)).await.unwrap_err();
    assert!(matches!(err, HistoryStoreError::Query { .. }));

    reset(&mut conn, schema).await;
}

#[tokio::test]
async fn unexpected_table_shape_is_corrupt() {
    let Some(mut conn) = connect().await else {
        return;
    };
    let schema = "keel_history_it_corrupt";
    reset(&mut conn, schema).await;

    sqlx::raw_sql(&format!(
        "CREATE SCHEMA \"{schema}\"; CREATE TABLE \"{schema}\".keel_schema_history (version text)"
    ))
    .execute(&mut conn)
    .await
    .unwrap();

    let store = HistoryStore::new(schema, "keel_schema_history").unwrap();
    let err = store.ensure_schema(&mut conn).await.unwrap_err();
    assert!(matches!(err, HistoryStoreError::Corrupt { .. }));

    reset(&mut conn, schema).await;
}

#[tokio::test]
async fn detects_objects_besides_history() {
    let Some(mut conn) = connect().await else {
        return;
    };
    let schema = "keel_history_it_objects";
    reset(&mut conn, schema).await;

    let store = HistoryStore::new(schema, "keel_schema_history").unwrap();
    store.ensure_schema(&mut conn).await.unwrap();
    assert!(!store.schema_has_user_objects(&mut conn).await.unwrap());

    sqlx::raw_sql(&format!("CREATE TABLE \"{schema}\".legacy (id int)"))
        .execute(&mut conn)
        .await
        .unwrap();
    assert!(store.schema_has_user_objects(&mut conn).await.unwrap());

    reset(&mut conn, schema).await;
}

#[tokio::test]
async fn existing_schema_needs_no_database_create_privilege() {
    let Some(mut conn) = connect().await else {
        return;
    };
    let schema = "keel_history_it_granted";
    let role = "keel_history_it_schema_only";
    reset(&mut conn, schema).await;
    sqlx::raw_sql(&format!(
        "DROP ROLE IF EXISTS {role};
CREATE ROLE {role} NOLOGIN;
CREATE SCHEMA \"{schema}\";
GRANT USAGE, CREATE ON SCHEMA \"{schema}\" TO {role}"
    ))
    .execute(&mut conn)
    .await
    .unwrap();

    sqlx::raw_sql(&format!("SET ROLE {role}"))
        .execute(&mut conn)
        .await
        .unwrap();

    let store = HistoryStore::new(schema, "keel_schema_history").unwrap();
    let result = store.ensure_schema(&mut conn).await;
    let exists = store.exists(&mut conn).await;

    sqlx::raw_sql("RESET ROLE").execute(&mut conn).await.unwrap();
    reset(&mut conn, schema).await;
    sqlx::raw_sql(&format!("DROP ROLE {role}"))
        .execute(&mut conn)
        .await
        .unwrap();

    result.unwrap();
    assert!(exists.unwrap());
}
