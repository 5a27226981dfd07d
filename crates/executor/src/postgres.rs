use crate::target::{Target, TargetError};
use async_trait::async_trait;
use keel_history::HistoryStore;
use keel_migration::NewHistoryRecord;
use keel_sql::SqlStatement;
use sqlx::PgConnection;

/// [`Target`] over a live administrative connection.
pub struct PgTarget<'a> {
    conn: &'a mut PgConnection,
    history: &'a HistoryStore,
}

impl<'a> PgTarget<'a> {
    pub fn new(conn: &'a mut PgConnection, history: &'a HistoryStore) -> Self {
        Self { conn, history }
    }

    async fn raw(&mut self, sql: &str) -> Result<(), TargetError> {
        sqlx::Executor::execute(&mut *self.conn, sqlx::raw_sql(sql))
            .await
            .map(|_| ())
            .map_err(|e| TargetError::new(e.to_string()))
    }
}

#[async_trait]
impl Target for PgTarget<'_> {
    async fn begin(&mut self) -> Result<(), TargetError> {
        self.raw("BEGIN").await
    }

    async fn commit(&mut self) -> Result<(), TargetError> {
        self.raw("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<(), TargetError> {
        self.raw("ROLLBACK").await
    }

    async fn execute(&mut self, statement: &SqlStatement) -> Result<(), TargetError> {
        self.raw(&statement.sql).await
    }

    async fn append(&mut self, record: &NewHistoryRecord) -> Result<i32, TargetError> {
        self.history
            .append(self.conn, record)
            .await
            .map_err(|e| TargetError::new(e.to_string()))
    }
}
