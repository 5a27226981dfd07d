use crate::error::HistoryStoreError;
use crate::ident::{quote_ident, validate_ident};
use chrono::{DateTime, Utc};
use keel_migration::{HistoryRecord, NewHistoryRecord, RecordKind, Version};
use sqlx::{Connection, PgConnection};

pub const DEFAULT_TABLE: &str = "keel_schema_history";

const EXPECTED_COLUMNS: [&str; 10] = [
    "installed_rank",
    "version",
    "description",
    "type",
    "script",
    "checksum",
    "installed_by",
    "installed_on",
    "execution_time",
    "success",
];

const SQL_TABLE_EXISTS: &str = "
SELECT EXISTS (
    SELECT 1
    FROM information_schema.tables
    WHERE table_schema = $1 AND table_name = $2
)
";

const SQL_SCHEMA_EXISTS: &str = "
SELECT EXISTS (
    SELECT 1
    FROM pg_catalog.pg_namespace
    WHERE nspname = $1
)
";

const SQL_COLUMNS: &str = "
SELECT column_name::text
FROM information_schema.columns
WHERE table_schema = $1 AND table_name = $2
";

const SQL_USER_OBJECTS: &str = "
SELECT EXISTS (
    SELECT 1
    FROM pg_catalog.pg_class c
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    WHERE n.nspname = $1
      AND c.relname <> $2
      AND c.relkind IN ('r', 'p', 'v', 'm', 'S', 'f')
      AND NOT EXISTS (
          SELECT 1
          FROM pg_catalog.pg_depend d
          WHERE d.objid = c.oid
            AND d.refobjid IN (
                SELECT t.oid
                FROM pg_catalog.pg_class t
                WHERE t.relnamespace = n.oid AND t.relname = $2
            )
      )
)
";

#[derive(sqlx::FromRow)]
struct HistoryRow {
    installed_rank: i32,
    version: String,
    description: String,
    #[sqlx(rename = "type")]
    kind: String,
    script: String,
    checksum: Option<String>,
    installed_by: String,
    installed_on: DateTime<Utc>,
    execution_time: i32,
    success: bool,
}

/// Access to `<schema>.<table>`, the record of every migration attempt.
///
/// All methods run on the caller's connection; `append` joins whatever
/// transaction the caller has open.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    schema: String,
    table: String,
}

impl HistoryStore {
    pub fn new(schema: &str, table: &str) -> Result<Self, HistoryStoreError> {
        validate_ident(schema)?;
        validate_ident(table)?;

        Ok(Self {
            schema: schema.to_string(),
            table: table.to_string(),
        })
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }

    /// Creates the schema and table when absent, then checks the columns.
    ///
    /// Creation runs under a transaction-scoped advisory lock so concurrent
    /// first runs serialize instead of racing on `CREATE`. An existing schema
    /// is used as is, so a role without database `CREATE` can still run.
    pub async fn ensure_schema(&self, conn: &mut PgConnection) -> Result<(), HistoryStoreError> {
        let key = keel_lock::advisory::lock_key(&format!("{}.{}:create", self.schema, self.table));
        let table = self.qualified_name();
        let index = quote_ident(&format!("{}_success_version_idx", self.table));

        let create_schema = format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(&self.schema));
        let create_table = format!(
            "CREATE TABLE IF NOT EXISTS {table} (
    installed_rank integer GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    version text NOT NULL,
    description text NOT NULL,
    type text NOT NULL,
    script text NOT NULL,
    checksum text NULL,
    installed_by text NOT NULL,
    installed_on timestamptz NOT NULL DEFAULT now(),
    execution_time integer NOT NULL,
    success boolean NOT NULL
)"
        );
        let create_index =
            format!("CREATE UNIQUE INDEX IF NOT EXISTS {index} ON {table} (version) WHERE success");

        let mut tx = conn
            .begin()
            .await
            .map_err(|e| HistoryStoreError::query("ensure_schema.begin", e))?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(key)
            .execute(&mut *tx)
            .await
            .map_err(|e| HistoryStoreError::query("ensure_schema.lock", e))?;

        let schema_exists: bool = sqlx::query_scalar(SQL_SCHEMA_EXISTS)
            .bind(&self.schema)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| HistoryStoreError::query("ensure_schema.schema_exists", e))?;

        if !schema_exists {
            sqlx::raw_sql(&create_schema)
                .execute(&mut *tx)
                .await
                .map_err(|e| HistoryStoreError::query("ensure_schema.create_schema", e))?;
        }

        sqlx::raw_sql(&create_table)
            .execute(&mut *tx)
            .await
            .map_err(|e| HistoryStoreError::query("ensure_schema.create_table", e))?;

        // A pre-existing table of another shape is reported, never altered.
        self.verify_columns(&mut tx).await?;

        sqlx::raw_sql(&create_index)
            .execute(&mut *tx)
            .await
            .map_err(|e| HistoryStoreError::query("ensure_schema.create_index", e))?;

        tx.commit()
            .await
            .map_err(|e| HistoryStoreError::query("ensure_schema.commit", e))
    }

    pub async fn exists(&self, conn: &mut PgConnection) -> Result<bool, HistoryStoreError> {
        sqlx::query_scalar(SQL_TABLE_EXISTS)
            .bind(&self.schema)
            .bind(&self.table)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| HistoryStoreError::query("exists", e))
    }

    async fn verify_columns(&self, conn: &mut PgConnection) -> Result<(), HistoryStoreError> {
        let columns: Vec<String> = sqlx::query_scalar(SQL_COLUMNS)
            .bind(&self.schema)
            .bind(&self.table)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| HistoryStoreError::query("verify_columns", e))?;

        let missing: Vec<&str> = EXPECTED_COLUMNS
            .iter()
            .copied()
            .filter(|expected| !columns.iter().any(|c| c == expected))
            .collect();

        if !missing.is_empty() {
            return Err(HistoryStoreError::Corrupt {
                table: self.qualified_name(),
                reason: format!("missing columns: {}", missing.join(", ")),
            });
        }

        Ok(())
    }

    /// Every record, ordered by `installed_rank` ascending.
    pub async fn load_all(
        &self,
        conn: &mut PgConnection,
    ) -> Result<Vec<HistoryRecord>, HistoryStoreError> {
        let sql = format!(
            "SELECT installed_rank, version, description, type, script, checksum, installed_by, installed_on, execution_time, success
FROM {}
ORDER BY installed_rank ASC",
            self.qualified_name()
        );

        let rows: Vec<HistoryRow> = sqlx::query_as(&sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| HistoryStoreError::query("load_all", e))?;

        rows.into_iter().map(|row| self.to_record(row)).collect()
    }

    fn to_record(&self, row: HistoryRow) -> Result<HistoryRecord, HistoryStoreError> {
        let version = Version::parse(&row.version).map_err(|e| HistoryStoreError::Corrupt {
            table: self.qualified_name(),
            reason: format!("installed_rank {}: {e}", row.installed_rank),
        })?;

        let kind: RecordKind = row.kind.parse().map_err(|e| HistoryStoreError::Corrupt {
            table: self.qualified_name(),
            reason: format!("installed_rank {}: {e}", row.installed_rank),
        })?;

        Ok(HistoryRecord {
            installed_rank: row.installed_rank,
            version,
            description: row.description,
            kind,
            script: row.script,
            checksum: row.checksum,
            installed_by: row.installed_by,
            installed_on: row.installed_on,
            execution_time_ms: row.execution_time,
            success: row.success,
        })
    }

    /// Inserts `record` and returns the rank the database assigned.
    pub async fn append(
        &self,
        conn: &mut PgConnection,
        record: &NewHistoryRecord,
    ) -> Result<i32, HistoryStoreError> {
        let sql = format!(
            "INSERT INTO {} (version, description, type, script, checksum, installed_by, execution_time, success)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
RETURNING installed_rank",
            self.qualified_name()
        );

        let rank: i32 = sqlx::query_scalar(&sql)
            .bind(record.version.as_str())
            .bind(&record.description)
            .bind(record.kind.as_str())
            .bind(&record.script)
            .bind(record.checksum.as_deref())
            .bind(&record.installed_by)
            .bind(record.execution_time_ms)
            .bind(record.success)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| HistoryStoreError::query("append", e))?;

        tracing::debug!(
            version = %record.version,
            success = record.success,
            installed_rank = rank,
            "history record appended"
        );

        Ok(rank)
    }

    /// Removes failed attempts and returns their versions.
    pub async fn delete_failed(
        &self,
        conn: &mut PgConnection,
    ) -> Result<Vec<String>, HistoryStoreError> {
        let sql = format!(
            "DELETE FROM {} WHERE NOT success RETURNING version",
            self.qualified_name()
        );

        sqlx::query_scalar(&sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| HistoryStoreError::query("delete_failed", e))
    }

    /// Whether the schema holds relations other than the history table.
    pub async fn schema_has_user_objects(
        &self,
        conn: &mut PgConnection,
    ) -> Result<bool, HistoryStoreError> {
        sqlx::query_scalar(SQL_USER_OBJECTS)
            .bind(&self.schema)
            .bind(&self.table)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| HistoryStoreError::query("schema_has_user_objects", e))
    }
}

#[cfg(test)]
mod tests {
    use super::HistoryStore;
    use crate::error::HistoryStoreError;

    #[test]
    fn qualified_name_is_quoted() {
        let store = HistoryStore::new("app", "keel_schema_history").unwrap();
        assert_eq!(store.qualified_name(), "\"app\".\"keel_schema_history\"");
    }

    #[test]
    fn rejects_unsafe_names() {
        let err = HistoryStore::new("public; drop schema public", "h").unwrap_err();
        assert!(matches!(err, HistoryStoreError::InvalidIdentifier { .. }));
    }
}
