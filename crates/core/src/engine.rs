use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::info::{self, MigrationInfo};
use keel_executor::{AppliedMigration, Executor, PgTarget};
use keel_history::{quote_ident, HistoryStore};
use keel_lock::AdvisoryLockGuard;
use keel_migration::{
    discover_migrations, resolve, validate, HistoryRecord, MigrationDescriptor, MigrationPlan,
    NewHistoryRecord, Policy, ResolveError, ResolveOptions, ValidationReport, Version,
};
use serde::Serialize;
use sqlx::{Connection, PgConnection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrateOutcome {
    pub initial_version: Option<Version>,
    pub current_version: Option<Version>,
    pub applied: Vec<AppliedMigration>,
    /// Set when `baseline_on_migrate` inserted a baseline during this run.
    pub baselined: Option<Version>,
    pub elapsed_ms: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaselineOutcome {
    pub version: Version,
    pub description: String,
    pub installed_rank: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub removed: Vec<String>,
}

/// Runs the user-facing commands against one database.
///
/// Every command that writes takes the run lock first and releases it on
/// every exit path. `validate` and `info` only read and never lock.
pub struct Engine {
    config: EngineConfig,
    history: HistoryStore,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let history = HistoryStore::new(config.history_schema(), &config.table)?;
        Ok(Self { config, history })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Applies every pending migration in version order, halting at the first failure.
    pub async fn migrate(&self) -> Result<MigrateOutcome, EngineError> {
        // Discovery errors abort before the database is touched.
        let sources = discover_migrations(&self.config.locations)?;

        let mut guard = self.lock().await?;
        let result = self.migrate_locked(guard.connection(), sources).await;
        release(guard, result).await
    }

    async fn migrate_locked(
        &self,
        conn: &mut PgConnection,
        sources: Vec<MigrationDescriptor>,
    ) -> Result<MigrateOutcome, EngineError> {
        self.history.ensure_schema(conn).await?;
        let mut history = self.history.load_all(conn).await?;

        let mut baselined = None;
        if history.is_empty()
            && self.config.baseline_on_migrate
            && self.history.schema_has_user_objects(conn).await?
        {
            let version = self.config.baseline_version.clone();
            self.insert_baseline(conn, version.clone(), &self.config.baseline_description)
                .await?;
            tracing::info!(version = %version, "baselined existing schema");
            baselined = Some(version);
            history = self.history.load_all(conn).await?;
        }

        let plan = resolve(
            sources,
            &history,
            ResolveOptions {
                out_of_order: self.config.out_of_order,
            },
        )?;

        if self.config.validate_on_migrate {
            let report = validate(&plan, Policy::Strict);
            if !report.passed() {
                return Err(EngineError::Validation {
                    mismatches: report.errors,
                });
            }
        } else {
            for mismatch in &plan.mismatches {
                tracing::warn!(version = %mismatch.version(), "{mismatch}");
            }
        }

        let initial_version = plan.current_version.clone();
        if plan.pending.is_empty() {
            tracing::info!(
                version = ?initial_version.as_ref().map(Version::as_str),
                "schema is up to date"
            );
        }

        let installed_by = self.installed_by(conn).await?;
        let executor = Executor::new(installed_by);
        let mut target = PgTarget::new(&mut *conn, &self.history);
        let report = executor.apply(&mut target, &plan).await?;

        if let Some(failed) = report.failed {
            return Err(EngineError::MigrationFailed {
                failed: Box::new(failed),
                applied: report.applied.into_iter().map(|a| a.version).collect(),
            });
        }

        let current_version = report
            .applied
            .last()
            .map(|a| a.version.clone())
            .or_else(|| initial_version.clone());

        Ok(MigrateOutcome {
            initial_version,
            current_version,
            applied: report.applied,
            baselined,
            elapsed_ms: report.elapsed_ms,
        })
    }

    /// Read-only comparison of scripts and history.
    ///
    /// Under [`Policy::Permissive`] an out-of-order pending script is logged
    /// instead of failing the run.
    pub async fn validate(&self, policy: Policy) -> Result<ValidationReport, EngineError> {
        let sources = discover_migrations(&self.config.locations)?;
        let history = self.read_history().await?;
        let plan = self.resolve_for(policy, sources, &history)?;
        Ok(validate(&plan, policy))
    }

    fn resolve_for(
        &self,
        policy: Policy,
        sources: Vec<MigrationDescriptor>,
        history: &[HistoryRecord],
    ) -> Result<MigrationPlan, EngineError> {
        let options = ResolveOptions {
            out_of_order: self.config.out_of_order,
        };

        match resolve(sources.clone(), history, options) {
            Err(ResolveError::OutOfOrder {
                version,
                highest_applied,
            }) if policy == Policy::Permissive => {
                tracing::warn!(
                    version = %version,
                    highest_applied = %highest_applied,
                    "pending migration is older than the newest applied one"
                );
                Ok(resolve(sources, history, ResolveOptions { out_of_order: true })?)
            }
            other => Ok(other?),
        }
    }

    /// Records `version` as the starting point of an existing schema.
    /// Refused once the history table holds any record.
    pub async fn baseline(
        &self,
        version: Option<Version>,
        description: Option<String>,
    ) -> Result<BaselineOutcome, EngineError> {
        let version = version.unwrap_or_else(|| self.config.baseline_version.clone());
        let description =
            description.unwrap_or_else(|| self.config.baseline_description.clone());

        let mut guard = self.lock().await?;
        let result = self
            .baseline_locked(guard.connection(), version, description)
            .await;
        release(guard, result).await
    }

    async fn baseline_locked(
        &self,
        conn: &mut PgConnection,
        version: Version,
        description: String,
    ) -> Result<BaselineOutcome, EngineError> {
        self.history.ensure_schema(conn).await?;

        let existing = self.history.load_all(conn).await?;
        if !existing.is_empty() {
            return Err(EngineError::BaselineRefused {
                records: existing.len(),
            });
        }

        let installed_rank = self
            .insert_baseline(conn, version.clone(), &description)
            .await?;

        Ok(BaselineOutcome {
            version,
            description,
            installed_rank,
        })
    }

    /// Per-version state of scripts and history. Works on a database that
    /// has never been migrated.
    pub async fn info(&self) -> Result<Vec<MigrationInfo>, EngineError> {
        let sources = discover_migrations(&self.config.locations)?;
        let history = self.read_history().await?;
        Ok(info::describe(&sources, &history, self.config.out_of_order))
    }

    /// Deletes failed history records so their versions can be retried.
    /// Checksums of applied records are never rewritten.
    pub async fn repair(&self) -> Result<RepairReport, EngineError> {
        let mut guard = self.lock().await?;
        let result = self.repair_locked(guard.connection()).await;
        release(guard, result).await
    }

    async fn repair_locked(&self, conn: &mut PgConnection) -> Result<RepairReport, EngineError> {
        if !self.history.exists(conn).await? {
            return Ok(RepairReport {
                removed: Vec::new(),
            });
        }

        let removed = self.history.delete_failed(conn).await?;
        for version in &removed {
            tracing::info!(version = %version, "removed failed history record");
        }

        Ok(RepairReport { removed })
    }

    /// Drops and recreates every configured schema in one transaction.
    pub async fn clean(&self) -> Result<Vec<String>, EngineError> {
        if self.config.clean_disabled {
            return Err(EngineError::CleanDisabled);
        }

        let mut guard = self.lock().await?;
        let result = self.clean_locked(guard.connection()).await;
        release(guard, result).await
    }

    async fn clean_locked(&self, conn: &mut PgConnection) -> Result<Vec<String>, EngineError> {
        let script: String = self
            .config
            .schemas
            .iter()
            .map(|schema| {
                let quoted = quote_ident(schema);
                format!("DROP SCHEMA IF EXISTS {quoted} CASCADE;\nCREATE SCHEMA {quoted};\n")
            })
            .collect();

        // A multi-statement simple query runs as one implicit transaction.
        sqlx::raw_sql(&script)
            .execute(&mut *conn)
            .await
            .map_err(|e| EngineError::database("clean", e))?;

        for schema in &self.config.schemas {
            tracing::warn!(schema = %schema, "schema cleaned");
        }

        Ok(self.config.schemas.clone())
    }

    async fn connect(&self) -> Result<PgConnection, EngineError> {
        let options = self.config.connect_options()?;
        PgConnection::connect_with(&options)
            .await
            .map_err(|e| EngineError::Connect {
                message: e.to_string(),
            })
    }

    async fn lock(&self) -> Result<AdvisoryLockGuard, EngineError> {
        let conn = self.connect().await?;
        let guard =
            AdvisoryLockGuard::acquire(conn, &self.lock_name(), self.config.lock_timeout).await?;
        Ok(guard)
    }

    fn lock_name(&self) -> String {
        format!("{}.{}", self.history.schema(), self.history.table())
    }

    /// History as stored, or empty when the table does not exist yet.
    async fn read_history(&self) -> Result<Vec<HistoryRecord>, EngineError> {
        let mut conn = self.connect().await?;

        let result: Result<Vec<HistoryRecord>, EngineError> = async {
            if self.history.exists(&mut conn).await? {
                Ok(self.history.load_all(&mut conn).await?)
            } else {
                Ok(Vec::new())
            }
        }
        .await;

        let _ = conn.close().await;
        result
    }

    async fn installed_by(&self, conn: &mut PgConnection) -> Result<String, EngineError> {
        if let Some(name) = &self.config.installed_by {
            return Ok(name.clone());
        }

        sqlx::query_scalar("SELECT current_user::text")
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| EngineError::database("current_user", e))
    }

    async fn insert_baseline(
        &self,
        conn: &mut PgConnection,
        version: Version,
        description: &str,
    ) -> Result<i32, EngineError> {
        let installed_by = self.installed_by(conn).await?;
        let record = NewHistoryRecord::baseline(version, description, &installed_by);
        Ok(self.history.append(conn, &record).await?)
    }
}

/// Releases the run lock whatever `result` is. A failed release after a
/// successful command is only logged: the session is closed either way.
async fn release<T>(
    guard: AdvisoryLockGuard,
    result: Result<T, EngineError>,
) -> Result<T, EngineError> {
    let name = guard.name().to_string();
    if let Err(err) = guard.release().await {
        tracing::warn!(lock = %name, error = %err, "failed to release migration lock");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::Engine;
    use crate::config::EngineConfig;
    use crate::error::EngineError;

    fn config() -> EngineConfig {
        EngineConfig::new("postgres://localhost:5432/app", "app", "secret").unwrap()
    }

    #[tokio::test]
    async fn clean_is_refused_before_connecting() {
        // Unreachable port: reaching the database would fail with Connect instead.
        let mut config = config();
        config.url = "postgres://127.0.0.1:1/app".to_string();
        let engine = Engine::new(config).unwrap();

        assert!(matches!(engine.clean().await, Err(EngineError::CleanDisabled)));
    }

    #[tokio::test]
    async fn discovery_errors_abort_before_connecting() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("V1__a.sql"), "SELECT 1;").unwrap();
        std::fs::write(dir.path().join("V1.0__b.sql"), "SELECT 2;").unwrap();

        let mut config = config();
        config.url = "postgres://127.0.0.1:1/app".to_string();
        config.locations = vec![dir.path().to_path_buf()];
        let engine = Engine::new(config).unwrap();

        assert!(matches!(engine.migrate().await, Err(EngineError::Discovery(_))));
    }

    #[test]
    fn lock_is_named_after_the_history_table() {
        let mut config = config();
        config.schemas = vec!["billing".to_string(), "public".to_string()];
        let engine = Engine::new(config).unwrap();

        assert_eq!(engine.lock_name(), "billing.keel_schema_history");
        assert_eq!(engine.history().schema(), "billing");
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = config();
        config.table = "history; drop".to_string();
        assert!(matches!(Engine::new(config), Err(EngineError::Config(_))));
    }
}
