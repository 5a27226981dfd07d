use crate::error::ExecutorError;
use crate::statement::{self, duration_ms, StatementFailure};
use crate::target::Target;
use crate::transaction;
use keel_migration::{MigrationDescriptor, MigrationPlan, NewHistoryRecord, Version};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMigration {
    pub version: Version,
    pub description: String,
    pub installed_rank: i32,
    pub execution_time_ms: i32,
    pub transactional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedMigration {
    pub version: Version,
    pub description: String,
    pub script: String,
    pub statement_ordinal: Option<i32>,
    pub statement: Option<String>,
    pub message: String,
    pub transactional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub applied: Vec<AppliedMigration>,
    pub failed: Option<FailedMigration>,
    pub elapsed_ms: i32,
}

impl ExecutionReport {
    pub fn succeeded(&self) -> bool {
        self.failed.is_none()
    }
}

/// Applies a plan one migration at a time and stops at the first failure.
#[derive(Debug, Clone)]
pub struct Executor {
    installed_by: String,
}

impl Executor {
    pub fn new(installed_by: impl Into<String>) -> Self {
        Self {
            installed_by: installed_by.into(),
        }
    }

    pub async fn apply<T: Target + ?Sized>(
        &self,
        target: &mut T,
        plan: &MigrationPlan,
    ) -> Result<ExecutionReport, ExecutorError> {
        let started = Instant::now();
        let mut applied = Vec::with_capacity(plan.pending.len());
        let mut failed = None;

        for migration in &plan.pending {
            match self.apply_one(target, migration).await? {
                Ok(done) => {
                    tracing::info!(
                        version = %done.version,
                        description = %done.description,
                        execution_time_ms = done.execution_time_ms,
                        "migration applied"
                    );
                    applied.push(done);
                }
                Err(failure) => {
                    tracing::error!(
                        version = %failure.version,
                        statement = ?failure.statement_ordinal,
                        "migration failed: {}",
                        failure.message
                    );
                    failed = Some(failure);
                    break;
                }
            }
        }

        Ok(ExecutionReport {
            applied,
            failed,
            elapsed_ms: duration_ms(started.elapsed()),
        })
    }

    /// The outer `Result` is bookkeeping; the inner one is the migration's own outcome.
    async fn apply_one<T: Target + ?Sized>(
        &self,
        target: &mut T,
        migration: &MigrationDescriptor,
    ) -> Result<Result<AppliedMigration, FailedMigration>, ExecutorError> {
        if migration.payload.transactional() {
            self.apply_transactional(target, migration).await
        } else {
            self.apply_autocommit(target, migration).await
        }
    }

    async fn apply_transactional<T: Target + ?Sized>(
        &self,
        target: &mut T,
        migration: &MigrationDescriptor,
    ) -> Result<Result<AppliedMigration, FailedMigration>, ExecutorError> {
        let version = &migration.version;
        transaction::begin(target, version).await?;

        let started = Instant::now();
        let outcome = statement::execute_all(target, migration.payload.statements()).await;
        let elapsed = duration_ms(started.elapsed());

        if let Err(failure) = outcome {
            transaction::rollback(target, version, &failure.message).await?;
            return self.record_failure(target, migration, elapsed, failure).await;
        }

        let record = NewHistoryRecord::applied(migration, &self.installed_by, elapsed, true);
        let rank = match target.append(&record).await {
            Ok(rank) => rank,
            Err(e) => {
                transaction::rollback(target, version, &e.message).await?;
                return Err(ExecutorError::HistoryWriteFailed {
                    version: version.clone(),
                    message: e.message,
                    original_error: None,
                });
            }
        };

        // A failing COMMIT (deferred constraints, serialization) leaves nothing
        // behind, so it is the migration that failed.
        if let Err(e) = target.commit().await {
            let failure = StatementFailure {
                statement_ordinal: None,
                statement: None,
                message: format!("commit failed: {}", e.message),
            };
            return self.record_failure(target, migration, elapsed, failure).await;
        }

        Ok(Ok(self.applied(migration, rank, elapsed)))
    }

    async fn apply_autocommit<T: Target + ?Sized>(
        &self,
        target: &mut T,
        migration: &MigrationDescriptor,
    ) -> Result<Result<AppliedMigration, FailedMigration>, ExecutorError> {
        let started = Instant::now();
        let outcome = statement::execute_all(target, migration.payload.statements()).await;
        let elapsed = duration_ms(started.elapsed());

        if let Err(failure) = outcome {
            tracing::warn!(
                version = %migration.version,
                "non-transactional migration failed; statements before the failure stay applied"
            );
            return self.record_failure(target, migration, elapsed, failure).await;
        }

        let record = NewHistoryRecord::applied(migration, &self.installed_by, elapsed, true);
        let rank = transaction::record_alone(target, &record, None).await?;

        Ok(Ok(self.applied(migration, rank, elapsed)))
    }

    async fn record_failure<T: Target + ?Sized>(
        &self,
        target: &mut T,
        migration: &MigrationDescriptor,
        elapsed: i32,
        failure: StatementFailure,
    ) -> Result<Result<AppliedMigration, FailedMigration>, ExecutorError> {
        let record = NewHistoryRecord::applied(migration, &self.installed_by, elapsed, false);
        transaction::record_alone(target, &record, Some(&failure.message)).await?;

        Ok(Err(FailedMigration {
            version: migration.version.clone(),
            description: migration.description.clone(),
            script: migration.script.clone(),
            statement_ordinal: failure.statement_ordinal,
            statement: failure.statement,
            message: failure.message,
            transactional: migration.payload.transactional(),
        }))
    }

    fn applied(&self, migration: &MigrationDescriptor, rank: i32, elapsed: i32) -> AppliedMigration {
        AppliedMigration {
            version: migration.version.clone(),
            description: migration.description.clone(),
            installed_rank: rank,
            execution_time_ms: elapsed,
            transactional: migration.payload.transactional(),
        }
    }
}
