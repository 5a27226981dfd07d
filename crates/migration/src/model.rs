use crate::version::Version;
use chrono::{DateTime, Utc};
use core::fmt;
use core::str::FromStr;
use keel_sql::SqlStatement;
use serde::Serialize;
use std::path::PathBuf;

/// Executable body of a migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Statements and the history row commit in one transaction.
    Transactional { statements: Vec<SqlStatement> },
    /// Statements run in autocommit mode; a failure can leave partial effects.
    NonTransactional {
        statements: Vec<SqlStatement>,
        reason: String,
    },
}

impl Payload {
    pub fn transactional(&self) -> bool {
        matches!(self, Payload::Transactional { .. })
    }

    pub fn statements(&self) -> &[SqlStatement] {
        match self {
            Payload::Transactional { statements } => statements,
            Payload::NonTransactional { statements, .. } => statements,
        }
    }

    pub fn record_kind(&self) -> RecordKind {
        match self {
            Payload::Transactional { .. } => RecordKind::Sql,
            Payload::NonTransactional { .. } => RecordKind::SqlNoTransaction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationDescriptor {
    pub version: Version,
    pub description: String,
    /// File name, e.g. `V1.2__add_users.sql`.
    pub script: String,
    pub location: PathBuf,
    pub checksum: String,
    pub payload: Payload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordKind {
    #[serde(rename = "SQL")]
    Sql,
    #[serde(rename = "SQL_NO_TX")]
    SqlNoTransaction,
    #[serde(rename = "BASELINE")]
    Baseline,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Sql => "SQL",
            RecordKind::SqlNoTransaction => "SQL_NO_TX",
            RecordKind::Baseline => "BASELINE",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SQL" => Ok(RecordKind::Sql),
            "SQL_NO_TX" => Ok(RecordKind::SqlNoTransaction),
            "BASELINE" => Ok(RecordKind::Baseline),
            other => Err(format!("unknown history record type '{other}'")),
        }
    }
}

/// One row of the history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    pub installed_rank: i32,
    pub version: Version,
    pub description: String,
    pub kind: RecordKind,
    pub script: String,
    pub checksum: Option<String>,
    pub installed_by: String,
    pub installed_on: DateTime<Utc>,
    pub execution_time_ms: i32,
    pub success: bool,
}

impl HistoryRecord {
    pub fn is_baseline(&self) -> bool {
        self.kind == RecordKind::Baseline
    }
}

/// A history row before the database assigns its rank and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryRecord {
    pub version: Version,
    pub description: String,
    pub kind: RecordKind,
    pub script: String,
    pub checksum: Option<String>,
    pub installed_by: String,
    pub execution_time_ms: i32,
    pub success: bool,
}

impl NewHistoryRecord {
    pub fn applied(
        migration: &MigrationDescriptor,
        installed_by: &str,
        execution_time_ms: i32,
        success: bool,
    ) -> Self {
        Self {
            version: migration.version.clone(),
            description: migration.description.clone(),
            kind: migration.payload.record_kind(),
            script: migration.script.clone(),
            checksum: Some(migration.checksum.clone()),
            installed_by: installed_by.to_string(),
            execution_time_ms,
            success,
        }
    }

    pub fn baseline(version: Version, description: &str, installed_by: &str) -> Self {
        Self {
            version,
            description: description.to_string(),
            kind: RecordKind::Baseline,
            script: description.to_string(),
            checksum: None,
            installed_by: installed_by.to_string(),
            execution_time_ms: 0,
            success: true,
        }
    }
}
