use chrono::{DateTime, Utc};
use core::fmt;
use keel_migration::{HistoryRecord, MigrationDescriptor, Version};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    Success,
    Failed,
    Pending,
    Baseline,
    BelowBaseline,
    /// Recorded as applied but no script carries the version anymore.
    Missing,
    /// Recorded checksum differs from the script on disk.
    Drift,
    /// Unapplied, but older than the newest applied version.
    Ignored,
}

impl MigrationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationState::Success => "Success",
            MigrationState::Failed => "Failed",
            MigrationState::Pending => "Pending",
            MigrationState::Baseline => "Baseline",
            MigrationState::BelowBaseline => "Below baseline",
            MigrationState::Missing => "Missing",
            MigrationState::Drift => "Drift",
            MigrationState::Ignored => "Ignored",
        }
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationInfo {
    pub version: Version,
    pub description: String,
    pub script: String,
    pub state: MigrationState,
    pub installed_rank: Option<i32>,
    pub installed_by: Option<String>,
    pub installed_on: Option<DateTime<Utc>>,
    pub execution_time_ms: Option<i32>,
}

impl MigrationInfo {
    fn from_record(record: &HistoryRecord, state: MigrationState) -> Self {
        Self {
            version: record.version.clone(),
            description: record.description.clone(),
            script: record.script.clone(),
            state,
            installed_rank: Some(record.installed_rank),
            installed_by: Some(record.installed_by.clone()),
            installed_on: Some(record.installed_on),
            execution_time_ms: Some(record.execution_time_ms),
        }
    }

    fn from_source(migration: &MigrationDescriptor, state: MigrationState) -> Self {
        Self {
            version: migration.version.clone(),
            description: migration.description.clone(),
            script: migration.script.clone(),
            state,
            installed_rank: None,
            installed_by: None,
            installed_on: None,
            execution_time_ms: None,
        }
    }
}

/// One row per history record in rank order, then one per unapplied script
/// in version order. A script whose only records are failures is already
/// shown by its `Failed` row. Never fails: `info` must work on a broken history.
pub fn describe(
    sources: &[MigrationDescriptor],
    history: &[HistoryRecord],
    out_of_order: bool,
) -> Vec<MigrationInfo> {
    let by_version: HashMap<&Version, &MigrationDescriptor> =
        sources.iter().map(|m| (&m.version, m)).collect();

    let applied: HashSet<&Version> = history
        .iter()
        .filter(|r| r.success)
        .map(|r| &r.version)
        .collect();
    let failed: HashSet<&Version> = history
        .iter()
        .filter(|r| !r.success)
        .map(|r| &r.version)
        .collect();
    let highest_applied = applied.iter().copied().max();
    let baseline = history
        .iter()
        .filter(|r| r.success && r.is_baseline())
        .map(|r| &r.version)
        .max();

    let mut rows = Vec::with_capacity(history.len() + sources.len());

    for record in history {
        let state = if record.is_baseline() {
            MigrationState::Baseline
        } else if !record.success {
            MigrationState::Failed
        } else {
            match by_version.get(&record.version) {
                None => MigrationState::Missing,
                Some(m) if record.checksum.as_deref() != Some(m.checksum.as_str()) => {
                    MigrationState::Drift
                }
                Some(_) => MigrationState::Success,
            }
        };
        rows.push(MigrationInfo::from_record(record, state));
    }

    let mut unapplied: Vec<&MigrationDescriptor> = sources
        .iter()
        .filter(|m| !applied.contains(&m.version) && !failed.contains(&m.version))
        .collect();
    unapplied.sort_by(|a, b| a.version.cmp(&b.version));

    for migration in unapplied {
        let state = if baseline.is_some_and(|b| migration.version <= *b) {
            MigrationState::BelowBaseline
        } else if !out_of_order && highest_applied.is_some_and(|h| migration.version < *h) {
            MigrationState::Ignored
        } else {
            MigrationState::Pending
        };
        rows.push(MigrationInfo::from_source(migration, state));
    }

    rows
}
