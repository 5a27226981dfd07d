use crate::error::ResolveError;
use crate::model::{HistoryRecord, MigrationDescriptor};
use crate::version::Version;
use core::fmt;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    pub out_of_order: bool,
}

/// Discrepancy between recorded history and the discovered scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    ChecksumDrift {
        version: Version,
        description: String,
        recorded: Option<String>,
        discovered: String,
    },
    MissingSource {
        version: Version,
        description: String,
    },
}

impl Mismatch {
    pub fn version(&self) -> &Version {
        match self {
            Mismatch::ChecksumDrift { version, .. } => version,
            Mismatch::MissingSource { version, .. } => version,
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::ChecksumDrift {
                version,
                recorded,
                discovered,
                ..
            } => write!(
                f,
                "checksum mismatch for version {version} (db={}, fs={discovered})",
                recorded.as_deref().unwrap_or("<none>")
            ),
            Mismatch::MissingSource { version, description } => write!(
                f,
                "version {version} ({description}) is applied in the database but no corresponding migration file was found"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    /// Ascending by version.
    pub pending: Vec<MigrationDescriptor>,
    pub mismatches: Vec<Mismatch>,
    /// Descriptors already applied successfully.
    pub applied: usize,
    /// Descriptors at or below the baseline that will never run.
    pub below_baseline: usize,
    pub baseline: Option<Version>,
    pub current_version: Option<Version>,
}

impl MigrationPlan {
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Merges discovered migrations with recorded history into the plan for one run.
pub fn resolve(
    mut descriptors: Vec<MigrationDescriptor>,
    history: &[HistoryRecord],
    options: ResolveOptions,
) -> Result<MigrationPlan, ResolveError> {
    descriptors.sort_by(|a, b| a.version.cmp(&b.version));

    let mut successful: HashMap<&Version, &HistoryRecord> = HashMap::new();
    let mut failed: Vec<&HistoryRecord> = Vec::new();
    for record in history {
        if record.success {
            successful.insert(&record.version, record);
        } else {
            failed.push(record);
        }
    }

    let baseline = history
        .iter()
        .filter(|r| r.success && r.is_baseline())
        .map(|r| r.version.clone())
        .max();
    let current_version = successful.keys().map(|v| (*v).clone()).max();

    let mut pending = Vec::new();
    let mut mismatches = Vec::new();
    let mut applied = 0usize;
    let mut below_baseline = 0usize;

    for descriptor in &descriptors {
        match successful.get(&descriptor.version) {
            Some(record) if record.is_baseline() => below_baseline += 1,
            Some(record) => {
                applied += 1;
                if record.checksum.as_deref() != Some(descriptor.checksum.as_str()) {
                    mismatches.push(Mismatch::ChecksumDrift {
                        version: descriptor.version.clone(),
                        description: descriptor.description.clone(),
                        recorded: record.checksum.clone(),
                        discovered: descriptor.checksum.clone(),
                    });
                }
            }
            None => match &baseline {
                Some(b) if descriptor.version <= *b => below_baseline += 1,
                _ => pending.push(descriptor.clone()),
            },
        }
    }

    let discovered: HashMap<&Version, &MigrationDescriptor> =
        descriptors.iter().map(|d| (&d.version, d)).collect();
    for record in history.iter().filter(|r| r.success && !r.is_baseline()) {
        if !discovered.contains_key(&record.version) {
            mismatches.push(Mismatch::MissingSource {
                version: record.version.clone(),
                description: record.description.clone(),
            });
        }
    }
    mismatches.sort_by(|a, b| a.version().cmp(b.version()));

    // A failed attempt with no success for its version blocks every run, whether or
    // not its script is still present or anything is pending.
    let blocking = failed
        .iter()
        .filter(|r| !successful.contains_key(&r.version))
        .min_by(|a, b| a.version.cmp(&b.version));

    if let Some(record) = blocking {
        return Err(ResolveError::PendingRepair {
            version: record.version.clone(),
            description: record.description.clone(),
        });
    }

    if !options.out_of_order {
        if let (Some(highest_applied), Some(first_pending)) = (&current_version, pending.first()) {
            if first_pending.version < *highest_applied {
                return Err(ResolveError::OutOfOrder {
                    version: first_pending.version.clone(),
                    highest_applied: highest_applied.clone(),
                });
            }
        }
    }

    Ok(MigrationPlan {
        pending,
        mismatches,
        applied,
        below_baseline,
        baseline,
        current_version,
    })
}
