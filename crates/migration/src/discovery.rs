use crate::checksum::script_checksum;
use crate::error::DiscoveryError;
use crate::model::{MigrationDescriptor, Payload};
use crate::version::Version;
use keel_sql::{autocommit_reason, split_statements, SqlStatement};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const NO_TRANSACTION_DIRECTIVE: &str = "-- keel:no-transaction";

/// Scans `locations` in order and returns every versioned migration sorted
/// ascending by version.
///
/// Only `V*.sql` files take part; anything else in a location is ignored.
pub fn discover_migrations<P: AsRef<Path>>(
    locations: &[P],
) -> Result<Vec<MigrationDescriptor>, DiscoveryError> {
    let mut seen: HashMap<Version, String> = HashMap::new();
    let mut out = Vec::new();

    for location in locations {
        let location = location.as_ref();
        for path in list_scripts(location)? {
            let migration = load_migration(location, &path)?;

            let qualified = path.display().to_string();
            if let Some(first) = seen.insert(migration.version.clone(), qualified.clone()) {
                return Err(DiscoveryError::DuplicateVersion {
                    version: migration.version.to_string(),
                    first,
                    second: qualified,
                });
            }

            out.push(migration);
        }
    }

    out.sort_by(|a, b| a.version.cmp(&b.version));

    if out.is_empty() {
        tracing::warn!(locations = locations.len(), "no migrations discovered");
    }

    Ok(out)
}

fn list_scripts(location: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !location.is_dir() {
        return Err(DiscoveryError::MissingLocation {
            location: location.display().to_string(),
        });
    }

    let dir_display = location.display().to_string();
    let entries = fs::read_dir(location).map_err(|e| DiscoveryError::Io {
        path: dir_display.clone(),
        message: e.to_string(),
    })?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DiscoveryError::Io {
            path: dir_display.clone(),
            message: e.to_string(),
        })?;

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let filename = path.file_name().map(|s| s.to_string_lossy()).unwrap_or_default();
        if filename.starts_with('V') && filename.ends_with(".sql") {
            files.push(path);
        } else {
            tracing::debug!(file = %path.display(), "skipping non-migration file");
        }
    }

    files.sort();
    Ok(files)
}

fn load_migration(location: &Path, path: &Path) -> Result<MigrationDescriptor, DiscoveryError> {
    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| DiscoveryError::Io {
            path: path.display().to_string(),
            message: "missing filename".to_string(),
        })?;

    let (version, description) = parse_filename(&filename)?;

    let bytes = fs::read(path).map_err(|e| DiscoveryError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let checksum = script_checksum(&bytes);
    let sql = String::from_utf8(bytes).map_err(|e| DiscoveryError::Io {
        path: path.display().to_string(),
        message: format!("file is not valid UTF-8: {e}"),
    })?;

    let statements =
        split_statements(&sql, Some(&filename)).map_err(|e| DiscoveryError::InvalidScript {
            filename: filename.clone(),
            message: e.to_string(),
        })?;

    Ok(MigrationDescriptor {
        version,
        description,
        payload: build_payload(&sql, statements),
        script: filename,
        location: location.to_path_buf(),
        checksum,
    })
}

pub(crate) fn parse_filename(filename: &str) -> Result<(Version, String), DiscoveryError> {
    let invalid = |reason: &str| DiscoveryError::InvalidFilename {
        filename: filename.to_string(),
        reason: reason.to_string(),
    };

    let base = filename
        .strip_prefix('V')
        .and_then(|rest| rest.strip_suffix(".sql"))
        .ok_or_else(|| invalid("expected format V<version>__<description>.sql"))?;

    let (version_str, description) = base
        .split_once("__")
        .ok_or_else(|| invalid("expected format V<version>__<description>.sql"))?;

    let description = description.replace('_', " ").trim().to_string();
    if description.is_empty() {
        return Err(invalid("description must not be empty"));
    }

    let version = Version::parse(version_str).map_err(|source| DiscoveryError::InvalidVersion {
        filename: filename.to_string(),
        source,
    })?;

    Ok((version, description))
}

fn build_payload(sql: &str, statements: Vec<SqlStatement>) -> Payload {
    if has_no_transaction_directive(sql) {
        return Payload::NonTransactional {
            statements,
            reason: "keel:no-transaction directive".to_string(),
        };
    }

    let reason = statements
        .iter()
        .find_map(|s| autocommit_reason(s).map(|r| format!("{r} (statement {})", s.ordinal)));

    match reason {
        Some(reason) => Payload::NonTransactional { statements, reason },
        None => Payload::Transactional { statements },
    }
}

/// The directive must appear in the comment header, before the first statement.
fn has_no_transaction_directive(sql: &str) -> bool {
    for line in sql.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !line.starts_with("--") {
            return false;
        }
        if line.eq_ignore_ascii_case(NO_TRANSACTION_DIRECTIVE) {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::{discover_migrations, parse_filename};
    use crate::error::DiscoveryError;
    use crate::version::Version;
    use std::fs;

    #[test]
    fn missing_location_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = discover_migrations(&[tmp.path().join("nope")]).unwrap_err();
        assert!(matches!(err, DiscoveryError::MissingLocation { .. }));
    }

    #[test]
    fn empty_location_yields_no_migrations() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("README.md"), b"docs").unwrap();
        let migrations = discover_migrations(&[tmp.path()]).unwrap();
        assert!(migrations.is_empty());
    }

    #[test]
    fn parses_version_and_description() {
        let (version, description) = parse_filename("V1_2__add_users_table.sql").unwrap();
        assert_eq!(version, Version::parse("1.2").unwrap());
        assert_eq!(description, "add users table");
    }

    #[test]
    fn invalid_filenames_are_errors() {
        assert!(matches!(
            parse_filename("V1_init.sql"),
            Err(DiscoveryError::InvalidFilename { .. })
        ));
        assert!(matches!(
            parse_filename("V2__.sql"),
            Err(DiscoveryError::InvalidFilename { .. })
        ));
        assert!(matches!(
            parse_filename("Vx.1__init.sql"),
            Err(DiscoveryError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn sorts_numerically_regardless_of_file_order() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("V2__b.sql"), b"select 2;").unwrap();
        fs::write(tmp.path().join("V10__c.sql"), b"select 10;").unwrap();
        fs::write(tmp.path().join("V1.10__e.sql"), b"select 110;").unwrap();
        fs::write(tmp.path().join("V1.2__d.sql"), b"select 12;").unwrap();
        fs::write(tmp.path().join("V1__a.sql"), b"select 1;").unwrap();

        let migrations = discover_migrations(&[tmp.path()]).unwrap();
        let versions: Vec<String> = migrations.iter().map(|m| m.version.to_string()).collect();
        assert_eq!(versions, vec!["1", "1.2", "1.10", "2", "10"]);
    }

    #[test]
    fn duplicate_versions_across_locations_are_rejected() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        fs::write(a.path().join("V1__a.sql"), b"select 1;").unwrap();
        fs::write(b.path().join("V1.0__same.sql"), b"select 1;").unwrap();

        let err = discover_migrations(&[a.path(), b.path()]).unwrap_err();
        match err {
            DiscoveryError::DuplicateVersion { first, second, .. } => {
                assert!(first.ends_with("V1__a.sql"));
                assert!(second.ends_with("V1.0__same.sql"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn detects_non_transactional_payloads() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("V1__index.sql"),
            b"CREATE INDEX CONCURRENTLY ix_a ON a (id);",
        )
        .unwrap();
        fs::write(
            tmp.path().join("V2__directive.sql"),
            b"-- keel:no-transaction\nUPDATE a SET id = id;",
        )
        .unwrap();
        fs::write(tmp.path().join("V3__plain.sql"), b"CREATE TABLE b (id int);").unwrap();

        let migrations = discover_migrations(&[tmp.path()]).unwrap();
        assert!(!migrations[0].payload.transactional());
        assert!(!migrations[1].payload.transactional());
        assert!(migrations[2].payload.transactional());
    }

    #[test]
    fn directive_after_first_statement_is_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("V1__late.sql"),
            b"SELECT 1;\n-- keel:no-transaction\nSELECT 2;",
        )
        .unwrap();

        let migrations = discover_migrations(&[tmp.path()]).unwrap();
        assert!(migrations[0].payload.transactional());
        assert_eq!(migrations[0].payload.statements().len(), 2);
    }

    #[test]
    fn non_utf8_payload_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("V1__bin.sql"), [0xff, 0xfe, 0x00]).unwrap();
        let err = discover_migrations(&[tmp.path()]).unwrap_err();
        assert!(matches!(err, DiscoveryError::Io { .. }));
    }
}
