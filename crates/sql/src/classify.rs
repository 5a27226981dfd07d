use crate::model::SqlStatement;

pub fn is_transaction_control(stmt: &SqlStatement) -> bool {
    matches!(
        stmt.kind(),
        "BEGIN" | "COMMIT" | "ROLLBACK" | "START" | "END" | "ABORT" | "SAVEPOINT" | "RELEASE"
    )
}

/// Returns why PostgreSQL refuses to run `stmt` inside a transaction block,
/// or `None` when it can.
pub fn autocommit_reason(stmt: &SqlStatement) -> Option<&'static str> {
    let words: Vec<&str> = stmt.leading_words.iter().map(String::as_str).collect();
    let concurrently = words.contains(&"CONCURRENTLY");

    match words.as_slice() {
        ["CREATE", "INDEX", ..] | ["CREATE", "UNIQUE", "INDEX", ..] if concurrently => {
            Some("CREATE INDEX CONCURRENTLY")
        }
        ["DROP", "INDEX", ..] if concurrently => Some("DROP INDEX CONCURRENTLY"),
        ["REINDEX", ..] if concurrently => Some("REINDEX CONCURRENTLY"),
        ["VACUUM", ..] => Some("VACUUM"),
        ["CREATE", "DATABASE", ..] => Some("CREATE DATABASE"),
        ["DROP", "DATABASE", ..] => Some("DROP DATABASE"),
        ["CREATE", "TABLESPACE", ..] => Some("CREATE TABLESPACE"),
        ["DROP", "TABLESPACE", ..] => Some("DROP TABLESPACE"),
        ["ALTER", "SYSTEM", ..] => Some("ALTER SYSTEM"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{autocommit_reason, is_transaction_control};
    use crate::split_statements;

    fn first(sql: &str) -> crate::SqlStatement {
        split_statements(sql, None).unwrap().remove(0)
    }

    #[test]
    fn detects_statements_that_need_autocommit() {
        assert_eq!(
            autocommit_reason(&first("create unique index concurrently ix on t (a)")),
            Some("CREATE INDEX CONCURRENTLY")
        );
        assert_eq!(
            autocommit_reason(&first("DROP INDEX CONCURRENTLY IF EXISTS ix")),
            Some("DROP INDEX CONCURRENTLY")
        );
        assert_eq!(autocommit_reason(&first("VACUUM ANALYZE t")), Some("VACUUM"));
        assert_eq!(autocommit_reason(&first("CREATE INDEX ix ON t (a)")), None);
        assert_eq!(autocommit_reason(&first("ALTER TABLE t ADD COLUMN b int")), None);
    }

    #[test]
    fn detects_transaction_control() {
        assert!(is_transaction_control(&first("BEGIN")));
        assert!(is_transaction_control(&first("commit")));
        assert!(!is_transaction_control(&first("SELECT 1")));
    }
}
