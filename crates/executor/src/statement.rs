use crate::target::Target;
use core::time::Duration;
use keel_sql::{is_transaction_control, sql_snippet, SqlStatement};

/// Why a migration's payload failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementFailure {
    pub statement_ordinal: Option<i32>,
    pub statement: Option<String>,
    pub message: String,
}

pub fn duration_ms(d: Duration) -> i32 {
    let ms = d.as_millis();
    if ms > i32::MAX as u128 {
        i32::MAX
    } else {
        ms as i32
    }
}

/// Runs every statement in order, stopping at the first failure.
pub async fn execute_all<T: Target + ?Sized>(
    target: &mut T,
    statements: &[SqlStatement],
) -> Result<(), StatementFailure> {
    for stmt in statements {
        if is_transaction_control(stmt) {
            return Err(StatementFailure {
                statement_ordinal: Some(stmt.ordinal),
                statement: Some(sql_snippet(&stmt.sql)),
                message: "transaction control statements are not allowed inside migration scripts"
                    .to_string(),
            });
        }

        if let Err(e) = target.execute(stmt).await {
            return Err(StatementFailure {
                statement_ordinal: Some(stmt.ordinal),
                statement: Some(sql_snippet(&stmt.sql)),
                message: e.message,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::duration_ms;
    use core::time::Duration;

    #[test]
    fn duration_ms_saturates() {
        assert_eq!(duration_ms(Duration::from_millis(1500)), 1500);
        assert_eq!(duration_ms(Duration::from_secs(u64::MAX / 2)), i32::MAX);
    }
}
