pub mod classify;
pub mod error;
pub mod model;
pub mod parser;
pub mod splitter;

pub use classify::{autocommit_reason, is_transaction_control};
pub use error::{sql_snippet, SqlStatementParseError};
pub use model::SqlStatement;
pub use parser::StatementParser;
pub use splitter::TokenizingStatementParser;

/// Splits `sql` with the default parser.
pub fn split_statements(
    sql: &str,
    source_name: Option<&str>,
) -> Result<Vec<SqlStatement>, SqlStatementParseError> {
    TokenizingStatementParser::new().parse_statements(sql, source_name)
}
