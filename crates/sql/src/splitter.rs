use crate::error::{sql_snippet, SqlStatementParseError};
use crate::model::SqlStatement;
use crate::parser::StatementParser;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::tokenizer::{Location, Token, Tokenizer};

const LEADING_WORDS: usize = 8;

/// Splits scripts on top-level semicolons using the PostgreSQL tokenizer, so
/// semicolons inside quotes, dollar-quoted bodies and comments are kept.
///
/// Tokens only locate the boundaries. Statement text is sliced from the
/// script itself and reaches the database byte for byte.
pub struct TokenizingStatementParser {
    dialect: PostgreSqlDialect,
}

impl TokenizingStatementParser {
    pub fn new() -> Self {
        Self {
            dialect: PostgreSqlDialect {},
        }
    }
}

impl Default for TokenizingStatementParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser for TokenizingStatementParser {
    fn parse_statements(
        &self,
        sql: &str,
        source_name: Option<&str>,
    ) -> Result<Vec<SqlStatement>, SqlStatementParseError> {
        let tokens = Tokenizer::new(&self.dialect, sql)
            .with_unescape(false)
            .tokenize_with_location()
            .map_err(|e| SqlStatementParseError::TokenizeFailed {
                source_name: source_name.map(|s| s.to_string()),
                message: e.to_string(),
                sql_snippet: sql_snippet(sql),
            })?;

        let lines = LineIndex::new(sql);
        let mut out = Vec::new();
        let mut pending = PendingStatement::default();

        for token in tokens {
            match token.token {
                Token::SemiColon => {
                    let end = lines.offset(token.span.start);
                    pending.flush_into(sql, end, &mut out);
                    pending.start = lines.offset(token.span.end);
                }
                Token::Whitespace(_) => {}
                Token::Word(word) => {
                    if pending.leading_words.len() < LEADING_WORDS && word.quote_style.is_none() {
                        pending.leading_words.push(word.value.to_ascii_uppercase());
                    }
                    pending.has_code = true;
                }
                _ => pending.has_code = true,
            }
        }
        pending.flush_into(sql, sql.len(), &mut out);

        if out.is_empty() {
            return Err(SqlStatementParseError::EmptyScript {
                source_name: source_name.map(|s| s.to_string()),
            });
        }

        Ok(out)
    }
}

/// Maps tokenizer locations (1-based line, 1-based column in chars) to byte offsets.
struct LineIndex<'a> {
    sql: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(sql: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(sql.match_indices('\n').map(|(i, _)| i + 1));
        Self { sql, line_starts }
    }

    fn offset(&self, location: Location) -> usize {
        let line = (location.line as usize).saturating_sub(1);
        let Some(&start) = self.line_starts.get(line) else {
            return self.sql.len();
        };
        let column = (location.column as usize).saturating_sub(1);

        self.sql[start..]
            .char_indices()
            .nth(column)
            .map_or(self.sql.len(), |(i, _)| start + i)
    }
}

#[derive(Default)]
struct PendingStatement {
    start: usize,
    leading_words: Vec<String>,
    has_code: bool,
}

impl PendingStatement {
    fn flush_into(&mut self, sql: &str, end: usize, out: &mut Vec<SqlStatement>) {
        let taken = std::mem::take(self);
        if !taken.has_code {
            return;
        }

        let ordinal_usize = out.len().saturating_add(1);
        let ordinal = if ordinal_usize > i32::MAX as usize {
            i32::MAX
        } else {
            ordinal_usize as i32
        };

        let text = sql.get(taken.start..end).unwrap_or_default();
        out.push(SqlStatement {
            ordinal,
            sql: text.trim().to_string(),
            leading_words: taken.leading_words,
        });
    }
}
