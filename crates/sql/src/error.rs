use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqlStatementParseError {
    #[error("sql tokenize failed{}: {message}; sql={sql_snippet}", source_suffix(.source_name))]
    TokenizeFailed {
        source_name: Option<String>,
        message: String,
        sql_snippet: String,
    },
    #[error("script contains no statements{}", source_suffix(.source_name))]
    EmptyScript { source_name: Option<String> },
}

fn source_suffix(source_name: &Option<String>) -> String {
    match source_name {
        Some(name) => format!(" ({name})"),
        None => String::new(),
    }
}

pub fn sql_snippet(sql: &str) -> String {
    const MAX_CHARS: usize = 200;
    let trimmed = sql.trim();

    let mut out = String::with_capacity(trimmed.len().min(MAX_CHARS) + 1);
    for (i, ch) in trimmed.chars().enumerate() {
        if i >= MAX_CHARS {
            out.push('…');
            break;
        }

        match ch {
            '\n' | '\r' | '\t' => out.push(' '),
            _ => out.push(ch),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::sql_snippet;

    #[test]
    fn snippet_flattens_whitespace_and_truncates() {
        assert_eq!(sql_snippet("  select\n1;\t"), "select 1;");

        let long = "x".repeat(250);
        let snippet = sql_snippet(&long);
        assert_eq!(snippet.chars().count(), 201);
        assert!(snippet.ends_with('…'));
    }
}
