#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    /// 1-based position inside the script.
    pub ordinal: i32,
    pub sql: String,
    /// Unquoted leading words, uppercased; enough to classify the statement.
    pub leading_words: Vec<String>,
}

impl SqlStatement {
    pub fn kind(&self) -> &str {
        self.leading_words.first().map(String::as_str).unwrap_or("UNKNOWN")
    }
}
