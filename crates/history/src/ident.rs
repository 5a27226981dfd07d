use crate::error::HistoryStoreError;

const MAX_IDENT_LEN: usize = 63;

/// Accepts plain identifiers only: `[A-Za-z_][A-Za-z0-9_]*`, at most 63 bytes.
pub fn validate_ident(name: &str) -> Result<(), HistoryStoreError> {
    let invalid = |reason: &str| HistoryStoreError::InvalidIdentifier {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let mut chars = name.chars();
    match chars.next() {
        None => return Err(invalid("must not be empty")),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
            return Err(invalid("must start with a letter or underscore"))
        }
        Some(_) => {}
    }

    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid("only ASCII letters, digits and underscores are allowed"));
    }

    if name.len() > MAX_IDENT_LEN {
        return Err(invalid("longer than 63 bytes"));
    }

    Ok(())
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
