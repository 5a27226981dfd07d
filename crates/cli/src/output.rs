use crate::error::CliError;
use serde::Serialize;
use std::io::Write;

pub fn line(message: impl AsRef<str>) {
    println!("{}", message.as_ref());
}

pub fn error(message: impl AsRef<str>) {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{}", message.as_ref());
}

/// Pretty JSON on stdout; human output and logs stay off stdout in this mode.
pub fn json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value).map_err(|e| {
        CliError::user_error("Failed to render JSON output").with_reason(e.to_string())
    })?;
    line(rendered);
    Ok(())
}
