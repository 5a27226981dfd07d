use crate::version::Version;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    #[error("version must not be empty")]
    Empty,
    #[error("invalid segment '{segment}' in version '{version}'")]
    InvalidSegment { version: String, segment: String },
    #[error("segment '{segment}' in version '{version}' is too large")]
    SegmentOverflow { version: String, segment: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("migration location does not exist or is not a directory: {location}")]
    MissingLocation { location: String },
    #[error("invalid migration filename '{filename}': {reason}")]
    InvalidFilename { filename: String, reason: String },
    #[error("invalid version in migration filename '{filename}': {source}")]
    InvalidVersion {
        filename: String,
        source: VersionParseError,
    },
    #[error("duplicate migration version {version}: '{first}' and '{second}'")]
    DuplicateVersion {
        version: String,
        first: String,
        second: String,
    },
    #[error("unreadable migration script '{filename}': {message}")]
    InvalidScript { filename: String, message: String },
    #[error("I/O error while reading '{path}': {message}")]
    Io { path: String, message: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error(
        "migration {version} failed in a previous run ({description}); repair the history before applying new migrations"
    )]
    PendingRepair { version: Version, description: String },
    #[error(
        "migration {version} is lower than the highest applied version {highest_applied} and out-of-order application is disabled"
    )]
    OutOfOrder {
        version: Version,
        highest_applied: Version,
    },
}
