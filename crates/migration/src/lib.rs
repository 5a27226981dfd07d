pub mod checksum;
pub mod discovery;
pub mod error;
pub mod model;
pub mod resolve;
pub mod validate;
pub mod version;

pub use checksum::script_checksum;
pub use discovery::discover_migrations;
pub use error::{DiscoveryError, ResolveError, VersionParseError};
pub use model::{HistoryRecord, MigrationDescriptor, NewHistoryRecord, Payload, RecordKind};
pub use resolve::{resolve, MigrationPlan, Mismatch, ResolveOptions};
pub use validate::{validate, Policy, ValidationReport};
pub use version::Version;
