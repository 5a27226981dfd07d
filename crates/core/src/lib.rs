pub mod config;
pub mod engine;
pub mod error;
pub mod info;

pub use config::{ConfigError, EngineConfig};
pub use engine::{BaselineOutcome, Engine, MigrateOutcome, RepairReport};
pub use error::EngineError;
pub use info::{describe, MigrationInfo, MigrationState};
