pub mod baseline;
pub mod clean;
pub mod info;
pub mod migrate;
pub mod repair;
pub mod validate;

use crate::error::CliError;
use keel_core::{Engine, EngineConfig};

fn engine(config: EngineConfig) -> Result<Engine, CliError> {
    Engine::new(config).map_err(CliError::from)
}
