pub mod args;
pub mod commands;
pub mod config;
pub mod error;
pub mod error_view;
pub mod output;
pub mod style;
pub mod ui;

pub use args::{
    BaselineArgs, CleanArgs, Cli, Command, ConfigArgs, InfoArgs, MigrateArgs, RepairArgs,
    ValidateArgs,
};
pub use error::{CliError, ExitCode};
