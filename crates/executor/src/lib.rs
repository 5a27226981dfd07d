pub mod error;
pub mod postgres;
pub mod runner;
pub mod statement;
pub mod target;
pub mod transaction;

pub use error::ExecutorError;
pub use postgres::PgTarget;
pub use runner::{AppliedMigration, ExecutionReport, Executor, FailedMigration};
pub use target::{Target, TargetError};
