pub mod error;
pub mod ident;
pub mod store;

pub use error::HistoryStoreError;
pub use ident::{quote_ident, validate_ident};
pub use store::{HistoryStore, DEFAULT_TABLE};
