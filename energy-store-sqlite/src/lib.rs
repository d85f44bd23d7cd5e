//! SQLite backend for the energy record store.

mod decimal;
pub mod factory;
pub mod store;

pub use factory::SqliteStoreFactory;
pub use store::{DEFAULT_SESSION_TTL_DAYS, SqliteRecordStore};
