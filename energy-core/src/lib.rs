pub mod analytics;
pub mod form;
pub mod models;
pub mod store;

#[cfg(test)]
mod test_support;

pub use models::*;
pub use store::record_store::{AuthError, RecordStore, StoreError};
