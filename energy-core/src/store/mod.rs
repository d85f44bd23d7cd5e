pub mod factory;
pub mod record_store;

pub use factory::{RecordStoreFactory, StoreConfig, StoreRegistry};
pub use record_store::{AuthError, MIN_PASSWORD_LEN, RecordStore, StoreError, ensure_owner};
