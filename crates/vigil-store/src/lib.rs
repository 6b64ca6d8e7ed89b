pub mod error;
pub mod memory;
pub mod redb_store;
pub mod store;

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use redb_store::{migrate, RedbStore};
pub use store::{Store, StoreStats};
