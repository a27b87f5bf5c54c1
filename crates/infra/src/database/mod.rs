//! SQLite persistence

pub mod kv_store;
pub mod manager;

pub use kv_store::SqliteStore;
pub use manager::DbManager;
