//! SQLite persistence adapter.

mod store;

pub use store::SqliteStore;
