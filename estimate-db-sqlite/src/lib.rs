//! SQLite backend for the estimate document store.

pub mod decimal;
pub mod factory;
pub mod repository;

pub use factory::{SqliteStoreFactory, database_url};
pub use repository::SqliteStore;
