//! Bulk catalog price loading.

pub mod loader;

pub use loader::{CatalogLoader, CatalogLoaderError, LoadSummary, PriceRecord};
