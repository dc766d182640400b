pub mod document;
pub mod factory;
pub mod feed;
pub mod memory;
pub mod repository;

pub use document::{PreparedEstimate, prepare_for_save, restore_document, restore_document_str};
pub use factory::{StoreConfig, StoreFactory, StoreRegistry};
pub use feed::{catalog_channel, spawn_catalog_feed};
pub use memory::{MemoryStore, MemoryStoreFactory};
pub use repository::{
    CatalogCallback, CatalogFilter, CatalogSubscription, EstimateStore, StoreError,
};
