pub mod calculations;
pub mod db;
pub mod models;
pub mod panel;
pub mod schemas;

pub use calculations::EstimateError;
pub use db::repository::{EstimateStore, StoreError};
pub use models::*;
pub use panel::{EstimatePanel, PanelConfig};
pub use schemas::EstimateSchema;
