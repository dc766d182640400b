mod catalog_entry;
mod estimate_document;
mod estimate_kind;
mod line_item;

pub use catalog_entry::{CatalogChange, CatalogEntry, ChangeKind};
pub use estimate_document::{CostField, EstimateDocument};
pub use estimate_kind::EstimateKind;
pub use line_item::{ItemField, LineItem};
