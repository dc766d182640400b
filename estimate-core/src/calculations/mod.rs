//! Estimate arithmetic.
//!
//! `totals` derives the materials and total cost of a document; `edits`
//! applies user edits and catalog prices on top of it.

pub mod edits;
pub mod totals;

pub use edits::{EstimateError, apply_catalog_price, apply_extra_cost, apply_item_edit};
