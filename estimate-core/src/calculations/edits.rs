//! Mutations applied to an [`EstimateDocument`].
//!
//! Every function here keeps the document's derived totals consistent with
//! its rows before returning. Flat-fee rows (empty unit) never have their
//! total derived from quantity and price.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::calculations::totals::{refresh_total_cost, refresh_totals};
use crate::models::{CatalogEntry, CostField, EstimateDocument, ItemField};

/// Errors raised by an edit that cannot be applied to the current document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EstimateError {
    #[error("row {index} is out of range (estimate has {len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    #[error("cost field '{0}' is not part of this estimate")]
    UnsupportedCostField(CostField),
}

/// Apply a user edit to one row and refresh the document totals.
///
/// * `Quantity`: total becomes `value * price`.
/// * `Price`: total becomes `quantity * value`.
/// * `Total`: total is set to `value` as given.
///
/// Values are taken as-is; negative input is not clamped.
pub fn apply_item_edit(
    doc: &mut EstimateDocument,
    index: usize,
    field: ItemField,
    value: Decimal,
) -> Result<(), EstimateError> {
    let len = doc.items.len();
    let item = doc
        .items
        .get_mut(index)
        .ok_or(EstimateError::RowOutOfRange { index, len })?;

    match field {
        ItemField::Quantity => {
            item.quantity = value;
            if !item.is_flat_fee() {
                item.total = value * item.price;
            }
        }
        ItemField::Price => {
            item.price = value;
            if !item.is_flat_fee() {
                item.total = item.quantity * value;
            }
        }
        ItemField::Total => item.total = value,
    }

    refresh_totals(doc);
    Ok(())
}

/// Set an extra cost field and refresh `total_cost` only.
pub fn apply_extra_cost(
    doc: &mut EstimateDocument,
    field: CostField,
    value: Decimal,
) -> Result<(), EstimateError> {
    let slot = doc.extra_cost_mut(field);
    if slot.is_none() {
        return Err(EstimateError::UnsupportedCostField(field));
    }
    *slot = Some(value);

    refresh_total_cost(doc);
    Ok(())
}

/// Push a catalog price into every row with the same name.
///
/// Returns the number of rows touched. When nothing matches the document is
/// left exactly as it was, totals included.
pub fn apply_catalog_price(
    doc: &mut EstimateDocument,
    entry: &CatalogEntry,
) -> usize {
    let mut touched = 0;
    for item in doc.items.iter_mut().filter(|item| item.name == entry.name) {
        item.price = entry.price;
        if !item.is_flat_fee() {
            item.total = item.quantity * entry.price;
        }
        touched += 1;
    }

    if touched > 0 {
        refresh_totals(doc);
    }
    touched
}
