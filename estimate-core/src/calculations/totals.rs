//! Document-level aggregation.
//!
//! An estimate keeps two derived figures: the materials cost (sum of every
//! row total, flat fees included) and the total cost (materials plus the
//! kind-specific extra costs).

use rust_decimal::Decimal;

use crate::models::{EstimateDocument, LineItem};

/// Sum of every row total.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use estimate_core::LineItem;
/// use estimate_core::calculations::totals::materials_cost;
///
/// let items = vec![
///     LineItem::new("Карандаши", "шт", dec!(5), dec!(100), dec!(500)),
///     LineItem::new("Вывоз мусора", "", dec!(0), dec!(0), dec!(20000)),
/// ];
/// assert_eq!(materials_cost(&items), dec!(20500));
/// ```
pub fn materials_cost(items: &[LineItem]) -> Decimal {
    items.iter().map(|item| item.total).sum()
}

/// Sum of the extra cost fields the document carries.
pub fn extra_costs(doc: &EstimateDocument) -> Decimal {
    doc.extra_costs().into_iter().map(|(_, value)| value).sum()
}

/// Recompute only `total_cost` from the current materials cost.
pub fn refresh_total_cost(doc: &mut EstimateDocument) {
    doc.total_cost = doc.total_materials_cost + extra_costs(doc);
}

/// Recompute `total_materials_cost` from the rows, then `total_cost`.
pub fn refresh_totals(doc: &mut EstimateDocument) {
    doc.total_materials_cost = materials_cost(&doc.items);
    refresh_total_cost(doc);
}
