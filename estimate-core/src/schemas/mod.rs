//! Estimate schemas.
//!
//! The four estimate kinds share one panel implementation and differ only in
//! the data declared here: the seed rows, which of those rows follow the
//! product catalog, and which extra cost fields the estimate carries.

mod consumables;
mod floor;
mod partition;
mod roof;

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::calculations::totals::refresh_totals;
use crate::models::{CatalogEntry, CostField, EstimateDocument, EstimateKind, LineItem};

/// Everything that distinguishes one estimate kind from another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimateSchema {
    pub kind: EstimateKind,
    /// Rows a fresh estimate starts with, in display order.
    pub items: Vec<LineItem>,
    /// Row names kept in sync with the product catalog.
    pub synced_products: Vec<&'static str>,
    /// Extra cost fields and their default values.
    pub extra_costs: Vec<(CostField, Decimal)>,
}

impl EstimateSchema {
    pub fn for_kind(kind: EstimateKind) -> Self {
        match kind {
            EstimateKind::Consumables => consumables::schema(),
            EstimateKind::Floor => floor::schema(),
            EstimateKind::Partition => partition::schema(),
            EstimateKind::Roof => roof::schema(),
        }
    }

    pub fn collection(&self) -> &'static str {
        self.kind.collection()
    }

    pub fn supports(
        &self,
        field: CostField,
    ) -> bool {
        self.extra_costs.iter().any(|(f, _)| *f == field)
    }

    /// The document a client sees before anything has been saved for them.
    pub fn seed_document(&self) -> EstimateDocument {
        let mut doc = EstimateDocument {
            items: self.items.clone(),
            total_materials_cost: Decimal::ZERO,
            installation_cost: None,
            delivery_cost: None,
            roof_work_cost: None,
            total_cost: Decimal::ZERO,
            created_at: None,
            updated_at: None,
        };
        for (field, value) in &self.extra_costs {
            *doc.extra_cost_mut(*field) = Some(*value);
        }
        refresh_totals(&mut doc);
        doc
    }
}

/// Catalog entries for every synced row across all kinds, priced from the
/// seed rows. A name shared by several kinds takes the first price seen.
pub fn default_catalog() -> Vec<CatalogEntry> {
    let mut prices = BTreeMap::new();
    for kind in EstimateKind::all() {
        let schema = EstimateSchema::for_kind(*kind);
        for item in &schema.items {
            if schema.synced_products.contains(&item.name.as_str()) {
                prices.entry(item.name.clone()).or_insert(item.price);
            }
        }
    }
    prices
        .into_iter()
        .map(|(name, price)| CatalogEntry::new(name, price))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn seed_totals_match_published_figures() {
        let expected = [
            (EstimateKind::Consumables, dec!(518790), dec!(518790)),
            (EstimateKind::Floor, dec!(27310), dec!(57310)),
            (EstimateKind::Partition, dec!(1563486), dec!(1593486)),
            (EstimateKind::Roof, dec!(96698), dec!(156698)),
        ];

        for (kind, materials, total) in expected {
            let doc = EstimateSchema::for_kind(kind).seed_document();
            assert_eq!(doc.total_materials_cost, materials, "{kind} materials");
            assert_eq!(doc.total_cost, total, "{kind} total");
        }
    }

    #[test]
    fn row_names_are_unique_within_each_schema() {
        for kind in EstimateKind::all() {
            let schema = EstimateSchema::for_kind(*kind);
            let names: HashSet<_> = schema.items.iter().map(|i| i.name.as_str()).collect();
            assert_eq!(names.len(), schema.items.len(), "{kind} has duplicate rows");
        }
    }

    #[test]
    fn synced_products_name_existing_rows() {
        for kind in EstimateKind::all() {
            let schema = EstimateSchema::for_kind(*kind);
            for name in &schema.synced_products {
                assert!(
                    schema.items.iter().any(|i| i.name == *name),
                    "{kind}: synced product '{name}' has no row"
                );
            }
        }
    }

    #[test]
    fn flat_fees_are_never_synced() {
        for kind in EstimateKind::all() {
            let schema = EstimateSchema::for_kind(*kind);
            for item in schema.items.iter().filter(|i| i.is_flat_fee()) {
                assert!(!schema.synced_products.contains(&item.name.as_str()));
            }
        }
    }

    #[test]
    fn extra_cost_fields_per_kind() {
        let consumables = EstimateSchema::for_kind(EstimateKind::Consumables);
        let roof = EstimateSchema::for_kind(EstimateKind::Roof);
        let floor = EstimateSchema::for_kind(EstimateKind::Floor);

        assert!(consumables.extra_costs.is_empty());
        assert!(roof.supports(CostField::RoofWork));
        assert!(roof.supports(CostField::Delivery));
        assert!(!roof.supports(CostField::Installation));
        assert!(floor.supports(CostField::Installation));
        assert!(!floor.supports(CostField::RoofWork));
    }

    #[test]
    fn roof_skips_unsynced_fasteners() {
        let roof = EstimateSchema::for_kind(EstimateKind::Roof);

        assert_eq!(roof.synced_products.len(), 16);
        assert!(!roof.synced_products.contains(&"Гвозди 120"));
        assert!(!roof.synced_products.contains(&"Шурупы 4 крупная резьба"));
    }

    #[test]
    fn default_catalog_covers_every_synced_row() {
        let catalog = default_catalog();

        for kind in EstimateKind::all() {
            for name in EstimateSchema::for_kind(*kind).synced_products {
                assert!(catalog.iter().any(|e| e.name == name), "{name} missing");
            }
        }
        let anchors = catalog
            .iter()
            .find(|e| e.name == "Анкера 12x150 (Для крепления обвязки к фундаменту)")
            .unwrap();
        assert_eq!(anchors.price, dec!(220));
    }
}
