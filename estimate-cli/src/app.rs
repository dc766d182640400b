//! Command runners behind the `estimates` binary.
//!
//! Estimate edits go through a mounted [`EstimatePanel`], exactly like an
//! interactive client card would: load, catalog prices, edit, debounced save
//! (flushed before returning).

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use estimate_core::db::{MemoryStoreFactory, StoreRegistry};
use estimate_core::{
    CatalogEntry, ChangeKind, CostField, EstimateDocument, EstimateKind, EstimatePanel,
    EstimateSchema, EstimateStore, ItemField, PanelConfig,
};
use estimate_data::{CatalogLoader, LoadSummary};
use estimate_db_sqlite::SqliteStoreFactory;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::utils::resolve_row;

/// Build a [`StoreRegistry`] with every backend this binary can talk to.
pub fn build_registry() -> StoreRegistry {
    let mut registry = StoreRegistry::new();
    registry.register(Box::new(MemoryStoreFactory));
    registry.register(Box::new(SqliteStoreFactory));
    registry
}

/// A client's estimate as printed by the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateReport {
    pub kind: EstimateKind,
    pub client_id: String,
    pub document: EstimateDocument,
}

impl fmt::Display for EstimateReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(f, "{} ({}), client {}", self.kind.title(), self.kind, self.client_id)?;
        for (index, item) in self.document.items.iter().enumerate() {
            writeln!(
                f,
                "{:>3}. {:<60} {:>10} {:<5} x {:>10} = {:>12}",
                index + 1,
                item.name,
                item.quantity,
                item.unit,
                item.price,
                item.total
            )?;
        }
        writeln!(f, "Materials:          {}", self.document.total_materials_cost)?;
        for (field, value) in self.document.extra_costs() {
            writeln!(f, "{:<20}{}", format!("{}:", field.label()), value)?;
        }
        writeln!(f, "Total:              {}", self.document.total_cost)?;
        if let Some(updated_at) = self.document.updated_at {
            writeln!(f, "Updated:            {}", updated_at.to_rfc3339())?;
        }
        Ok(())
    }
}

/// Line per estimate kind: slug, title, collection and extra cost fields.
pub fn describe_kinds() -> String {
    EstimateKind::all()
        .iter()
        .map(|kind| {
            let schema = EstimateSchema::for_kind(*kind);
            let costs: Vec<&str> = schema.extra_costs.iter().map(|(field, _)| field.slug()).collect();
            format!(
                "{:<12} {:<20} {:<20} rows: {:>2}, synced: {:>2}, costs: {}",
                kind.as_str(),
                kind.title(),
                kind.collection(),
                schema.items.len(),
                schema.synced_products.len(),
                costs.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

async fn mount_ready(
    store: &Arc<dyn EstimateStore>,
    kind: EstimateKind,
    client_id: &str,
    config: PanelConfig,
) -> EstimatePanel {
    let panel = EstimatePanel::mount(EstimateSchema::for_kind(kind), client_id, Arc::clone(store), config);
    panel.wait_ready().await;
    panel
}

fn report(panel: &EstimatePanel) -> EstimateReport {
    EstimateReport {
        kind: panel.kind(),
        client_id: panel.client_id(),
        document: panel.state(),
    }
}

/// The estimate as a client card would show it: stored values, or the
/// defaults when nothing is stored, priced from the current catalog.
pub async fn show_estimate(
    store: &Arc<dyn EstimateStore>,
    kind: EstimateKind,
    client_id: &str,
) -> Result<EstimateReport> {
    let panel = mount_ready(store, kind, client_id, PanelConfig::default()).await;
    let report = report(&panel);
    panel.unmount();
    Ok(report)
}

/// Edit one row and save the result.
pub async fn set_item(
    store: &Arc<dyn EstimateStore>,
    kind: EstimateKind,
    client_id: &str,
    row: &str,
    field: ItemField,
    value: Decimal,
    config: PanelConfig,
) -> Result<EstimateReport> {
    let panel = mount_ready(store, kind, client_id, config).await;
    let index = resolve_row(&panel.state(), row)?;
    panel
        .update_item(index, field, value)
        .with_context(|| format!("cannot set {} of row {row}", field.as_str()))?;
    debug!(%kind, client_id, index, field = field.as_str(), %value, "row updated");

    panel.flush().await;
    let report = report(&panel);
    panel.unmount();
    Ok(report)
}

/// Edit one extra cost field and save the result.
pub async fn set_cost(
    store: &Arc<dyn EstimateStore>,
    kind: EstimateKind,
    client_id: &str,
    field: CostField,
    value: Decimal,
    config: PanelConfig,
) -> Result<EstimateReport> {
    let panel = mount_ready(store, kind, client_id, config).await;
    panel
        .update_extra_cost(field, value)
        .with_context(|| format!("cannot set {} on a {kind} estimate", field.slug()))?;

    panel.flush().await;
    let report = report(&panel);
    panel.unmount();
    Ok(report)
}

/// Set one catalog price. Open panels on synced rows follow it.
pub async fn set_price(
    store: &dyn EstimateStore,
    name: &str,
    price: Decimal,
) -> Result<ChangeKind> {
    let entry = CatalogEntry::new(name.trim(), price);
    let kind = store
        .upsert_product(&entry)
        .await
        .with_context(|| format!("failed to set price of '{}'", entry.name))?;
    info!(name = %entry.name, %price, ?kind, "catalog price set");
    Ok(kind)
}

/// Remove one product from the catalog. Returns whether it existed.
pub async fn remove_price(
    store: &dyn EstimateStore,
    name: &str,
) -> Result<bool> {
    store
        .remove_product(name.trim())
        .await
        .with_context(|| format!("failed to remove '{}'", name.trim()))
}

/// Every catalog product, sorted by name.
pub async fn list_prices(store: &dyn EstimateStore) -> Result<Vec<CatalogEntry>> {
    store.list_products().await.context("failed to list catalog")
}

/// Load a `name,price` CSV into the catalog.
pub async fn import_prices(
    store: &dyn EstimateStore,
    path: &Path,
) -> Result<LoadSummary> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("cannot open price list '{}'", path.display()))?;
    let records = CatalogLoader::parse(file)
        .with_context(|| format!("cannot parse price list '{}'", path.display()))?;
    let summary = CatalogLoader::load(store, &records).await?;
    info!(
        file = %path.display(),
        added = summary.added,
        modified = summary.modified,
        unchanged = summary.unchanged,
        "price list imported"
    );
    Ok(summary)
}
