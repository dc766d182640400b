//! The in-memory estimate a panel edits.
//!
//! The document lives in a `watch` channel. Every mutation is applied to the
//! current snapshot in place and tagged with where it came from, so the
//! persistence side can tell a user edit from a wholesale load.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::watch;

use crate::calculations::{EstimateError, apply_catalog_price, apply_extra_cost, apply_item_edit};
use crate::models::{CatalogChange, CostField, EstimateDocument, ItemField};
use crate::schemas::EstimateSchema;

/// What produced the current snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    Seed,
    Load,
    Edit,
    Catalog,
}

impl ChangeOrigin {
    /// Whether a snapshot from this origin has to be written back.
    pub fn needs_save(&self) -> bool {
        matches!(self, Self::Edit | Self::Catalog)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EstimateSnapshot {
    pub document: EstimateDocument,
    pub origin: ChangeOrigin,
    /// Bumped by every change to the document.
    pub revision: u64,
    /// Bumped by every reset to the seed, i.e. once per client switch.
    pub generation: u64,
}

pub struct EstimateState {
    schema: Arc<EstimateSchema>,
    tx: watch::Sender<EstimateSnapshot>,
}

impl EstimateState {
    /// Start from the schema's seed document.
    pub fn new(schema: Arc<EstimateSchema>) -> Self {
        let (tx, _) = watch::channel(EstimateSnapshot {
            document: schema.seed_document(),
            origin: ChangeOrigin::Seed,
            revision: 0,
            generation: 0,
        });
        Self { schema, tx }
    }

    pub fn schema(&self) -> &EstimateSchema {
        &self.schema
    }

    pub fn get_state(&self) -> EstimateDocument {
        self.tx.borrow().document.clone()
    }

    pub fn origin(&self) -> ChangeOrigin {
        self.tx.borrow().origin
    }

    pub fn snapshot(&self) -> EstimateSnapshot {
        self.tx.borrow().clone()
    }

    pub fn generation(&self) -> u64 {
        self.tx.borrow().generation
    }

    pub fn subscribe(&self) -> watch::Receiver<EstimateSnapshot> {
        self.tx.subscribe()
    }

    /// Overwrite the whole document with a loaded one.
    pub fn replace(
        &self,
        document: EstimateDocument,
    ) {
        self.tx.send_modify(|snapshot| {
            snapshot.document = document;
            snapshot.origin = ChangeOrigin::Load;
            snapshot.revision += 1;
        });
    }

    /// Like [`replace`](Self::replace), but only while the state is still in
    /// `generation`. A load that resolves after a reset is dropped.
    pub fn replace_in(
        &self,
        generation: u64,
        document: EstimateDocument,
    ) -> bool {
        self.tx.send_if_modified(|snapshot| {
            if snapshot.generation != generation {
                return false;
            }
            snapshot.document = document;
            snapshot.origin = ChangeOrigin::Load;
            snapshot.revision += 1;
            true
        })
    }

    /// Go back to the seed document and start a new generation, which is
    /// returned.
    pub fn reset(&self) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|snapshot| {
            snapshot.document = self.schema.seed_document();
            snapshot.origin = ChangeOrigin::Seed;
            snapshot.revision += 1;
            snapshot.generation += 1;
            generation = snapshot.generation;
        });
        generation
    }

    pub fn update_item(
        &self,
        index: usize,
        field: ItemField,
        value: Decimal,
    ) -> Result<(), EstimateError> {
        let mut result = Ok(());
        self.tx.send_if_modified(|snapshot| {
            match apply_item_edit(&mut snapshot.document, index, field, value) {
                Ok(()) => {
                    snapshot.origin = ChangeOrigin::Edit;
                    snapshot.revision += 1;
                    true
                }
                Err(err) => {
                    result = Err(err);
                    false
                }
            }
        });
        result
    }

    /// Set an extra cost the schema carries. A loaded document that lacks
    /// the field gets it added.
    pub fn update_extra_cost(
        &self,
        field: CostField,
        value: Decimal,
    ) -> Result<(), EstimateError> {
        if !self.schema.supports(field) {
            return Err(EstimateError::UnsupportedCostField(field));
        }

        let mut result = Ok(());
        self.tx.send_if_modified(|snapshot| {
            let slot = snapshot.document.extra_cost_mut(field);
            if slot.is_none() {
                *slot = Some(Decimal::ZERO);
            }
            match apply_extra_cost(&mut snapshot.document, field, value) {
                Ok(()) => {
                    snapshot.origin = ChangeOrigin::Edit;
                    snapshot.revision += 1;
                    true
                }
                Err(err) => {
                    result = Err(err);
                    false
                }
            }
        });
        result
    }

    /// Apply a catalog notification. Returns the number of rows repriced;
    /// subscribers are only notified when that is non-zero.
    pub fn apply_catalog_change(
        &self,
        change: &CatalogChange,
    ) -> usize {
        self.reprice(None, change)
    }

    /// Like [`apply_catalog_change`](Self::apply_catalog_change), but a
    /// notification meant for an earlier generation is dropped.
    pub fn apply_catalog_change_in(
        &self,
        generation: u64,
        change: &CatalogChange,
    ) -> usize {
        self.reprice(Some(generation), change)
    }

    fn reprice(
        &self,
        generation: Option<u64>,
        change: &CatalogChange,
    ) -> usize {
        if !change.carries_price() {
            return 0;
        }

        let mut touched = 0;
        self.tx.send_if_modified(|snapshot| {
            if generation.is_some_and(|generation| generation != snapshot.generation) {
                return false;
            }
            touched = apply_catalog_price(&mut snapshot.document, &change.entry);
            if touched > 0 {
                snapshot.origin = ChangeOrigin::Catalog;
                snapshot.revision += 1;
            }
            touched > 0
        });
        touched
    }
}
