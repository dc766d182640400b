//! Keeps synced rows priced from the product catalog.
//!
//! A subscription is opened each time a client's estimate finishes loading,
//! so the loaded document is repriced from the catalog before live changes
//! start arriving. It is released as soon as the panel switches client, and
//! its notifications only ever reach the generation it was opened for.

use std::sync::{Arc, Weak};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::db::{CatalogCallback, CatalogFilter, EstimateStore};
use crate::models::CatalogChange;
use crate::panel::state::EstimateState;

pub struct CatalogSync {
    task: Option<JoinHandle<()>>,
    primed: watch::Receiver<Option<String>>,
}

impl CatalogSync {
    /// Spawn the sync task. `loaded` reports the client whose estimate has
    /// finished loading; see [`PersistenceBridge::loaded_client`].
    ///
    /// [`PersistenceBridge::loaded_client`]: crate::panel::PersistenceBridge::loaded_client
    pub fn start(
        state: &Arc<EstimateState>,
        store: Arc<dyn EstimateStore>,
        loaded: watch::Receiver<Option<String>>,
    ) -> Self {
        let filter = CatalogFilter::from_names(state.schema().synced_products.iter().copied());
        let weak = Arc::downgrade(state);
        let collection = state.schema().collection();
        let (primed_tx, primed) = watch::channel(None);

        let task = tokio::spawn(async move {
            let mut loaded = loaded;
            let mut subscription = None;

            loop {
                if loaded.borrow_and_update().is_none() {
                    drop(subscription.take());
                }
                let client_id = match loaded.wait_for(Option::is_some).await {
                    Ok(client) => client.clone().unwrap_or_default(),
                    Err(_) => return,
                };
                // Release the previous client's feed before opening a new one.
                drop(subscription.take());

                let Some(generation) = weak.upgrade().map(|state| state.generation()) else {
                    return;
                };
                // Reading the generation raced a switch; wait for the next load.
                if loaded.borrow_and_update().as_deref() != Some(client_id.as_str()) {
                    continue;
                }

                if filter.is_empty() {
                    primed_tx.send_replace(Some(client_id));
                } else {
                    let on_change = price_updater(Weak::clone(&weak), generation);
                    match store.subscribe_catalog(filter.clone(), on_change).await {
                        Ok(mut sub) => {
                            sub.wait_primed().await;
                            debug!(collection, %client_id, products = filter.len(), "catalog sync primed");
                            subscription = Some(sub);
                        }
                        Err(err) => {
                            error!(collection, %client_id, "failed to subscribe to catalog: {err}");
                        }
                    }
                    primed_tx.send_replace(Some(client_id));
                }

                if loaded.changed().await.is_err() {
                    return;
                }
            }
        });

        Self {
            task: Some(task),
            primed,
        }
    }

    /// Resolves once the catalog has been applied on top of `client_id`'s
    /// loaded estimate, or immediately if the sync has stopped.
    pub async fn wait_primed(
        &self,
        client_id: &str,
    ) {
        if self.task.is_none() {
            return;
        }
        let mut primed = self.primed.clone();
        let _ = primed
            .wait_for(|client| client.as_deref() == Some(client_id))
            .await;
    }

    /// Abort the task, which releases the subscription it holds.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for CatalogSync {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Callback that reprices matching rows of `generation`. Holds the state
/// weakly so a late notification after teardown is dropped; one arriving
/// after a client switch is dropped too.
fn price_updater(
    weak: Weak<EstimateState>,
    generation: u64,
) -> CatalogCallback {
    Arc::new(move |change: CatalogChange| {
        let Some(state) = weak.upgrade() else {
            return;
        };
        let touched = state.apply_catalog_change_in(generation, &change);
        if touched > 0 {
            debug!(
                product = %change.entry.name,
                price = %change.entry.price,
                rows = touched,
                "catalog price applied"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{CatalogEntry, EstimateKind};
    use crate::schemas::EstimateSchema;

    #[test]
    fn updater_is_a_no_op_once_state_is_gone() {
        let state = Arc::new(EstimateState::new(Arc::new(EstimateSchema::for_kind(
            EstimateKind::Roof,
        ))));
        let updater = price_updater(Arc::downgrade(&state), state.generation());
        drop(state);

        updater(CatalogChange::modified(CatalogEntry::new(
            "Пена монтажная 70л",
            dec!(4000),
        )));
    }

    #[test]
    fn updater_reprices_matching_rows() {
        let state = Arc::new(EstimateState::new(Arc::new(EstimateSchema::for_kind(
            EstimateKind::Roof,
        ))));
        let updater = price_updater(Arc::downgrade(&state), state.generation());

        updater(CatalogChange::modified(CatalogEntry::new(
            "OSB 9мм (Для фронтона. Только для двух или односкатных крыш)",
            dec!(6000),
        )));

        let doc = state.get_state();
        let row = doc
            .position("OSB 9мм (Для фронтона. Только для двух или односкатных крыш)")
            .unwrap();
        assert_eq!(doc.items[row].total, dec!(12000));
        assert_eq!(doc.total_materials_cost, dec!(96698) + dec!(1400));
    }

    #[test]
    fn updater_ignores_changes_after_a_reset() {
        let state = Arc::new(EstimateState::new(Arc::new(EstimateSchema::for_kind(
            EstimateKind::Roof,
        ))));
        let updater = price_updater(Arc::downgrade(&state), state.generation());
        state.reset();

        updater(CatalogChange::modified(CatalogEntry::new(
            "OSB 9мм (Для фронтона. Только для двух или односкатных крыш)",
            dec!(6000),
        )));

        assert_eq!(
            state.get_state(),
            EstimateSchema::for_kind(EstimateKind::Roof).seed_document()
        );
        assert_eq!(state.origin(), crate::panel::ChangeOrigin::Seed);
    }
}
