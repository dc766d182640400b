use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::debug;

use crate::calculations::EstimateError;
use crate::db::EstimateStore;
use crate::models::{CostField, EstimateDocument, EstimateKind, ItemField};
use crate::panel::PanelConfig;
use crate::panel::catalog_sync::CatalogSync;
use crate::panel::persistence::PersistenceBridge;
use crate::panel::state::{EstimateSnapshot, EstimateState};
use crate::schemas::EstimateSchema;

/// One mounted estimate panel: state, persistence and catalog sync for a
/// single schema and client.
///
/// Must be mounted inside a tokio runtime. Dropping the panel unmounts it.
pub struct EstimatePanel {
    state: Arc<EstimateState>,
    bridge: PersistenceBridge,
    sync: CatalogSync,
}

impl EstimatePanel {
    pub fn mount(
        schema: EstimateSchema,
        client_id: impl Into<String>,
        store: Arc<dyn EstimateStore>,
        config: PanelConfig,
    ) -> Self {
        let client_id = client_id.into();
        debug!(kind = %schema.kind, %client_id, "mounting estimate panel");

        let state = Arc::new(EstimateState::new(Arc::new(schema)));
        let bridge = PersistenceBridge::start(Arc::clone(&state), Arc::clone(&store), client_id, &config);
        let sync = CatalogSync::start(&state, store, bridge.loaded_client());

        Self {
            state,
            bridge,
            sync,
        }
    }

    pub fn kind(&self) -> EstimateKind {
        self.state.schema().kind
    }

    pub fn schema(&self) -> &EstimateSchema {
        self.state.schema()
    }

    pub fn state(&self) -> EstimateDocument {
        self.state.get_state()
    }

    pub fn subscribe(&self) -> watch::Receiver<EstimateSnapshot> {
        self.state.subscribe()
    }

    pub fn update_item(
        &self,
        index: usize,
        field: ItemField,
        value: Decimal,
    ) -> Result<(), EstimateError> {
        self.state.update_item(index, field, value)
    }

    pub fn update_extra_cost(
        &self,
        field: CostField,
        value: Decimal,
    ) -> Result<(), EstimateError> {
        self.state.update_extra_cost(field, value)
    }

    pub fn is_editing(&self) -> bool {
        self.bridge.is_editing()
    }

    pub fn set_editing(
        &self,
        editing: bool,
    ) {
        self.bridge.set_editing(editing);
    }

    pub fn client_id(&self) -> String {
        self.bridge.client_id()
    }

    pub fn set_client(
        &self,
        client_id: impl Into<String>,
    ) {
        self.bridge.set_client(client_id);
    }

    /// Resolves once the current client's estimate has been loaded (or
    /// found missing, or failed to load).
    pub async fn wait_loaded(&self) {
        self.bridge.wait_loaded().await;
    }

    /// Like [`wait_loaded`](Self::wait_loaded), and additionally waits for
    /// the catalog's current prices to be applied.
    pub async fn wait_ready(&self) {
        self.bridge.wait_loaded().await;
        self.sync.wait_primed(&self.bridge.client_id()).await;
    }

    pub fn has_pending_save(&self) -> bool {
        self.bridge.has_pending_save()
    }

    /// Write the pending save now.
    pub async fn flush(&self) {
        self.bridge.flush().await;
    }

    /// Tear down: the catalog subscription is released and a save that has
    /// not fired yet is dropped.
    pub fn unmount(self) {
        drop(self);
    }

    fn teardown(&mut self) {
        self.sync.stop();
        self.bridge.stop();
    }
}

impl Drop for EstimatePanel {
    fn drop(&mut self) {
        debug!(kind = %self.kind(), "unmounting estimate panel");
        self.teardown();
    }
}
