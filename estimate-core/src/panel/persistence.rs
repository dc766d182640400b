//! Load-on-mount and debounced save for one panel.
//!
//! A single driver task owns the load for the current client and then
//! watches the state for changes worth saving. Saves go through a
//! [`DebounceTimer`]; only the latest document is kept as pending.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::db::{EstimateStore, prepare_for_save};
use crate::models::EstimateDocument;
use crate::panel::PanelConfig;
use crate::panel::debounce::DebounceTimer;
use crate::panel::state::{EstimateSnapshot, EstimateState};

/// A document waiting for its debounced save, bound to the client it was
/// edited for.
#[derive(Debug, Clone)]
struct PendingSave {
    client_id: String,
    document: EstimateDocument,
    revision: u64,
}

/// The client the driver should load, and the state generation its load
/// may write into.
#[derive(Debug, Clone)]
struct ClientTarget {
    id: String,
    generation: u64,
}

struct BridgeShared {
    store: Arc<dyn EstimateStore>,
    state: Arc<EstimateState>,
    collection: &'static str,
    client: watch::Sender<ClientTarget>,
    /// Client whose load has resolved, if any.
    loaded: watch::Sender<Option<String>>,
    editing: AtomicBool,
    /// Every state revision below this one has been written to the store.
    saved_below: AtomicU64,
    pending: Mutex<Option<PendingSave>>,
    timer: Mutex<DebounceTimer>,
}

impl BridgeShared {
    fn pending(&self) -> MutexGuard<'_, Option<PendingSave>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn timer(&self) -> MutexGuard<'_, DebounceTimer> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_client(&self) -> String {
        self.client.borrow().id.clone()
    }

    fn is_loaded(
        &self,
        client_id: &str,
    ) -> bool {
        self.loaded.borrow().as_deref() == Some(client_id)
    }

    fn is_saved(
        &self,
        revision: u64,
    ) -> bool {
        revision < self.saved_below.load(Ordering::SeqCst)
    }

    /// Queue the snapshot's document and (re)arm the save timer.
    fn schedule(
        self: &Arc<Self>,
        snapshot: &EstimateSnapshot,
    ) {
        let client_id = self.current_client();
        *self.pending() = Some(PendingSave {
            client_id,
            document: snapshot.document.clone(),
            revision: snapshot.revision,
        });

        let shared = Arc::clone(self);
        self.timer().arm(async move {
            shared.save_pending().await;
        });
    }

    fn cancel(&self) {
        if self.timer().cancel() {
            debug!(collection = self.collection, "pending save cancelled");
        }
        self.pending().take();
    }

    async fn save_pending(&self) {
        let pending = self.pending().take();
        if let Some(pending) = pending {
            self.save(pending).await;
        }
    }

    async fn save(
        &self,
        pending: PendingSave,
    ) {
        let prepared = match prepare_for_save(&pending.document) {
            Ok(prepared) => prepared,
            Err(err) => {
                error!(
                    collection = self.collection,
                    client_id = %pending.client_id,
                    "failed to prepare estimate for save: {err}"
                );
                return;
            }
        };

        match self
            .store
            .put_estimate(self.collection, &pending.client_id, &prepared)
            .await
        {
            Ok(updated_at) => {
                self.saved_below.fetch_max(pending.revision + 1, Ordering::SeqCst);
                debug!(
                    collection = self.collection,
                    client_id = %pending.client_id,
                    %updated_at,
                    revision = pending.revision,
                    "estimate saved"
                );
            }
            Err(err) => error!(
                collection = self.collection,
                client_id = %pending.client_id,
                "failed to save estimate: {err}"
            ),
        }
    }

    /// Read `target`'s estimate into the state, unless the state has been
    /// reset for another client while the read was in flight.
    async fn load(
        &self,
        target: &ClientTarget,
    ) {
        let client_id = target.id.as_str();
        match self.store.get_estimate(self.collection, client_id).await {
            Ok(Some(document)) => {
                if self.state.replace_in(target.generation, document) {
                    debug!(collection = self.collection, client_id, "estimate loaded");
                } else {
                    debug!(
                        collection = self.collection,
                        client_id, "client switched during load; estimate dropped"
                    );
                }
            }
            Ok(None) => debug!(
                collection = self.collection,
                client_id, "no stored estimate; keeping defaults"
            ),
            Err(err) => error!(
                collection = self.collection,
                client_id, "failed to load estimate: {err}"
            ),
        }
    }

    fn on_snapshot(
        self: &Arc<Self>,
        snapshot: &EstimateSnapshot,
    ) {
        if snapshot.origin.needs_save()
            && self.editing.load(Ordering::SeqCst)
            && !self.is_saved(snapshot.revision)
        {
            self.schedule(snapshot);
        }
    }
}

/// Keeps one client's estimate in step with the store.
pub struct PersistenceBridge {
    shared: Arc<BridgeShared>,
    task: Option<JoinHandle<()>>,
}

impl PersistenceBridge {
    /// Spawn the driver task and start loading `client_id`.
    pub fn start(
        state: Arc<EstimateState>,
        store: Arc<dyn EstimateStore>,
        client_id: impl Into<String>,
        config: &PanelConfig,
    ) -> Self {
        let collection = state.schema().collection();
        let (client, _) = watch::channel(ClientTarget {
            id: client_id.into(),
            generation: state.generation(),
        });
        let (loaded, _) = watch::channel(None);

        let shared = Arc::new(BridgeShared {
            store,
            state,
            collection,
            client,
            loaded,
            editing: AtomicBool::new(config.editing),
            saved_below: AtomicU64::new(0),
            pending: Mutex::new(None),
            timer: Mutex::new(DebounceTimer::new(config.save_delay)),
        });

        let task = tokio::spawn(drive(Arc::clone(&shared)));
        Self {
            shared,
            task: Some(task),
        }
    }

    pub fn client_id(&self) -> String {
        self.shared.current_client()
    }

    /// Follows the client whose load has resolved.
    pub fn loaded_client(&self) -> watch::Receiver<Option<String>> {
        self.shared.loaded.subscribe()
    }

    pub fn is_editing(&self) -> bool {
        self.shared.editing.load(Ordering::SeqCst)
    }

    /// Entering edit mode saves the current state once the load has
    /// resolved; leaving it drops any pending save.
    pub fn set_editing(
        &self,
        editing: bool,
    ) {
        let was = self.shared.editing.swap(editing, Ordering::SeqCst);
        if was == editing {
            return;
        }

        if editing {
            if self.shared.is_loaded(&self.shared.current_client()) {
                self.shared.schedule(&self.shared.state.snapshot());
            }
        } else {
            self.shared.cancel();
        }
    }

    /// Switch to another client: drop the pending save, go back to the
    /// seed, and load the new client's estimate.
    pub fn set_client(
        &self,
        client_id: impl Into<String>,
    ) {
        let client_id = client_id.into();
        info!(collection = self.shared.collection, %client_id, "switching client");
        self.shared.cancel();
        self.shared.loaded.send_replace(None);
        let generation = self.shared.state.reset();
        self.shared.client.send_replace(ClientTarget {
            id: client_id,
            generation,
        });
    }

    /// Resolves once the load for the current client has finished, whatever
    /// its outcome.
    pub async fn wait_loaded(&self) {
        if self.task.is_none() {
            return;
        }
        let target = self.shared.current_client();
        let mut loaded = self.shared.loaded.subscribe();
        let _ = loaded
            .wait_for(|client| client.as_deref() == Some(target.as_str()))
            .await;
    }

    pub fn has_pending_save(&self) -> bool {
        self.shared.pending().is_some()
    }

    /// Save now instead of waiting for the timer.
    ///
    /// While editing a loaded client, an edit or catalog change the driver
    /// has not picked up yet is written too: the latest document wins over
    /// the queued one. Nothing is written when the latest change has
    /// already been saved.
    pub async fn flush(&self) {
        let shared = &self.shared;
        shared.timer().cancel();
        let pending = shared.pending().take();

        let client_id = shared.current_client();
        let snapshot = shared.state.snapshot();
        let unsaved = shared.editing.load(Ordering::SeqCst)
            && shared.is_loaded(&client_id)
            && snapshot.origin.needs_save()
            && !shared.is_saved(snapshot.revision);

        let save = if unsaved {
            Some(PendingSave {
                client_id,
                document: snapshot.document,
                revision: snapshot.revision,
            })
        } else {
            pending.filter(|pending| !shared.is_saved(pending.revision))
        };
        if let Some(save) = save {
            shared.save(save).await;
        }
    }

    /// Stop loading and watching, and drop any save that has not fired.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.shared.cancel();
        }
    }
}

impl Drop for PersistenceBridge {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn drive(shared: Arc<BridgeShared>) {
    let mut client_rx = shared.client.subscribe();
    let mut state_rx = shared.state.subscribe();

    loop {
        let target = client_rx.borrow_and_update().clone();

        tokio::select! {
            biased;
            changed = client_rx.changed() => {
                if changed.is_err() {
                    return;
                }
                continue;
            }
            _ = shared.load(&target) => {}
        }
        // A switch that landed as the read resolved loads the new client.
        if !matches!(client_rx.has_changed(), Ok(false)) {
            continue;
        }
        shared.loaded.send_replace(Some(target.id));

        // Edits made while the load was in flight are saved now unless the
        // load replaced them.
        let snapshot = state_rx.borrow_and_update().clone();
        shared.on_snapshot(&snapshot);

        loop {
            tokio::select! {
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    let snapshot = state_rx.borrow_and_update().clone();
                    shared.on_snapshot(&snapshot);
                }
                changed = client_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    break;
                }
            }
        }
    }
}
