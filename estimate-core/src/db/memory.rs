//! Process-local [`EstimateStore`] used by tests and the `memory` backend.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

use crate::db::document::{PreparedEstimate, prepare_for_save, restore_document};
use crate::db::factory::{StoreConfig, StoreFactory};
use crate::db::feed::{catalog_channel, spawn_catalog_feed};
use crate::db::repository::{
    CatalogCallback, CatalogFilter, CatalogSubscription, EstimateStore, StoreError,
};
use crate::models::{CatalogChange, CatalogEntry, ChangeKind, EstimateDocument};
use crate::schemas::default_catalog;

struct StoredEstimate {
    body: Map<String, Value>,
    updated_at: DateTime<Utc>,
}

type EstimateKey = (String, String);

pub struct MemoryStore {
    estimates: Mutex<HashMap<EstimateKey, StoredEstimate>>,
    products: Mutex<BTreeMap<String, Decimal>>,
    changes: broadcast::Sender<CatalogChange>,
    reads: AtomicU64,
    writes: AtomicU64,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    read_delay: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            estimates: Mutex::new(HashMap::new()),
            products: Mutex::new(BTreeMap::new()),
            changes: catalog_channel(),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            read_delay: Duration::ZERO,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self {
            products: Mutex::new(entries.into_iter().map(|e| (e.name, e.price)).collect()),
            ..Self::default()
        }
    }

    /// Delay every `get_estimate` by `delay`, to exercise slow loads.
    pub fn with_read_delay(
        mut self,
        delay: Duration,
    ) -> Self {
        self.read_delay = delay;
        self
    }

    /// Store a document directly, bypassing the write counter.
    pub async fn insert_estimate(
        &self,
        collection: &str,
        client_id: &str,
        doc: &EstimateDocument,
    ) -> Result<(), StoreError> {
        let prepared = prepare_for_save(doc)?;
        let key = (collection.to_string(), client_id.to_string());
        self.estimates.lock().await.insert(
            key,
            StoredEstimate {
                body: prepared.body().clone(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    /// The document as currently stored, if any.
    pub async fn stored(
        &self,
        collection: &str,
        client_id: &str,
    ) -> Option<EstimateDocument> {
        let key = (collection.to_string(), client_id.to_string());
        let guard = self.estimates.lock().await;
        let row = guard.get(&key)?;
        restore_document(Value::Object(row.body.clone()), Some(row.updated_at)).ok()
    }

    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_fail_reads(
        &self,
        fail: bool,
    ) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(
        &self,
        fail: bool,
    ) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of live catalog subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    fn publish(
        &self,
        change: CatalogChange,
    ) {
        // No receivers is fine: nobody is watching the catalog.
        let _ = self.changes.send(change);
    }
}

#[async_trait]
impl EstimateStore for MemoryStore {
    async fn get_estimate(
        &self,
        collection: &str,
        client_id: &str,
    ) -> Result<Option<EstimateDocument>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("memory store read failure".to_string()));
        }

        let key = (collection.to_string(), client_id.to_string());
        let guard = self.estimates.lock().await;
        guard
            .get(&key)
            .map(|row| restore_document(Value::Object(row.body.clone()), Some(row.updated_at)))
            .transpose()
    }

    async fn put_estimate(
        &self,
        collection: &str,
        client_id: &str,
        estimate: &PreparedEstimate,
    ) -> Result<DateTime<Utc>, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("memory store write failure".to_string()));
        }

        let updated_at = Utc::now();
        let key = (collection.to_string(), client_id.to_string());
        self.estimates.lock().await.insert(
            key,
            StoredEstimate {
                body: estimate.body().clone(),
                updated_at,
            },
        );
        debug!(collection, client_id, "memory store wrote estimate");
        Ok(updated_at)
    }

    async fn subscribe_catalog(
        &self,
        filter: CatalogFilter,
        on_change: CatalogCallback,
    ) -> Result<CatalogSubscription, StoreError> {
        // Writers publish while holding the products lock, so subscribing
        // under it lines the snapshot up exactly with the change stream.
        let products = self.products.lock().await;
        let changes = self.changes.subscribe();
        let snapshot = products
            .iter()
            .map(|(name, price)| CatalogEntry::new(name.clone(), *price))
            .collect();
        drop(products);

        Ok(spawn_catalog_feed(snapshot, changes, filter, on_change))
    }

    async fn upsert_product(
        &self,
        entry: &CatalogEntry,
    ) -> Result<ChangeKind, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("memory store write failure".to_string()));
        }

        let mut products = self.products.lock().await;
        let kind = match products.insert(entry.name.clone(), entry.price) {
            None => ChangeKind::Added,
            Some(_) => ChangeKind::Modified,
        };
        self.publish(CatalogChange {
            kind,
            entry: entry.clone(),
        });
        Ok(kind)
    }

    async fn remove_product(
        &self,
        name: &str,
    ) -> Result<bool, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("memory store write failure".to_string()));
        }

        let mut products = self.products.lock().await;
        match products.remove(name) {
            Some(price) => {
                self.publish(CatalogChange::removed(CatalogEntry::new(name, price)));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_products(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        let products = self.products.lock().await;
        Ok(products
            .iter()
            .map(|(name, price)| CatalogEntry::new(name.clone(), *price))
            .collect())
    }
}

/// Factory for the `memory` backend. The store starts with the default
/// catalog; the connection string is ignored.
pub struct MemoryStoreFactory;

#[async_trait]
impl StoreFactory for MemoryStoreFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &StoreConfig,
    ) -> Result<Arc<dyn EstimateStore>, StoreError> {
        Ok(Arc::new(MemoryStore::with_products(default_catalog())))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::EstimateKind;
    use crate::schemas::EstimateSchema;

    const FLOOR: &str = "floorEstimates";

    fn recorder() -> (CatalogCallback, Arc<StdMutex<Vec<CatalogChange>>>) {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: CatalogCallback =
            Arc::new(move |change: CatalogChange| sink.lock().unwrap().push(change));
        (callback, seen)
    }

    // ── estimates ────────────────────────────────────────────────────────
    #[tokio::test]
    async fn missing_estimate_reads_as_none() {
        let store = MemoryStore::new();

        assert_eq!(store.get_estimate(FLOOR, "client-1").await, Ok(None));
        assert_eq!(store.read_count(), 1);
    }

    #[tokio::test]
    async fn put_then_get_returns_stamped_document() {
        let store = MemoryStore::new();
        let doc = EstimateSchema::for_kind(EstimateKind::Floor).seed_document();
        let prepared = prepare_for_save(&doc).unwrap();

        let stamped = store.put_estimate(FLOOR, "client-1", &prepared).await.unwrap();
        let loaded = store.get_estimate(FLOOR, "client-1").await.unwrap().unwrap();

        assert_eq!(loaded.items, doc.items);
        assert_eq!(loaded.total_cost, dec!(57310));
        assert_eq!(loaded.updated_at, Some(stamped));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn estimates_are_scoped_by_collection_and_client() {
        let store = MemoryStore::new();
        let doc = EstimateSchema::for_kind(EstimateKind::Floor).seed_document();
        store.insert_estimate(FLOOR, "client-1", &doc).await.unwrap();

        assert!(store.get_estimate(FLOOR, "client-2").await.unwrap().is_none());
        assert!(store.get_estimate("roofEstimates", "client-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn injected_failures_surface_as_errors() {
        let store = MemoryStore::new();
        let prepared =
            prepare_for_save(&EstimateSchema::for_kind(EstimateKind::Roof).seed_document())
                .unwrap();

        store.set_fail_reads(true);
        store.set_fail_writes(true);

        assert!(matches!(
            store.get_estimate(FLOOR, "c").await,
            Err(StoreError::Connection(_))
        ));
        assert!(matches!(
            store.put_estimate(FLOOR, "c", &prepared).await,
            Err(StoreError::Connection(_))
        ));
        assert!(store.stored(FLOOR, "c").await.is_none());
    }

    // ── catalog ──────────────────────────────────────────────────────────
    #[tokio::test]
    async fn upsert_reports_added_then_modified() {
        let store = MemoryStore::new();
        let entry = CatalogEntry::new("Гвозди 120", dec!(700));

        assert_eq!(store.upsert_product(&entry).await, Ok(ChangeKind::Added));
        assert_eq!(
            store
                .upsert_product(&CatalogEntry::new("Гвозди 120", dec!(750)))
                .await,
            Ok(ChangeKind::Modified)
        );
        assert_eq!(
            store.list_products().await.unwrap(),
            vec![CatalogEntry::new("Гвозди 120", dec!(750))]
        );
    }

    #[tokio::test]
    async fn remove_unknown_product_returns_false() {
        let store = MemoryStore::with_products([CatalogEntry::new("Гвозди 120", dec!(700))]);

        assert_eq!(store.remove_product("Кирпич").await, Ok(false));
        assert_eq!(store.remove_product("Гвозди 120").await, Ok(true));
        assert!(store.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn subscription_sees_snapshot_then_live_changes() {
        let store = MemoryStore::with_products([
            CatalogEntry::new("Гвозди 120", dec!(700)),
            CatalogEntry::new("Кирпич", dec!(50)),
        ]);
        let (callback, seen) = recorder();

        let mut sub = store
            .subscribe_catalog(CatalogFilter::from_names(["Гвозди 120"]), callback)
            .await
            .unwrap();
        sub.wait_primed().await;
        store
            .upsert_product(&CatalogEntry::new("Гвозди 120", dec!(800)))
            .await
            .unwrap();
        store
            .upsert_product(&CatalogEntry::new("Кирпич", dec!(60)))
            .await
            .unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                CatalogChange::added(CatalogEntry::new("Гвозди 120", dec!(700))),
                CatalogChange::modified(CatalogEntry::new("Гвозди 120", dec!(800))),
            ]
        );
    }

    #[tokio::test]
    async fn dropping_subscription_releases_receiver() {
        let store = MemoryStore::new();
        let (callback, _seen) = recorder();

        let sub = store
            .subscribe_catalog(CatalogFilter::from_names(["Гвозди 120"]), callback)
            .await
            .unwrap();
        assert_eq!(store.subscriber_count(), 1);

        drop(sub);
        for _ in 0..10 {
            if store.subscriber_count() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn factory_seeds_default_catalog() {
        let store = MemoryStoreFactory
            .create(&StoreConfig::default())
            .await
            .unwrap();

        assert_eq!(store.list_products().await.unwrap(), default_catalog());
    }
}
