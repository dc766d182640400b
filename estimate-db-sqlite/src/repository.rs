use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use estimate_core::db::{
    CatalogCallback, CatalogFilter, CatalogSubscription, PreparedEstimate, catalog_channel,
    restore_document_str, spawn_catalog_feed,
};
use estimate_core::{CatalogChange, CatalogEntry, ChangeKind, EstimateDocument, EstimateStore, StoreError};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

use crate::decimal::get_decimal;

pub struct SqliteStore {
    pool: SqlitePool,
    changes: broadcast::Sender<CatalogChange>,
    /// Serialises catalog writes with subscription snapshots.
    catalog_lock: Mutex<()>,
}

impl SqliteStore {
    /// Connect to a sqlx SQLite URL. In-memory databases get a single
    /// connection so every query sees the same database.
    pub async fn new(database_url: &str) -> Result<Self> {
        let mut options = SqlitePoolOptions::new();
        if database_url.contains(":memory:") {
            options = options.max_connections(1);
        }
        let pool = options
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self::new_with_pool(pool))
    }

    pub fn new_with_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            changes: catalog_channel(),
            catalog_lock: Mutex::new(()),
        }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            debug!(file = %path.display(), "applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of live catalog subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    async fn product_price(
        &self,
        name: &str,
    ) -> Result<Option<rust_decimal::Decimal>, StoreError> {
        let row = sqlx::query("SELECT price FROM products WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        row.map(|row| get_decimal(&row, "price")).transpose()
    }

    fn publish(
        &self,
        change: CatalogChange,
    ) {
        let _ = self.changes.send(change);
    }
}

#[async_trait]
impl EstimateStore for SqliteStore {
    async fn get_estimate(
        &self,
        collection: &str,
        client_id: &str,
    ) -> Result<Option<EstimateDocument>, StoreError> {
        let row = sqlx::query(
            "SELECT body, updated_at FROM estimates WHERE collection = ? AND client_id = ?",
        )
        .bind(collection)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let body: String = row
            .try_get("body")
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let updated_at = row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(|e| StoreError::Database(format!("Failed to get updated_at: {}", e)))?;

        restore_document_str(&body, Some(updated_at)).map(Some)
    }

    async fn put_estimate(
        &self,
        collection: &str,
        client_id: &str,
        estimate: &PreparedEstimate,
    ) -> Result<DateTime<Utc>, StoreError> {
        let body = estimate.to_json()?;
        let updated_at = Utc::now();

        sqlx::query(
            "INSERT INTO estimates (collection, client_id, body, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (collection, client_id)
             DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        )
        .bind(collection)
        .bind(client_id)
        .bind(&body)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        debug!(collection, client_id, "sqlite store wrote estimate");
        Ok(updated_at)
    }

    async fn subscribe_catalog(
        &self,
        filter: CatalogFilter,
        on_change: CatalogCallback,
    ) -> Result<CatalogSubscription, StoreError> {
        let guard = self.catalog_lock.lock().await;
        let changes = self.changes.subscribe();
        let snapshot = self.list_products().await?;
        drop(guard);

        Ok(spawn_catalog_feed(snapshot, changes, filter, on_change))
    }

    async fn upsert_product(
        &self,
        entry: &CatalogEntry,
    ) -> Result<ChangeKind, StoreError> {
        let _guard = self.catalog_lock.lock().await;
        let kind = match self.product_price(&entry.name).await? {
            Some(_) => ChangeKind::Modified,
            None => ChangeKind::Added,
        };

        sqlx::query(
            "INSERT INTO products (name, price) VALUES (?, ?)
             ON CONFLICT (name) DO UPDATE SET price = excluded.price",
        )
        .bind(&entry.name)
        .bind(entry.price.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

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
        let _guard = self.catalog_lock.lock().await;
        let Some(price) = self.product_price(name).await? else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM products WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        self.publish(CatalogChange::removed(CatalogEntry::new(name, price)));
        Ok(true)
    }

    async fn list_products(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        let rows = sqlx::query("SELECT name, price FROM products ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok(CatalogEntry {
                    name: row
                        .try_get("name")
                        .map_err(|e| StoreError::Database(e.to_string()))?,
                    price: get_decimal(row, "price")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use estimate_core::db::prepare_for_save;
    use estimate_core::schemas::{EstimateSchema, default_catalog};
    use estimate_core::EstimateKind;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    async fn setup_test_db() -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        let store = SqliteStore::new_with_pool(pool);
        store.run_migrations().await.expect("Failed to run migrations");
        store
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    // ── estimates ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_get_estimate_not_found() {
        let store = setup_test_db().await;

        let result = store.get_estimate("floorEstimates", "nobody").await;

        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn test_put_and_get_estimate() {
        let store = setup_test_db().await;
        let doc = EstimateSchema::for_kind(EstimateKind::Consumables).seed_document();
        let prepared = prepare_for_save(&doc).expect("Should prepare");

        let stamped = store
            .put_estimate("consumablesEstimates", "client-1", &prepared)
            .await
            .expect("Should write estimate");
        let loaded = store
            .get_estimate("consumablesEstimates", "client-1")
            .await
            .expect("Should read estimate")
            .expect("Estimate should exist");

        assert_eq!(loaded.items, doc.items);
        assert_eq!(loaded.total_materials_cost, dec!(518790));
        assert_eq!(loaded.total_cost, dec!(518790));
        assert_eq!(
            loaded.updated_at.map(|t| t.timestamp_millis()),
            Some(stamped.timestamp_millis())
        );
    }

    #[tokio::test]
    async fn test_put_estimate_overwrites() {
        let store = setup_test_db().await;
        let mut doc = EstimateSchema::for_kind(EstimateKind::Roof).seed_document();
        store
            .put_estimate("roofEstimates", "c", &prepare_for_save(&doc).unwrap())
            .await
            .unwrap();

        doc.roof_work_cost = Some(dec!(5000));
        doc.total_cost = dec!(161698);
        store
            .put_estimate("roofEstimates", "c", &prepare_for_save(&doc).unwrap())
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM estimates")
            .fetch_one(store.pool())
            .await
            .unwrap();
        let loaded = store.get_estimate("roofEstimates", "c").await.unwrap().unwrap();
        assert_eq!(count, 1);
        assert_eq!(loaded.roof_work_cost, Some(dec!(5000)));
        assert_eq!(loaded.total_cost, dec!(161698));
    }

    #[tokio::test]
    async fn test_stored_body_omits_unset_fields() {
        let store = setup_test_db().await;
        let doc = EstimateSchema::for_kind(EstimateKind::Consumables).seed_document();
        store
            .put_estimate("consumablesEstimates", "c", &prepare_for_save(&doc).unwrap())
            .await
            .unwrap();

        let body: String = sqlx::query_scalar("SELECT body FROM estimates")
            .fetch_one(store.pool())
            .await
            .unwrap();

        assert!(!body.contains("deliveryCost"));
        assert!(!body.contains("updatedAt"));
        assert!(!body.contains("null"));
    }

    #[tokio::test]
    async fn test_get_estimate_with_corrupt_body() {
        let store = setup_test_db().await;
        sqlx::query(
            "INSERT INTO estimates (collection, client_id, body, updated_at)
             VALUES ('floorEstimates', 'c', 'not json', '2025-01-01T00:00:00Z')",
        )
        .execute(store.pool())
        .await
        .unwrap();

        let result = store.get_estimate("floorEstimates", "c").await;

        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    // ── products ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_upsert_product() {
        let store = setup_test_db().await;
        let entry = CatalogEntry::new("Гвозди 120", dec!(700));

        assert_eq!(store.upsert_product(&entry).await, Ok(ChangeKind::Added));
        assert_eq!(
            store
                .upsert_product(&CatalogEntry::new("Гвозди 120", dec!(712.5)))
                .await,
            Ok(ChangeKind::Modified)
        );

        assert_eq!(
            store.list_products().await.unwrap(),
            vec![CatalogEntry::new("Гвозди 120", dec!(712.5))]
        );
    }

    #[tokio::test]
    async fn test_remove_product() {
        let store = setup_test_db().await;
        store
            .upsert_product(&CatalogEntry::new("Гвозди 120", dec!(700)))
            .await
            .unwrap();

        assert_eq!(store.remove_product("Гвозди 120").await, Ok(true));
        assert_eq!(store.remove_product("Гвозди 120").await, Ok(false));
        assert!(store.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_catalog_subscription() {
        let store = setup_test_db().await;
        store
            .upsert_product(&CatalogEntry::new("Гвозди 120", dec!(700)))
            .await
            .unwrap();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut sub = store
            .subscribe_catalog(
                CatalogFilter::from_names(["Гвозди 120"]),
                Arc::new(move |change: CatalogChange| sink.lock().unwrap().push(change)),
            )
            .await
            .unwrap();
        sub.wait_primed().await;
        store.remove_product("Гвозди 120").await.unwrap();
        store
            .upsert_product(&CatalogEntry::new("Кирпич", dec!(50)))
            .await
            .unwrap();
        settle().await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                CatalogChange::added(CatalogEntry::new("Гвозди 120", dec!(700))),
                CatalogChange::removed(CatalogEntry::new("Гвозди 120", dec!(700))),
            ]
        );
        drop(sub);
        settle().await;
        assert_eq!(store.subscriber_count(), 0);
    }

    // ── seeds ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_run_seeds() {
        let store = setup_test_db().await;

        let seeds_dir = Path::new("./seeds");
        store
            .run_seeds(seeds_dir)
            .await
            .expect("Should run seeds successfully");

        assert_eq!(store.list_products().await.unwrap(), default_catalog());
    }

    #[tokio::test]
    async fn test_run_seeds_keeps_existing_prices() {
        let store = setup_test_db().await;
        let anchors = "Анкера 12x150 (Для крепления обвязки к фундаменту)";
        store
            .upsert_product(&CatalogEntry::new(anchors, dec!(250)))
            .await
            .unwrap();

        store.run_seeds(Path::new("./seeds")).await.unwrap();
        store.run_seeds(Path::new("./seeds")).await.unwrap();

        let products = store.list_products().await.unwrap();
        let entry = products.iter().find(|e| e.name == anchors).unwrap();
        assert_eq!(entry.price, dec!(250));
        assert_eq!(products.len(), default_catalog().len());
    }

    #[tokio::test]
    async fn test_run_seeds_nonexistent_directory() {
        let store = setup_test_db().await;

        let result = store.run_seeds(Path::new("./nonexistent")).await;

        let err = result.expect_err("Should fail for nonexistent directory");
        assert_eq!(
            err.to_string(),
            "Failed to read seeds directory './nonexistent'"
        );
    }
}
