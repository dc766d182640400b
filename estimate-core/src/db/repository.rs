use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::db::document::PreparedEstimate;
use crate::models::{CatalogChange, CatalogEntry, ChangeKind, EstimateDocument};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Receives catalog changes for a subscription. Called from the store's
/// feed task, never concurrently for the same subscription.
pub type CatalogCallback = Arc<dyn Fn(CatalogChange) + Send + Sync>;

/// Equality-OR filter over catalog entry names.
///
/// An empty filter matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    names: BTreeSet<String>,
}

impl CatalogFilter {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(
        &self,
        name: &str,
    ) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

/// Handle for a live catalog subscription.
///
/// Dropping the handle (or calling [`CatalogSubscription::unsubscribe`])
/// stops delivery; no callback runs after that.
pub struct CatalogSubscription {
    task: Option<JoinHandle<()>>,
    primed: watch::Receiver<bool>,
}

impl CatalogSubscription {
    /// Wrap a feed task. `primed` flips to `true` once the entries that
    /// already matched at subscribe time have been delivered.
    pub fn new(
        task: JoinHandle<()>,
        primed: watch::Receiver<bool>,
    ) -> Self {
        Self {
            task: Some(task),
            primed,
        }
    }

    /// Resolve once the initial snapshot has been delivered, or the feed is gone.
    pub async fn wait_primed(&mut self) {
        let _ = self.primed.wait_for(|primed| *primed).await;
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn unsubscribe(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for CatalogSubscription {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CatalogSubscription {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("CatalogSubscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// The document store the estimate panels persist to.
///
/// Estimates are keyed by collection (one per estimate kind) and client id.
/// The product catalog is a separate collection keyed by product name.
#[async_trait]
pub trait EstimateStore: Send + Sync {
    // Estimate documents
    async fn get_estimate(
        &self,
        collection: &str,
        client_id: &str,
    ) -> Result<Option<EstimateDocument>, StoreError>;

    /// Overwrite the stored document. The store stamps the write and returns
    /// the timestamp it assigned.
    async fn put_estimate(
        &self,
        collection: &str,
        client_id: &str,
        estimate: &PreparedEstimate,
    ) -> Result<DateTime<Utc>, StoreError>;

    // Product catalog
    /// Deliver an `Added` change for every entry that currently matches,
    /// then every later change to a matching entry, until the returned
    /// handle is dropped. Delivery is at-least-once.
    async fn subscribe_catalog(
        &self,
        filter: CatalogFilter,
        on_change: CatalogCallback,
    ) -> Result<CatalogSubscription, StoreError>;

    async fn upsert_product(
        &self,
        entry: &CatalogEntry,
    ) -> Result<ChangeKind, StoreError>;

    /// Returns `false` when no product had that name.
    async fn remove_product(
        &self,
        name: &str,
    ) -> Result<bool, StoreError>;

    async fn list_products(&self) -> Result<Vec<CatalogEntry>, StoreError>;
}
