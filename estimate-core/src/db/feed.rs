//! Catalog change fan-out shared by the store backends.
//!
//! A backend owns one `broadcast::Sender<CatalogChange>` and publishes every
//! product write on it. Each subscription gets its own feed task that replays
//! the entries matching at subscribe time, then forwards matching changes.

use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use crate::db::repository::{CatalogCallback, CatalogFilter, CatalogSubscription};
use crate::models::{CatalogChange, CatalogEntry};

/// Buffered changes per subscriber before a slow one starts losing events.
pub const CATALOG_FEED_CAPACITY: usize = 256;

pub fn catalog_channel() -> broadcast::Sender<CatalogChange> {
    broadcast::channel(CATALOG_FEED_CAPACITY).0
}

/// Start a feed task for one subscription.
///
/// `changes` must be subscribed before `snapshot` is read so that no write
/// falls between the two; a write seen in both is delivered twice, which
/// subscribers tolerate.
pub fn spawn_catalog_feed(
    snapshot: Vec<CatalogEntry>,
    mut changes: broadcast::Receiver<CatalogChange>,
    filter: CatalogFilter,
    on_change: CatalogCallback,
) -> CatalogSubscription {
    let (primed_tx, primed_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let initial: Vec<_> = snapshot
            .into_iter()
            .filter(|entry| filter.matches(&entry.name))
            .collect();
        debug!(matched = initial.len(), watched = filter.len(), "catalog feed primed");
        for entry in initial {
            on_change(CatalogChange::added(entry));
        }
        primed_tx.send_replace(true);

        loop {
            match changes.recv().await {
                Ok(change) if filter.matches(&change.entry.name) => on_change(change),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "catalog feed fell behind; price changes were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    CatalogSubscription::new(task, primed_rx)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::ChangeKind;

    fn recorder() -> (CatalogCallback, Arc<Mutex<Vec<CatalogChange>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: CatalogCallback =
            Arc::new(move |change: CatalogChange| sink.lock().unwrap().push(change));
        (callback, seen)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn replays_matching_snapshot_as_added() {
        let tx = catalog_channel();
        let (callback, seen) = recorder();
        let snapshot = vec![
            CatalogEntry::new("Карандаши", dec!(100)),
            CatalogEntry::new("Кирпич", dec!(50)),
        ];

        let mut sub = spawn_catalog_feed(
            snapshot,
            tx.subscribe(),
            CatalogFilter::from_names(["Карандаши"]),
            callback,
        );
        sub.wait_primed().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind, ChangeKind::Added);
        assert_eq!(seen[0].entry.name, "Карандаши");
    }

    #[tokio::test]
    async fn forwards_only_matching_changes() {
        let tx = catalog_channel();
        let (callback, seen) = recorder();
        let mut sub = spawn_catalog_feed(
            Vec::new(),
            tx.subscribe(),
            CatalogFilter::from_names(["Перчатки"]),
            callback,
        );
        sub.wait_primed().await;

        tx.send(CatalogChange::modified(CatalogEntry::new("Перчатки", dec!(350))))
            .unwrap();
        tx.send(CatalogChange::modified(CatalogEntry::new("Кирпич", dec!(55))))
            .unwrap();
        tx.send(CatalogChange::removed(CatalogEntry::new("Перчатки", dec!(350))))
            .unwrap();
        settle().await;

        let kinds: Vec<_> = seen.lock().unwrap().iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ChangeKind::Modified, ChangeKind::Removed]);
    }

    #[tokio::test]
    async fn nothing_is_delivered_after_unsubscribe() {
        let tx = catalog_channel();
        let (callback, seen) = recorder();
        let mut sub = spawn_catalog_feed(
            Vec::new(),
            tx.subscribe(),
            CatalogFilter::from_names(["Перчатки"]),
            callback,
        );
        sub.wait_primed().await;

        sub.unsubscribe();
        settle().await;
        let _ = tx.send(CatalogChange::modified(CatalogEntry::new("Перчатки", dec!(1))));
        settle().await;

        assert!(seen.lock().unwrap().is_empty());
    }
}
