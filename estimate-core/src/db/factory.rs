use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::repository::{EstimateStore, StoreError};

/// Backend-agnostic store configuration.
///
/// `backend` must match the [`StoreFactory::backend_name`] of a registered
/// factory. `connection_string` is passed through to that factory unchanged.
///
/// | backend  | connection_string examples          |
/// |----------|-------------------------------------|
/// | `memory` | ignored                             |
/// | `sqlite` | `estimates.db`, `:memory:`          |
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"sqlite"`).
    pub backend: String,
    /// Opaque value forwarded to the factory's `create` method.
    pub connection_string: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

/// One implementation per store backend, registered with a
/// [`StoreRegistry`] at startup.
#[async_trait]
pub trait StoreFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Open (or create) the store. Implementations may run migrations and
    /// seed data here.
    async fn create(
        &self,
        config: &StoreConfig,
    ) -> Result<Arc<dyn EstimateStore>, StoreError>;
}

/// Registry of [`StoreFactory`] instances, keyed by backend name.
pub struct StoreRegistry {
    factories: HashMap<&'static str, Box<dyn StoreFactory>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory, replacing any with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn StoreFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend`.
    ///
    /// # Errors
    /// * [`StoreError::Configuration`] if no factory is registered for the
    ///   requested backend name.
    /// * Any error the chosen factory itself returns.
    pub async fn create(
        &self,
        config: &StoreConfig,
    ) -> Result<Arc<dyn EstimateStore>, StoreError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                StoreError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// tests
// ─────────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::memory::{MemoryStore, MemoryStoreFactory};

    // ── stub factory ─────────────────────────────────────────────────────
    /// Flips an `AtomicBool` when `create` runs and hands back an empty
    /// in-memory store.
    struct StubFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl StoreFactory for StubFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }
        async fn create(
            &self,
            _config: &StoreConfig,
        ) -> Result<Arc<dyn EstimateStore>, StoreError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Arc::new(MemoryStore::new()))
        }
    }

    struct FailingFactory;

    #[async_trait]
    impl StoreFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }
        async fn create(
            &self,
            _config: &StoreConfig,
        ) -> Result<Arc<dyn EstimateStore>, StoreError> {
            Err(StoreError::Connection("intentional failure".to_string()))
        }
    }

    fn stub_factory(name: &'static str) -> (Box<dyn StoreFactory>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Box::new(StubFactory {
                name,
                called: flag.clone(),
            }),
            flag,
        )
    }

    fn config(backend: &str) -> StoreConfig {
        StoreConfig {
            backend: backend.to_string(),
            connection_string: ":memory:".to_string(),
        }
    }

    // ── StoreConfig ──────────────────────────────────────────────────────
    #[test]
    fn default_config_is_memory() {
        let cfg = StoreConfig::default();
        assert_eq!(cfg.backend, "memory");
        assert_eq!(cfg.connection_string, ":memory:");
    }

    // ── registration ─────────────────────────────────────────────────────
    #[test]
    fn new_registry_has_no_backends() {
        assert!(StoreRegistry::new().available_backends().is_empty());
    }

    #[test]
    fn available_backends_is_sorted() {
        let mut reg = StoreRegistry::new();
        let (f1, _) = stub_factory("sqlite");
        let (f2, _) = stub_factory("memory");
        reg.register(f1);
        reg.register(f2);
        assert_eq!(reg.available_backends(), vec!["memory", "sqlite"]);
    }

    #[test]
    fn duplicate_registration_replaces_previous() {
        let mut reg = StoreRegistry::new();
        let (old, _) = stub_factory("sqlite");
        let (new, _) = stub_factory("sqlite");
        reg.register(old);
        reg.register(new);
        assert_eq!(reg.available_backends(), vec!["sqlite"]);
    }

    // ── dispatch ─────────────────────────────────────────────────────────
    #[tokio::test]
    async fn create_calls_only_the_matching_factory() {
        let mut reg = StoreRegistry::new();
        let (sqlite_factory, sqlite_called) = stub_factory("sqlite");
        let (memory_factory, memory_called) = stub_factory("memory");
        reg.register(sqlite_factory);
        reg.register(memory_factory);

        let result = reg.create(&config("sqlite")).await;

        assert!(result.is_ok(), "expected Ok, got {:#?}", result.err());
        assert!(sqlite_called.load(Ordering::SeqCst));
        assert!(!memory_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn memory_factory_produces_working_store() {
        let mut reg = StoreRegistry::new();
        reg.register(Box::new(MemoryStoreFactory));

        let store = reg.create(&StoreConfig::default()).await.unwrap();

        assert!(!store.list_products().await.unwrap().is_empty());
    }

    // ── unknown backend ──────────────────────────────────────────────────
    #[tokio::test]
    async fn configuration_error_names_requested_and_available_backends() {
        let mut reg = StoreRegistry::new();
        let (f, _) = stub_factory("sqlite");
        reg.register(f);

        match reg.create(&config("postgres")).await {
            Err(StoreError::Configuration(msg)) => {
                assert!(msg.contains("postgres"), "error should name the requested backend");
                assert!(msg.contains("sqlite"), "error should list available backends");
            }
            Err(other) => panic!("expected Configuration error, got {other:#?}"),
            Ok(_) => panic!("expected Configuration error, got a store"),
        }
    }

    // ── factory errors propagate ─────────────────────────────────────────
    #[tokio::test]
    async fn create_propagates_factory_error() {
        let mut reg = StoreRegistry::new();
        reg.register(Box::new(FailingFactory));

        match reg.create(&config("failing")).await {
            Err(err) => assert_eq!(err, StoreError::Connection("intentional failure".to_string())),
            Ok(_) => panic!("expected factory error"),
        }
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: StoreConfig = serde_json::from_str(r#"{"backend": "sqlite"}"#).unwrap();

        assert_eq!(cfg.backend, "sqlite");
        assert_eq!(cfg.connection_string, ":memory:");
    }
}
