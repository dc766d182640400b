use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use estimate_core::db::{EstimateStore, StoreConfig, StoreError, StoreFactory};

use crate::repository::SqliteStore;

/// Resolve the seeds directory at runtime so it works in both development and
/// packaged distribution.
///
/// Resolution order:
/// 1. **`ESTIMATE_DB_SQLITE_SEEDS_DIR`** if set.
/// 2. **`./seeds`** if the directory exists in the current working directory.
/// 3. **Crate manifest dir**: `$CARGO_MANIFEST_DIR/seeds`.
fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ESTIMATE_DB_SQLITE_SEEDS_DIR") {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// Map a connection string to a sqlx URL.
///
/// * `":memory:"` becomes an in-memory database.
/// * A value that already starts with `sqlite:` is used as-is.
/// * Anything else is a file path, created if missing.
pub fn database_url(connection_string: &str) -> String {
    let trimmed = connection_string.trim();
    if trimmed == ":memory:" {
        "sqlite::memory:".to_string()
    } else if trimmed.starts_with("sqlite:") {
        trimmed.to_string()
    } else {
        format!("sqlite:{}?mode=rwc", trimmed)
    }
}

/// [`StoreFactory`] for SQLite.
///
/// ```rust,no_run
/// use estimate_core::db::StoreRegistry;
/// use estimate_db_sqlite::SqliteStoreFactory;
///
/// let mut registry = StoreRegistry::new();
/// registry.register(Box::new(SqliteStoreFactory));
/// ```
pub struct SqliteStoreFactory;

#[async_trait]
impl StoreFactory for SqliteStoreFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database, run migrations and load the default catalog.
    async fn create(
        &self,
        config: &StoreConfig,
    ) -> Result<Arc<dyn EstimateStore>, StoreError> {
        let store = SqliteStore::new(&database_url(&config.connection_string))
            .await
            .map_err(|e| StoreError::Connection(format!("{:#}", e)))?;
        store
            .run_migrations()
            .await
            .map_err(|e| StoreError::Database(format!("{:#}", e)))?;
        store
            .run_seeds(&seeds_dir())
            .await
            .map_err(|e| StoreError::Database(format!("{:#}", e)))?;
        Ok(Arc::new(store))
    }
}

#[cfg(test)]
mod tests {
    use estimate_core::schemas::default_catalog;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn backend_name_is_sqlite() {
        assert_eq!(SqliteStoreFactory.backend_name(), "sqlite");
    }

    #[test]
    fn connection_strings_map_to_sqlx_urls() {
        assert_eq!(database_url(":memory:"), "sqlite::memory:");
        assert_eq!(database_url("estimates.db"), "sqlite:estimates.db?mode=rwc");
        assert_eq!(database_url("sqlite://data/e.db"), "sqlite://data/e.db");
    }

    #[tokio::test]
    async fn creates_seeded_in_memory_store() {
        let config = StoreConfig {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        };

        let store = match SqliteStoreFactory.create(&config).await {
            Ok(store) => store,
            Err(err) => panic!("failed to create in-memory store: {err:#?}"),
        };

        assert_eq!(store.list_products().await.unwrap(), default_catalog());
    }
}
