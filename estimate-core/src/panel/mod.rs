//! Runtime for a mounted estimate panel.
//!
//! [`EstimatePanel`] ties together the [`EstimateState`] holder, the
//! [`PersistenceBridge`] (load on mount, debounced save while editing) and
//! the [`CatalogSync`] that keeps synced rows priced from the catalog.

pub mod catalog_sync;
pub mod debounce;
pub mod estimate_panel;
pub mod persistence;
pub mod state;

use std::time::Duration;

pub use catalog_sync::CatalogSync;
pub use debounce::DebounceTimer;
pub use estimate_panel::EstimatePanel;
pub use persistence::PersistenceBridge;
pub use state::{ChangeOrigin, EstimateSnapshot, EstimateState};

pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelConfig {
    /// Quiet period after the last change before the estimate is saved.
    pub save_delay: Duration,
    /// Whether changes are saved at all.
    pub editing: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            save_delay: DEFAULT_SAVE_DELAY,
            editing: false,
        }
    }
}

impl PanelConfig {
    pub fn editing() -> Self {
        Self {
            editing: true,
            ..Self::default()
        }
    }
}
