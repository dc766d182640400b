use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product in the shared price list. Estimates match it by exact name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub price: Decimal,
}

impl CatalogEntry {
    pub fn new(
        name: impl Into<String>,
        price: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// A change notification from the catalog feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogChange {
    pub kind: ChangeKind,
    pub entry: CatalogEntry,
}

impl CatalogChange {
    pub fn added(entry: CatalogEntry) -> Self {
        Self {
            kind: ChangeKind::Added,
            entry,
        }
    }

    pub fn modified(entry: CatalogEntry) -> Self {
        Self {
            kind: ChangeKind::Modified,
            entry,
        }
    }

    pub fn removed(entry: CatalogEntry) -> Self {
        Self {
            kind: ChangeKind::Removed,
            entry,
        }
    }

    /// Only additions and modifications carry a price worth applying.
    pub fn carries_price(&self) -> bool {
        matches!(self.kind, ChangeKind::Added | ChangeKind::Modified)
    }
}
