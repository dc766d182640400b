use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One material or labor row of an estimate.
///
/// `name` is the row's key inside its estimate and the join key against the
/// product catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub unit: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub total: Decimal,
}

impl LineItem {
    pub fn new(
        name: impl Into<String>,
        unit: impl Into<String>,
        quantity: Decimal,
        price: Decimal,
        total: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            quantity,
            price,
            total,
        }
    }

    /// Rows without a unit carry a fixed total (debris removal, labor and
    /// tool wear) that is never derived from quantity and price.
    pub fn is_flat_fee(&self) -> bool {
        self.unit.is_empty()
    }
}

/// Editable numeric column of a [`LineItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemField {
    Quantity,
    Price,
    Total,
}

impl ItemField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quantity => "quantity",
            Self::Price => "price",
            Self::Total => "total",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quantity" | "qty" => Some(Self::Quantity),
            "price" => Some(Self::Price),
            "total" => Some(Self::Total),
            _ => None,
        }
    }
}

impl fmt::Display for ItemField {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
