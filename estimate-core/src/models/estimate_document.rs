use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::LineItem;

/// Kind-specific cost that is added on top of the materials cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CostField {
    #[serde(rename = "installationCost")]
    Installation,
    #[serde(rename = "deliveryCost")]
    Delivery,
    #[serde(rename = "roofWorkCost")]
    RoofWork,
}

impl CostField {
    pub fn all() -> &'static [CostField] {
        &[CostField::Installation, CostField::Delivery, CostField::RoofWork]
    }

    /// Key used for this field in a stored estimate document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Installation => "installationCost",
            Self::Delivery => "deliveryCost",
            Self::RoofWork => "roofWorkCost",
        }
    }

    /// Short name used on the command line.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Installation => "installation",
            Self::Delivery => "delivery",
            Self::RoofWork => "roof-work",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Installation => "Монтаж",
            Self::Delivery => "Доставка",
            Self::RoofWork => "Работа по крыше",
        }
    }

    /// Accepts either the slug or the document key.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|field| field.slug() == s || field.as_str() == s)
    }
}

impl fmt::Display for CostField {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A priced bill of materials for one scope of work, tied to a client.
///
/// Extra cost fields that the estimate kind does not carry stay `None` and
/// are left out of the serialized document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateDocument {
    pub items: Vec<LineItem>,
    pub total_materials_cost: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roof_work_cost: Option<Decimal>,
    #[serde(default)]
    pub total_cost: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl EstimateDocument {
    /// Value of an extra cost field, or `None` when the estimate does not carry it.
    pub fn extra_cost(
        &self,
        field: CostField,
    ) -> Option<Decimal> {
        match field {
            CostField::Installation => self.installation_cost,
            CostField::Delivery => self.delivery_cost,
            CostField::RoofWork => self.roof_work_cost,
        }
    }

    pub fn extra_cost_mut(
        &mut self,
        field: CostField,
    ) -> &mut Option<Decimal> {
        match field {
            CostField::Installation => &mut self.installation_cost,
            CostField::Delivery => &mut self.delivery_cost,
            CostField::RoofWork => &mut self.roof_work_cost,
        }
    }

    /// Extra cost fields present on this estimate, in display order.
    pub fn extra_costs(&self) -> Vec<(CostField, Decimal)> {
        CostField::all()
            .iter()
            .filter_map(|field| self.extra_cost(*field).map(|value| (*field, value)))
            .collect()
    }

    /// Index of the first row with the given name.
    pub fn position(
        &self,
        name: &str,
    ) -> Option<usize> {
        self.items.iter().position(|item| item.name == name)
    }
}
