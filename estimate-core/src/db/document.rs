//! Conversion between [`EstimateDocument`] and the JSON body a store keeps.
//!
//! Before a write the document goes through [`prepare_for_save`]: unset
//! fields are stripped and any client-side `updatedAt` is dropped, since the
//! store stamps every write itself. On the way back [`restore_document`]
//! attaches the store's timestamp.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::calculations::totals::refresh_total_cost;
use crate::db::repository::StoreError;
use crate::models::EstimateDocument;

const UPDATED_AT_KEY: &str = "updatedAt";
const TOTAL_COST_KEY: &str = "totalCost";

/// A store-safe estimate body, ready to be written as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedEstimate {
    body: Map<String, Value>,
}

impl PreparedEstimate {
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.body)
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        serde_json::to_string(&self.body).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

/// Turn a document into the body a store writes.
pub fn prepare_for_save(doc: &EstimateDocument) -> Result<PreparedEstimate, StoreError> {
    let value = serde_json::to_value(doc).map_err(|e| StoreError::Serialization(e.to_string()))?;

    let Value::Object(mut body) = strip_nulls(value) else {
        return Err(StoreError::Serialization(
            "estimate did not serialize to an object".to_string(),
        ));
    };
    body.remove(UPDATED_AT_KEY);

    Ok(PreparedEstimate { body })
}

/// Rebuild a document from a stored body and the timestamp of its last write.
///
/// Documents written without a `totalCost` get it derived from the
/// materials cost and extra costs.
pub fn restore_document(
    body: Value,
    updated_at: Option<DateTime<Utc>>,
) -> Result<EstimateDocument, StoreError> {
    let has_total_cost = body.get(TOTAL_COST_KEY).is_some_and(|v| !v.is_null());

    let mut doc: EstimateDocument =
        serde_json::from_value(body).map_err(|e| StoreError::Serialization(e.to_string()))?;

    if !has_total_cost {
        refresh_total_cost(&mut doc);
    }
    if updated_at.is_some() {
        doc.updated_at = updated_at;
    }
    Ok(doc)
}

/// Parse a stored JSON string with [`restore_document`].
pub fn restore_document_str(
    json: &str,
    updated_at: Option<DateTime<Utc>>,
) -> Result<EstimateDocument, StoreError> {
    let body: Value =
        serde_json::from_str(json).map_err(|e| StoreError::Serialization(e.to_string()))?;
    restore_document(body, updated_at)
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}
