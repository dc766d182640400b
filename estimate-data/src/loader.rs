use std::collections::HashMap;
use std::io::Read;

use estimate_core::{CatalogEntry, ChangeKind, EstimateStore, StoreError};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading catalog prices.
#[derive(Debug, Error)]
pub enum CatalogLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Row {row}: product name is empty")]
    EmptyName { row: usize },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<csv::Error> for CatalogLoaderError {
    fn from(err: csv::Error) -> Self {
        CatalogLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from a price list CSV file.
///
/// - `name`: the product name, matched exactly against estimate rows
/// - `price`: the unit price; spaces and thousands commas are ignored
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PriceRecord {
    pub name: String,
    #[serde(deserialize_with = "deserialize_price")]
    pub price: Decimal,
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let cleaned: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    cleaned.parse::<Decimal>().map_err(|e| {
        serde::de::Error::custom(format!("invalid price '{}': {}", s.trim(), e))
    })
}

/// What a load did to the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub added: usize,
    pub modified: usize,
    pub unchanged: usize,
}

impl LoadSummary {
    pub fn written(&self) -> usize {
        self.added + self.modified
    }
}

/// Loader for product prices from CSV files.
///
/// Records are written through the [`EstimateStore`] trait, so any backend
/// works. Every write reaches live catalog subscribers.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Parse price records from a CSV reader with a `name,price` header.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<PriceRecord>, CatalogLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut records = Vec::new();

        for (index, result) in csv_reader.deserialize().enumerate() {
            let record: PriceRecord = result?;
            if record.name.is_empty() {
                // Header is line 1.
                return Err(CatalogLoaderError::EmptyName { row: index + 2 });
            }
            records.push(record);
        }

        Ok(records)
    }

    /// Upsert the records into the catalog.
    ///
    /// Products whose stored price already matches are skipped so that
    /// subscribers see no spurious change. When a name appears more than
    /// once the last record wins.
    pub async fn load<S: EstimateStore + ?Sized>(
        store: &S,
        records: &[PriceRecord],
    ) -> Result<LoadSummary, CatalogLoaderError> {
        let mut current: HashMap<String, Decimal> = store
            .list_products()
            .await?
            .into_iter()
            .map(|entry| (entry.name, entry.price))
            .collect();

        let mut summary = LoadSummary::default();
        for record in records {
            if current.get(&record.name) == Some(&record.price) {
                summary.unchanged += 1;
                continue;
            }

            let entry = CatalogEntry::new(record.name.clone(), record.price);
            match store.upsert_product(&entry).await? {
                ChangeKind::Added => summary.added += 1,
                _ => summary.modified += 1,
            }
            current.insert(entry.name, entry.price);
        }

        Ok(summary)
    }
}
