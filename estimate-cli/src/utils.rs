use estimate_core::EstimateDocument;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid decimal '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Error returned when a row selector names no row of the estimate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowSelectorError {
    #[error("row {number} is out of range (estimate has {len} rows)")]
    OutOfRange { number: usize, len: usize },

    #[error("no row named '{0}'")]
    UnknownName(String),
}

/// Trims the input and drops spaces and commas used as thousands separators.
fn normalize_decimal_input(s: &str) -> String {
    s.trim().chars().filter(|c| !c.is_whitespace() && *c != ',').collect()
}

/// Parses a string into a [`Decimal`].
///
/// Handles comma and space as thousands separators (e.g. `"1,234.56"`,
/// `"16 000"`). Empty or whitespace-only input is treated as 0.
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseDecimalError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }
    normalized.parse().map_err(|e| {
        tracing::error!(input = %s, "invalid decimal: {}", e);
        ParseDecimalError {
            input: s.to_string(),
            source: e,
        }
    })
}

/// Resolves a row selector to a zero-based index.
///
/// A number is a 1-based row as printed by `show`; anything else is matched
/// against row names.
pub fn resolve_row(
    doc: &EstimateDocument,
    selector: &str,
) -> Result<usize, RowSelectorError> {
    let selector = selector.trim();
    match selector.parse::<usize>() {
        Ok(number) if number >= 1 && number <= doc.items.len() => Ok(number - 1),
        Ok(number) => Err(RowSelectorError::OutOfRange {
            number,
            len: doc.items.len(),
        }),
        Err(_) => doc
            .position(selector)
            .ok_or_else(|| RowSelectorError::UnknownName(selector.to_string())),
    }
}
