//! CSV loader for appliance lists.
//!
//! ## CSV Format
//!
//! Columns are matched by header name, so their order does not matter. Header
//! names are case-sensitive.
//!
//! | Column | Type | Notes |
//! |-----------------------|---------|------------------------------|
//! | `name` | string | e.g. `Refrigerator` |
//! | `power_watts` | decimal | rated power in watts |
//! | `usage_hours_per_day` | decimal | average daily hours of use |
//!
//! Empty cells load as unanswered fields; the intake form reports them when
//! the Appliances step is validated.
//!
//! ### Example
//!
//! ```csv
//! name,power_watts,usage_hours_per_day
//! Refrigerator,150,24
//! Air conditioner,1500,6.5
//! ```
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::intake::ApplianceEntry;

#[derive(Debug, Deserialize)]
struct CsvRow {
    name: String,
    power_watts: Option<Decimal>,
    usage_hours_per_day: Option<Decimal>,
}

impl From<CsvRow> for ApplianceEntry {
    fn from(row: CsvRow) -> Self {
        Self {
            name: row.name,
            power_watts: row.power_watts,
            usage_hours_per_day: row.usage_hours_per_day,
        }
    }
}

/// Errors that can occur while loading appliance CSV data.
#[derive(Debug, thiserror::Error)]
pub enum CsvLoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Bad structure, missing column, or a non-numeric power/usage cell.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),
}

/// Parse CSV text and return the appliances in file order.
pub fn load_from_str(input: &str) -> Result<Vec<ApplianceEntry>, CsvLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .map(|result| Ok(result?.into()))
        .collect()
}

/// Read a file from disk and delegate to [`load_from_str`].
pub fn load_from_file(path: &Path) -> Result<Vec<ApplianceEntry>, CsvLoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CsvLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let appliances = load_from_str(&contents)?;
    tracing::debug!(path = %path.display(), count = appliances.len(), "loaded appliances");
    Ok(appliances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    const APPLIANCES_CSV: &str = "\
name,power_watts,usage_hours_per_day
Refrigerator,150,24
Air conditioner,1500,6.5
";

    #[test]
    fn test_rows_load_in_file_order() {
        let appliances = load_from_str(APPLIANCES_CSV).expect("should parse");

        assert_eq!(
            appliances,
            vec![
                ApplianceEntry {
                    name: "Refrigerator".to_string(),
                    power_watts: Some(dec!(150)),
                    usage_hours_per_day: Some(dec!(24)),
                },
                ApplianceEntry {
                    name: "Air conditioner".to_string(),
                    power_watts: Some(dec!(1500)),
                    usage_hours_per_day: Some(dec!(6.5)),
                },
            ]
        );
    }

    #[test]
    fn test_column_order_does_not_matter() {
        let csv = "usage_hours_per_day,name,power_watts\n3,Washing machine,500\n";

        let appliances = load_from_str(csv).expect("should parse");

        assert_eq!(appliances[0].name, "Washing machine");
        assert_eq!(appliances[0].power_watts, Some(dec!(500)));
        assert_eq!(appliances[0].usage_hours_per_day, Some(dec!(3)));
    }

    #[test]
    fn test_empty_cells_are_unanswered() {
        let csv = "name,power_watts,usage_hours_per_day\nKettle,,\n";

        let appliances = load_from_str(csv).expect("should parse");

        assert_eq!(appliances[0].power_watts, None);
        assert_eq!(appliances[0].usage_hours_per_day, None);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let csv = "name,power_watts,usage_hours_per_day\n  Fan  , 75 , 8 \n";

        let appliances = load_from_str(csv).expect("should parse");

        assert_eq!(appliances[0].name, "Fan");
        assert_eq!(appliances[0].power_watts, Some(dec!(75)));
    }

    #[test]
    fn test_non_numeric_power_returns_parse_error() {
        let csv = "name,power_watts,usage_hours_per_day\nFan,lots,8\n";

        match load_from_str(csv) {
            Err(CsvLoadError::Parse(_)) => {}
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_name_column_returns_parse_error() {
        let csv = "power_watts,usage_hours_per_day\n75,8\n";

        assert!(matches!(load_from_str(csv), Err(CsvLoadError::Parse(_))));
    }

    #[test]
    fn test_header_only_is_empty() {
        let appliances = load_from_str("name,power_watts,usage_hours_per_day\n").unwrap();

        assert!(appliances.is_empty());
    }
}
