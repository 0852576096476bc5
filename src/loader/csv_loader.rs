use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{ColumnNames, DataSection};
use crate::models::{SalesTable, TransactionRecord};
use crate::processor::StateNormalizer;

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("Data file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Data file {} contains no rows", .0.display())]
    Empty(PathBuf),

    #[error("Required column '{0}' is missing")]
    MissingColumn(String),

    #[error("Line {line}: missing value for '{column}'")]
    MissingValue { line: usize, column: String },

    #[error("Line {line}: cannot parse date '{value}'")]
    InvalidDate { line: usize, value: String },

    #[error("Line {line}: invalid value '{value}' for '{column}'")]
    InvalidValue {
        line: usize,
        column: String,
        value: String,
    },

    #[error("Failed to build sales table: {0}")]
    Polars(#[from] PolarsError),
}

/// Reads the sales export once and hands out the shared base table.
pub struct CsvLoader {
    path: PathBuf,
    date_formats: Vec<String>,
    columns: ColumnNames,
    normalizer: StateNormalizer,
    cache: OnceCell<Arc<SalesTable>>,
}

impl CsvLoader {
    pub fn new(path: impl AsRef<Path>, date_formats: Vec<String>, columns: ColumnNames) -> Self {
        CsvLoader {
            path: path.as_ref().to_path_buf(),
            date_formats,
            columns,
            normalizer: StateNormalizer::new(),
            cache: OnceCell::new(),
        }
    }

    pub fn from_config(config: &DataSection) -> Self {
        Self::new(
            &config.path,
            config.date_formats.clone(),
            config.columns.clone(),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the base table, reading the file on the first call only.
    pub fn load(&self) -> Result<Arc<SalesTable>, DataLoadError> {
        self.cache
            .get_or_try_init(|| self.read_table().map(Arc::new))
            .map(Arc::clone)
    }

    fn read_table(&self) -> Result<SalesTable, DataLoadError> {
        if !self.path.exists() {
            return Err(DataLoadError::NotFound(self.path.clone()));
        }

        info!("Reading sales data from {}", self.path.display());

        // Every column comes in as a string; typing happens row by row below
        // so errors can name the offending line.
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(self.path.clone()))
            .and_then(|reader| reader.finish())
            .map_err(|source| DataLoadError::Read {
                path: self.path.clone(),
                source,
            })?;

        if df.height() == 0 {
            return Err(DataLoadError::Empty(self.path.clone()));
        }

        let records = self.parse_records(&df)?;
        let table = SalesTable::from_records(&records, &self.normalizer)?;

        if let Some((first, last)) = table.date_bounds()? {
            info!(
                "Loaded {} transactions ({} to {})",
                table.height(),
                first,
                last
            );
        }

        Ok(table)
    }

    fn parse_records(&self, df: &DataFrame) -> Result<Vec<TransactionRecord>, DataLoadError> {
        let columns = &self.columns;
        let dates = string_column(df, &columns.date)?;
        let categories = string_column(df, &columns.category)?;
        let statuses = string_column(df, &columns.courier_status)?;
        let quantities = string_column(df, &columns.quantity)?;
        let amounts = string_column(df, &columns.amount)?;
        let states = string_column(df, &columns.ship_state)?;
        let flags = string_column(df, &columns.b2b)?;

        let mut records = Vec::with_capacity(df.height());

        for idx in 0..df.height() {
            // Header is line 1.
            let line = idx + 2;

            let raw_date = clean_text(dates.get(idx)).ok_or_else(|| DataLoadError::MissingValue {
                line,
                column: columns.date.clone(),
            })?;
            let order_date = parse_date(&raw_date, &self.date_formats)
                .ok_or(DataLoadError::InvalidDate {
                    line,
                    value: raw_date,
                })?;

            let category =
                clean_text(categories.get(idx)).ok_or_else(|| DataLoadError::MissingValue {
                    line,
                    column: columns.category.clone(),
                })?;

            let raw_quantity = quantities.get(idx).unwrap_or_default();
            let quantity = parse_quantity(raw_quantity).ok_or_else(|| {
                DataLoadError::InvalidValue {
                    line,
                    column: columns.quantity.clone(),
                    value: raw_quantity.to_string(),
                }
            })?;

            let raw_amount = amounts.get(idx);
            let amount = parse_amount(raw_amount).ok_or_else(|| DataLoadError::InvalidValue {
                line,
                column: columns.amount.clone(),
                value: raw_amount.unwrap_or_default().to_string(),
            })?;

            let raw_flag = flags.get(idx);
            let b2b = parse_flag(raw_flag).ok_or_else(|| DataLoadError::InvalidValue {
                line,
                column: columns.b2b.clone(),
                value: raw_flag.unwrap_or_default().to_string(),
            })?;

            records.push(TransactionRecord {
                order_date,
                category,
                courier_status: clean_text(statuses.get(idx)),
                quantity,
                amount,
                ship_state: clean_text(states.get(idx)),
                b2b,
            });
        }

        debug!("Parsed {} rows", records.len());
        Ok(records)
    }
}

fn string_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked, DataLoadError> {
    let column = df
        .column(name)
        .map_err(|_| DataLoadError::MissingColumn(name.to_string()))?;
    Ok(column.str()?)
}

fn clean_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// First format that parses wins.
pub fn parse_date(raw: &str, formats: &[String]) -> Option<NaiveDate> {
    let raw = raw.trim();
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// Non-negative whole number that fits in an `i64`; "2.0" is accepted as 2.
pub fn parse_quantity(raw: &str) -> Option<i64> {
    let raw = raw.trim();

    if let Ok(value) = raw.parse::<i64>() {
        return (value >= 0).then_some(value);
    }

    raw.parse::<f64>()
        .ok()
        .filter(|v| *v >= 0.0 && *v < i64::MAX as f64 && v.fract() == 0.0)
        .map(|v| v as i64)
}

/// Strips currency markers and thousands separators. A blank amount is 0.0.
pub fn parse_amount(raw: Option<&str>) -> Option<f64> {
    let cleaned = raw
        .unwrap_or_default()
        .replace(['₹', '$', ','], "")
        .replace("INR", "");
    let trimmed = cleaned.trim();

    if trimmed.is_empty() {
        return Some(0.0);
    }

    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Blank counts as a consumer order.
pub fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw.unwrap_or_default().trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Some(true),
        "false" | "0" | "no" | "n" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::date;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "index,Order ID,Date,Status,Category,Courier Status,Qty,currency,Amount,ship-state,B2B";

    fn csv_file(rows: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn loader_for(file: &NamedTempFile) -> CsvLoader {
        let config = DataSection {
            path: file.path().to_str().unwrap().to_string(),
            ..crate::config::DashboardConfig::default().data
        };
        CsvLoader::from_config(&config)
    }

    #[test]
    fn test_load_sales_export() {
        let file = csv_file(&[
            r#"0,405-1,04-30-22,Shipped,Set,Shipped,1,INR,"1,049.00",MAHARASHTRA,False"#,
            "1,405-2,04-30-22,Cancelled,Kurta,,0,,,KARNATAKA,False",
            "2,405-3,05-01-22,Shipped,Set,Shipped,2,INR,899.00, orissa ,True",
        ]);
        let table = loader_for(&file).load().unwrap();
        let records = table.records().unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].order_date, date("2022-04-30"));
        assert_eq!(records[0].amount, 1049.0);
        assert_eq!(records[0].ship_state.as_deref(), Some("MAHARASHTRA"));
        assert_eq!(records[1].courier_status, None);
        assert_eq!(records[1].amount, 0.0);
        assert_eq!(records[1].quantity, 0);
        assert_eq!(records[2].ship_state.as_deref(), Some("orissa"));
        assert!(records[2].b2b);
        assert!(!records[0].b2b);
        assert_eq!(
            table.date_bounds().unwrap(),
            Some((date("2022-04-30"), date("2022-05-01")))
        );
    }

    #[test]
    fn test_load_is_cached() {
        let file = csv_file(&["0,405-1,04-30-22,Shipped,Set,Shipped,1,INR,100.00,Goa,False"]);
        let loader = loader_for(&file);

        let first = loader.load().unwrap();
        let second = loader.load().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_missing_file() {
        let loader = CsvLoader::new(
            "does/not/exist.csv",
            vec!["%Y-%m-%d".to_string()],
            ColumnNames::default(),
        );

        assert!(matches!(loader.load(), Err(DataLoadError::NotFound(_))));
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let file = csv_file(&[]);

        assert!(matches!(
            loader_for(&file).load(),
            Err(DataLoadError::Empty(_))
        ));
    }

    #[test]
    fn test_missing_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Date,Category,Qty").unwrap();
        writeln!(file, "04-30-22,Set,1").unwrap();
        file.flush().unwrap();

        match loader_for(&file).load() {
            Err(DataLoadError::MissingColumn(column)) => assert_eq!(column, "Courier Status"),
            other => panic!("expected missing column, got {:?}", other.map(|t| t.height())),
        }
    }

    #[test]
    fn test_unparseable_date_reports_line() {
        let file = csv_file(&[
            "0,405-1,04-30-22,Shipped,Set,Shipped,1,INR,100.00,Goa,False",
            "1,405-2,not-a-date,Shipped,Set,Shipped,1,INR,100.00,Goa,False",
        ]);

        match loader_for(&file).load() {
            Err(DataLoadError::InvalidDate { line, value }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("expected invalid date, got {:?}", other.map(|t| t.height())),
        }
    }

    #[test]
    fn test_negative_quantity_is_rejected() {
        let file = csv_file(&["0,405-1,04-30-22,Shipped,Set,Shipped,-1,INR,100.00,Goa,False"]);

        assert!(matches!(
            loader_for(&file).load(),
            Err(DataLoadError::InvalidValue { line: 2, .. })
        ));
    }

    #[test]
    fn test_oversized_quantity_is_rejected() {
        let file = csv_file(&["0,405-1,04-30-22,Shipped,Set,Shipped,1e30,INR,100.00,Goa,False"]);

        match loader_for(&file).load() {
            Err(DataLoadError::InvalidValue { line, column, value }) => {
                assert_eq!(line, 2);
                assert_eq!(column, "Qty");
                assert_eq!(value, "1e30");
            }
            other => panic!("expected invalid quantity, got {:?}", other.map(|t| t.height())),
        }
    }

    #[test]
    fn test_blank_date_is_missing_value() {
        let file = csv_file(&[
            "0,405-1,04-30-22,Shipped,Set,Shipped,1,INR,100.00,Goa,False",
            "1,405-2,,Shipped,Set,Shipped,1,INR,100.00,Goa,False",
        ]);

        match loader_for(&file).load() {
            Err(DataLoadError::MissingValue { line, column }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "Date");
            }
            other => panic!("expected missing date, got {:?}", other.map(|t| t.height())),
        }
    }

    #[test]
    fn test_unparseable_flag_is_rejected() {
        let file = csv_file(&["0,405-1,04-30-22,Shipped,Set,Shipped,1,INR,100.00,Goa,maybe"]);

        match loader_for(&file).load() {
            Err(DataLoadError::InvalidValue { column, value, .. }) => {
                assert_eq!(column, "B2B");
                assert_eq!(value, "maybe");
            }
            other => panic!("expected invalid flag, got {:?}", other.map(|t| t.height())),
        }
    }

    #[test]
    fn test_bad_amounts_are_rejected() {
        for amount in ["-5.00", "abc"] {
            let row = format!("0,405-1,04-30-22,Shipped,Set,Shipped,1,INR,{},Goa,False", amount);
            let file = csv_file(&[row.as_str()]);

            match loader_for(&file).load() {
                Err(DataLoadError::InvalidValue { line, column, value }) => {
                    assert_eq!(line, 2);
                    assert_eq!(column, "Amount");
                    assert_eq!(value, amount);
                }
                other => panic!("expected invalid amount, got {:?}", other.map(|t| t.height())),
            }
        }
    }

    #[test]
    fn test_parse_date_formats() {
        let formats: Vec<String> = ["%m-%d-%y", "%Y-%m-%d", "%m/%d/%Y"]
            .iter()
            .map(|f| f.to_string())
            .collect();

        assert_eq!(parse_date("04-30-22", &formats), Some(date("2022-04-30")));
        assert_eq!(parse_date("2022-04-30", &formats), Some(date("2022-04-30")));
        assert_eq!(parse_date(" 4/30/2022 ", &formats), Some(date("2022-04-30")));
        assert_eq!(parse_date("30.04.2022", &formats), None);
    }

    #[test]
    fn test_parse_numbers_and_flags() {
        assert_eq!(parse_quantity("3"), Some(3));
        assert_eq!(parse_quantity("2.0"), Some(2));
        assert_eq!(parse_quantity("1.5"), None);
        assert_eq!(parse_quantity("-1"), None);
        assert_eq!(parse_quantity(""), None);
        assert_eq!(parse_quantity("1e30"), None);
        assert_eq!(parse_quantity("9223372036854775808.0"), None);
        assert_eq!(parse_quantity("inf"), None);
        assert_eq!(parse_quantity("1e3"), Some(1000));

        assert_eq!(parse_amount(Some("₹1,299.50")), Some(1299.5));
        assert_eq!(parse_amount(Some("INR 450")), Some(450.0));
        assert_eq!(parse_amount(None), Some(0.0));
        assert_eq!(parse_amount(Some("-5")), None);
        assert_eq!(parse_amount(Some("abc")), None);

        assert_eq!(parse_flag(Some("True")), Some(true));
        assert_eq!(parse_flag(Some("FALSE")), Some(false));
        assert_eq!(parse_flag(None), Some(false));
        assert_eq!(parse_flag(Some("maybe")), None);
    }
}
