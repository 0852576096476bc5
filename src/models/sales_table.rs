use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashSet;

use crate::models::TransactionRecord;
use crate::processor::StateNormalizer;

pub const ORDER_DATE: &str = "order_date";
pub const CATEGORY: &str = "category";
pub const COURIER_STATUS: &str = "courier_status";
pub const QUANTITY: &str = "qty";
pub const AMOUNT: &str = "amount";
pub const SHIP_STATE: &str = "ship_state";
pub const REGION: &str = "region";
pub const B2B: &str = "b2b";

/// Immutable sales table backed by a polars `DataFrame`.
///
/// The loader builds one base table per process and shares it behind an
/// `Arc`; filtering produces new tables and never touches the base frame.
/// The `region` column holds the normalized `ship_state` value.
#[derive(Debug, Clone)]
pub struct SalesTable {
    df: DataFrame,
}

impl SalesTable {
    pub fn from_records(
        records: &[TransactionRecord],
        normalizer: &StateNormalizer,
    ) -> PolarsResult<Self> {
        let dates: Vec<NaiveDate> = records.iter().map(|r| r.order_date).collect();
        let categories: Vec<String> = records.iter().map(|r| r.category.clone()).collect();
        let statuses: Vec<Option<String>> =
            records.iter().map(|r| r.courier_status.clone()).collect();
        let quantities: Vec<i64> = records.iter().map(|r| r.quantity).collect();
        let amounts: Vec<f64> = records.iter().map(|r| r.amount).collect();
        let states: Vec<Option<String>> = records.iter().map(|r| r.ship_state.clone()).collect();
        let regions: Vec<Option<String>> = records
            .iter()
            .map(|r| r.ship_state.as_deref().map(|s| normalizer.normalize(s)))
            .collect();
        let flags: Vec<bool> = records.iter().map(|r| r.b2b).collect();

        let df = DataFrame::new(vec![
            Series::new(ORDER_DATE.into(), dates).into(),
            Series::new(CATEGORY.into(), categories).into(),
            Series::new(COURIER_STATUS.into(), statuses).into(),
            Series::new(QUANTITY.into(), quantities).into(),
            Series::new(AMOUNT.into(), amounts).into(),
            Series::new(SHIP_STATE.into(), states).into(),
            Series::new(REGION.into(), regions).into(),
            Series::new(B2B.into(), flags).into(),
        ])?;

        Ok(SalesTable { df })
    }

    /// Wraps a frame derived from another `SalesTable`, such as a filter result.
    pub(crate) fn from_frame(df: DataFrame) -> Self {
        SalesTable { df }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn order_dates(&self) -> PolarsResult<Vec<Option<NaiveDate>>> {
        let dates = self.df.column(ORDER_DATE)?.as_materialized_series().date()?;
        Ok(dates.as_date_iter().collect())
    }

    /// Earliest and latest order date, or `None` for an empty table.
    pub fn date_bounds(&self) -> PolarsResult<Option<(NaiveDate, NaiveDate)>> {
        let dates = self.order_dates()?;
        let min = dates.iter().flatten().min().copied();
        let max = dates.iter().flatten().max().copied();
        Ok(min.zip(max))
    }

    /// Distinct categories in order of first appearance.
    pub fn categories(&self) -> PolarsResult<Vec<String>> {
        self.distinct_strings(CATEGORY)
    }

    /// Distinct non-null courier statuses in order of first appearance.
    pub fn courier_statuses(&self) -> PolarsResult<Vec<String>> {
        self.distinct_strings(COURIER_STATUS)
    }

    #[cfg(test)]
    pub fn total_quantity(&self) -> PolarsResult<i64> {
        Ok(self.df.column(QUANTITY)?.i64()?.into_iter().flatten().sum())
    }

    #[cfg(test)]
    pub fn total_amount(&self) -> PolarsResult<f64> {
        Ok(self.df.column(AMOUNT)?.f64()?.into_iter().flatten().sum())
    }

    #[cfg(test)]
    pub fn records(&self) -> PolarsResult<Vec<TransactionRecord>> {
        let dates = self.order_dates()?;
        let categories = self.df.column(CATEGORY)?.str()?;
        let statuses = self.df.column(COURIER_STATUS)?.str()?;
        let quantities = self.df.column(QUANTITY)?.i64()?;
        let amounts = self.df.column(AMOUNT)?.f64()?;
        let states = self.df.column(SHIP_STATE)?.str()?;
        let flags = self.df.column(B2B)?.bool()?;

        let mut records = Vec::with_capacity(self.df.height());
        for (idx, date) in dates.into_iter().enumerate() {
            let Some(order_date) = date else {
                continue;
            };

            records.push(TransactionRecord {
                order_date,
                category: categories.get(idx).unwrap_or_default().to_string(),
                courier_status: statuses.get(idx).map(str::to_string),
                quantity: quantities.get(idx).unwrap_or(0),
                amount: amounts.get(idx).unwrap_or(0.0),
                ship_state: states.get(idx).map(str::to_string),
                b2b: flags.get(idx).unwrap_or(false),
            });
        }

        Ok(records)
    }

    fn distinct_strings(&self, column: &str) -> PolarsResult<Vec<String>> {
        let values = self.df.column(column)?.str()?;
        let mut seen = HashSet::new();
        let mut distinct = Vec::new();

        for value in values.into_iter().flatten() {
            if seen.insert(value) {
                distinct.push(value.to_string());
            }
        }

        Ok(distinct)
    }
}
