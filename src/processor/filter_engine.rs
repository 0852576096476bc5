use anyhow::Result;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::models::{CATEGORY, COURIER_STATUS, ORDER_DATE, SalesTable};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("start date {start} is after end date {end}")]
pub struct InvalidFilterRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// User-selected filter values.
///
/// An empty category or status set means "no restriction" rather than
/// "match nothing".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub categories: BTreeSet<String>,
    pub courier_statuses: BTreeSet<String>,
}

impl FilterSelection {
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        categories: BTreeSet<String>,
        courier_statuses: BTreeSet<String>,
    ) -> Result<Self, InvalidFilterRange> {
        if start > end {
            return Err(InvalidFilterRange { start, end });
        }

        Ok(Self {
            start,
            end,
            categories,
            courier_statuses,
        })
    }

    /// Whole date range of the table with no category or status restriction.
    pub fn full_range(table: &SalesTable) -> PolarsResult<Option<Self>> {
        Ok(table.date_bounds()?.map(|(start, end)| Self {
            start,
            end,
            categories: BTreeSet::new(),
            courier_statuses: BTreeSet::new(),
        }))
    }

    pub fn predicates(&self) -> Vec<RowPredicate> {
        let mut predicates = vec![RowPredicate::DateRange {
            start: self.start,
            end: self.end,
        }];

        if !self.categories.is_empty() {
            predicates.push(RowPredicate::CategoryIn(self.categories.clone()));
        }

        if !self.courier_statuses.is_empty() {
            predicates.push(RowPredicate::StatusIn(self.courier_statuses.clone()));
        }

        predicates
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowPredicate {
    /// Inclusive on both ends. A backward range matches no rows.
    DateRange { start: NaiveDate, end: NaiveDate },
    CategoryIn(BTreeSet<String>),
    /// Rows without a courier status never match.
    StatusIn(BTreeSet<String>),
}

impl RowPredicate {
    /// Rows where the expression is null are dropped by the filter, the same
    /// as rows where it is false.
    fn expr(&self) -> Expr {
        match self {
            RowPredicate::DateRange { start, end } => col(ORDER_DATE)
                .gt_eq(lit(*start))
                .and(col(ORDER_DATE).lt_eq(lit(*end))),
            RowPredicate::CategoryIn(allowed) => any_of(CATEGORY, allowed),
            RowPredicate::StatusIn(allowed) => any_of(COURIER_STATUS, allowed),
        }
    }
}

fn any_of(column: &str, allowed: &BTreeSet<String>) -> Expr {
    allowed.iter().fold(lit(false), |acc, value| {
        acc.or(col(column).eq(lit(value.as_str())))
    })
}

pub struct FilterEngine;

impl FilterEngine {
    /// Rows of `table` matching every part of `selection`, in table order.
    pub fn apply(&self, table: &SalesTable, selection: &FilterSelection) -> Result<SalesTable> {
        let filtered = self.apply_predicates(table, &selection.predicates())?;

        debug!(
            "Filtered {} rows down to {} ({} to {}, {} categories, {} statuses)",
            table.height(),
            filtered.height(),
            selection.start,
            selection.end,
            selection.categories.len(),
            selection.courier_statuses.len()
        );

        Ok(filtered)
    }

    /// Chains one lazy filter per predicate. Filtering keeps table order.
    pub fn apply_predicates(
        &self,
        table: &SalesTable,
        predicates: &[RowPredicate],
    ) -> Result<SalesTable> {
        let df = predicates
            .iter()
            .fold(table.frame().clone().lazy(), |frame, predicate| {
                frame.filter(predicate.expr())
            })
            .collect()?;

        Ok(SalesTable::from_frame(df))
    }
}
