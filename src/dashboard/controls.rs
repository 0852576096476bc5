use anyhow::{Result, anyhow, bail};
use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::config::FilterDefaults;
use crate::models::SalesTable;
use crate::processor::{FilterSelection, InvalidFilterRange};

/// Sidebar state: a date range pinned to the table's bounds plus category and
/// courier status multi-selects.
#[derive(Debug, Clone)]
pub struct FilterControls {
    min_date: NaiveDate,
    max_date: NaiveDate,
    start: NaiveDate,
    end: NaiveDate,
    category_options: Vec<String>,
    status_options: Vec<String>,
    categories: BTreeSet<String>,
    statuses: BTreeSet<String>,
}

impl FilterControls {
    /// Full date range with every category and every non-null status selected.
    pub fn from_table(table: &SalesTable) -> Result<Self> {
        let full = FilterSelection::full_range(table)?
            .ok_or_else(|| anyhow!("Cannot build filter controls for an empty table"))?;
        let (min_date, max_date) = (full.start, full.end);
        let category_options = table.categories()?;
        let status_options = table.courier_statuses()?;

        Ok(FilterControls {
            min_date,
            max_date,
            start: min_date,
            end: max_date,
            categories: category_options.iter().cloned().collect(),
            statuses: status_options.iter().cloned().collect(),
            category_options,
            status_options,
        })
    }

    pub fn with_defaults(mut self, defaults: &FilterDefaults) -> Result<Self> {
        if let Some(start) = defaults.start {
            self.set_start(start);
        }
        if let Some(end) = defaults.end {
            self.set_end(end);
        }

        if !defaults.categories.is_empty() {
            self.categories = resolve_all(&self.category_options, &defaults.categories, "category")?;
        }
        if !defaults.courier_statuses.is_empty() {
            self.statuses =
                resolve_all(&self.status_options, &defaults.courier_statuses, "courier status")?;
        }

        Ok(self)
    }

    pub fn date_bounds(&self) -> (NaiveDate, NaiveDate) {
        (self.min_date, self.max_date)
    }

    pub fn category_options(&self) -> &[String] {
        &self.category_options
    }

    pub fn status_options(&self) -> &[String] {
        &self.status_options
    }

    /// Clamps into the table bounds. An end date before the new start moves
    /// up to it. Returns the date actually applied.
    pub fn set_start(&mut self, date: NaiveDate) -> NaiveDate {
        self.start = date.clamp(self.min_date, self.max_date);
        if self.end < self.start {
            self.end = self.start;
        }
        self.start
    }

    /// Clamps into `[start, max]`. Returns the date actually applied.
    pub fn set_end(&mut self, date: NaiveDate) -> NaiveDate {
        self.end = date.clamp(self.start, self.max_date);
        self.end
    }

    /// Flips one category and reports whether it is now selected.
    pub fn toggle_category(&mut self, name: &str) -> Result<bool> {
        let option = resolve(&self.category_options, name, "category")?;
        Ok(toggle(&mut self.categories, option))
    }

    pub fn toggle_status(&mut self, name: &str) -> Result<bool> {
        let option = resolve(&self.status_options, name, "courier status")?;
        Ok(toggle(&mut self.statuses, option))
    }

    pub fn select_all_categories(&mut self) {
        self.categories = self.category_options.iter().cloned().collect();
    }

    pub fn clear_categories(&mut self) {
        self.categories.clear();
    }

    pub fn select_all_statuses(&mut self) {
        self.statuses = self.status_options.iter().cloned().collect();
    }

    pub fn clear_statuses(&mut self) {
        self.statuses.clear();
    }

    pub fn selection(&self) -> Result<FilterSelection, InvalidFilterRange> {
        FilterSelection::new(
            self.start,
            self.end,
            self.categories.clone(),
            self.statuses.clone(),
        )
    }
}

fn toggle(selected: &mut BTreeSet<String>, option: String) -> bool {
    if selected.remove(&option) {
        false
    } else {
        selected.insert(option);
        true
    }
}

/// Matches `name` against the offered options, ignoring case.
fn resolve(options: &[String], name: &str, kind: &str) -> Result<String> {
    let name = name.trim();
    match options.iter().find(|o| o.eq_ignore_ascii_case(name)) {
        Some(option) => Ok(option.clone()),
        None => bail!("Unknown {} '{}' (options: {})", kind, name, options.join(", ")),
    }
}

fn resolve_all(options: &[String], names: &[String], kind: &str) -> Result<BTreeSet<String>> {
    names.iter().map(|name| resolve(options, name, kind)).collect()
}
