use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;

use crate::processor::DEFAULT_TOP_REGIONS;

pub const DATA_PATH_ENV: &str = "DASHBOARD_DATA_PATH";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub data: DataSection,
    #[serde(default)]
    pub report: ReportSection,
    #[serde(default)]
    pub filters: FilterDefaults,
}

/// Where the sales export lives and how to read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSection {
    pub path: String,
    /// `chrono` format strings, tried in order.
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
    #[serde(default)]
    pub columns: ColumnNames,
}

/// Header names of the source columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub date: String,
    pub category: String,
    pub courier_status: String,
    pub quantity: String,
    pub amount: String,
    pub ship_state: String,
    pub b2b: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    pub title: String,
    pub top_regions: usize,
    pub export_dir: String,
    pub chart_width: usize,
}

/// Initial sidebar values. Missing dates fall back to the table bounds and
/// empty lists select every option.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterDefaults {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub categories: Vec<String>,
    pub courier_statuses: Vec<String>,
}

impl DashboardConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dashboard config file: {}", path))?;

        let mut config: DashboardConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse dashboard config file: {}", path))?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = env::var(DATA_PATH_ENV) {
            if !path.trim().is_empty() {
                self.data.path = path;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.data.path.trim().is_empty() {
            return Err(anyhow::anyhow!("Data path cannot be empty"));
        }

        if self.data.date_formats.is_empty() {
            return Err(anyhow::anyhow!("At least one date format is required"));
        }

        if self.report.top_regions == 0 {
            return Err(anyhow::anyhow!("report.top_regions must be at least 1"));
        }

        if let (Some(start), Some(end)) = (self.filters.start, self.filters.end) {
            if start > end {
                return Err(anyhow::anyhow!(
                    "filters.start ({}) is after filters.end ({})",
                    start,
                    end
                ));
            }
        }

        Ok(())
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data: DataSection {
                path: "data/sample_sales.csv".to_string(),
                date_formats: default_date_formats(),
                columns: ColumnNames::default(),
            },
            report: ReportSection::default(),
            filters: FilterDefaults::default(),
        }
    }
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            category: "Category".to_string(),
            courier_status: "Courier Status".to_string(),
            quantity: "Qty".to_string(),
            amount: "Amount".to_string(),
            ship_state: "ship-state".to_string(),
            b2b: "B2B".to_string(),
        }
    }
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            title: "Amazon Sales Analysis - Dashboard".to_string(),
            top_regions: DEFAULT_TOP_REGIONS,
            export_dir: "exports".to_string(),
            chart_width: 40,
        }
    }
}

fn default_date_formats() -> Vec<String> {
    ["%m-%d-%y", "%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%d-%b-%Y"]
        .iter()
        .map(|f| f.to_string())
        .collect()
}
