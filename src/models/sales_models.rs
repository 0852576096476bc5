use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One order line of the sales export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub order_date: NaiveDate,
    pub category: String,
    pub courier_status: Option<String>,
    pub quantity: i64,
    pub amount: f64,
    /// Ship-to state as it appeared in the source, trimmed.
    pub ship_state: Option<String>,
    pub b2b: bool,
}

/// Quantity and amount sold for one category on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub category: String,
    pub quantity: i64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub quantity: i64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionTotal {
    pub region: String,
    pub amount: f64,
}

/// Order counts for business and consumer buyers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSplit {
    pub b2b: usize,
    pub b2c: usize,
}

impl ChannelSplit {
    pub fn total(&self) -> usize {
        self.b2b + self.b2c
    }
}

/// Pie slice label with its colour and share of the shown total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
    pub share: f64,
}
