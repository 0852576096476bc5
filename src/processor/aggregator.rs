use anyhow::Result;
use polars::prelude::*;

use crate::models::{
    AMOUNT, B2B, CATEGORY, CategoryTotal, ChannelSplit, LegendEntry, ORDER_DATE, QUANTITY, REGION,
    RegionTotal, SalesTable, TrendPoint,
};

pub const DEFAULT_TOP_REGIONS: usize = 10;

/// Pie colours, handed out in rank order.
const REGION_PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Group-and-sum reducers over a filtered table. Every reducer returns an
/// empty result for an empty table.
#[derive(Debug, Clone)]
pub struct SalesAggregator {
    top_regions: usize,
}

impl SalesAggregator {
    pub fn new(top_regions: usize) -> Self {
        SalesAggregator { top_regions }
    }

    /// Quantity and amount per (date, category), sorted by date then category.
    /// Days without sales for a category produce no row.
    pub fn trend(&self, table: &SalesTable) -> Result<Vec<TrendPoint>> {
        if table.is_empty() {
            return Ok(Vec::new());
        }

        let grouped = table
            .frame()
            .clone()
            .lazy()
            .group_by([col(ORDER_DATE), col(CATEGORY)])
            .agg([
                col(QUANTITY).sum().alias(QUANTITY),
                col(AMOUNT).sum().alias(AMOUNT),
            ])
            .collect()?;

        let dates = grouped.column(ORDER_DATE)?.as_materialized_series().date()?;
        let categories = grouped.column(CATEGORY)?.str()?;
        let quantities = grouped.column(QUANTITY)?.i64()?;
        let amounts = grouped.column(AMOUNT)?.f64()?;

        let mut points = Vec::with_capacity(grouped.height());
        for (idx, date) in dates.as_date_iter().enumerate() {
            let (Some(date), Some(category)) = (date, categories.get(idx)) else {
                continue;
            };

            points.push(TrendPoint {
                date,
                category: category.to_string(),
                quantity: quantities.get(idx).unwrap_or(0),
                amount: amounts.get(idx).unwrap_or(0.0),
            });
        }

        points.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.category.cmp(&b.category)));
        Ok(points)
    }

    /// Quantity and amount per category, sorted by category.
    pub fn category_totals(&self, table: &SalesTable) -> Result<Vec<CategoryTotal>> {
        if table.is_empty() {
            return Ok(Vec::new());
        }

        let grouped = table
            .frame()
            .clone()
            .lazy()
            .group_by([col(CATEGORY)])
            .agg([
                col(QUANTITY).sum().alias(QUANTITY),
                col(AMOUNT).sum().alias(AMOUNT),
            ])
            .collect()?;

        let categories = grouped.column(CATEGORY)?.str()?;
        let quantities = grouped.column(QUANTITY)?.i64()?;
        let amounts = grouped.column(AMOUNT)?.f64()?;

        let mut totals: Vec<CategoryTotal> = (0..grouped.height())
            .filter_map(|idx| {
                categories.get(idx).map(|category| CategoryTotal {
                    category: category.to_string(),
                    quantity: quantities.get(idx).unwrap_or(0),
                    amount: amounts.get(idx).unwrap_or(0.0),
                })
            })
            .collect();

        totals.sort_by(|a, b| a.category.cmp(&b.category));
        Ok(totals)
    }

    /// Amount per normalized region, highest first, at most `top_regions` rows.
    ///
    /// Rows without a ship-to state are left out. Regions with equal amounts
    /// keep their alphabetical order.
    pub fn regional_totals(&self, table: &SalesTable) -> Result<Vec<RegionTotal>> {
        if table.is_empty() {
            return Ok(Vec::new());
        }

        let grouped = table
            .frame()
            .clone()
            .lazy()
            .filter(col(REGION).is_not_null())
            .group_by([col(REGION)])
            .agg([col(AMOUNT).sum().alias(AMOUNT)])
            .collect()?;

        let regions = grouped.column(REGION)?.str()?;
        let amounts = grouped.column(AMOUNT)?.f64()?;

        let mut totals: Vec<RegionTotal> = (0..grouped.height())
            .filter_map(|idx| {
                regions.get(idx).map(|region| RegionTotal {
                    region: region.to_string(),
                    amount: amounts.get(idx).unwrap_or(0.0),
                })
            })
            .collect();

        totals.sort_by(|a, b| a.region.cmp(&b.region));
        // `sort_by` is stable, so ties stay alphabetical.
        totals.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        totals.truncate(self.top_regions);

        Ok(totals)
    }

    /// Row counts for B2B and B2C orders. Both buckets are always present.
    pub fn channel_split(&self, table: &SalesTable) -> Result<ChannelSplit> {
        if table.is_empty() {
            return Ok(ChannelSplit::default());
        }

        let b2b = table
            .frame()
            .column(B2B)?
            .bool()?
            .into_iter()
            .filter(|flag| *flag == Some(true))
            .count();

        Ok(ChannelSplit {
            b2b,
            b2c: table.height() - b2b,
        })
    }
}

impl Default for SalesAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_REGIONS)
    }
}

/// Labels, colours and shares for the regional pie chart.
pub fn region_legend(regions: &[RegionTotal]) -> Vec<LegendEntry> {
    let total: f64 = regions.iter().map(|r| r.amount).sum();

    regions
        .iter()
        .enumerate()
        .map(|(idx, region)| LegendEntry {
            label: region.region.clone(),
            color: REGION_PALETTE[idx % REGION_PALETTE.len()].to_string(),
            share: if total > 0.0 { region.amount / total } else { 0.0 },
        })
        .collect()
}
