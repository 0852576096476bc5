use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::models::{CategoryTotal, ChannelSplit, LegendEntry, RegionTotal, SalesTable, TrendPoint};
use crate::processor::{FilterEngine, FilterSelection, SalesAggregator, region_legend};

/// Everything the presentation layer draws for one filter selection.
#[derive(Debug, Clone, Serialize)]
pub struct Views {
    pub selection: FilterSelection,
    pub row_count: usize,
    pub sales_trend: Vec<TrendPoint>,
    pub category_performance: Vec<CategoryTotal>,
    pub top_regions: Vec<RegionTotal>,
    pub region_legend: Vec<LegendEntry>,
    pub channel_split: ChannelSplit,
}

impl Views {
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

/// The shared base table plus the filter and aggregation stages.
pub struct Dashboard {
    table: Arc<SalesTable>,
    engine: FilterEngine,
    aggregator: SalesAggregator,
}

impl Dashboard {
    pub fn new(table: Arc<SalesTable>, aggregator: SalesAggregator) -> Self {
        Dashboard {
            table,
            engine: FilterEngine,
            aggregator,
        }
    }

    pub fn table(&self) -> &SalesTable {
        &self.table
    }

    pub fn filtered(&self, selection: &FilterSelection) -> Result<SalesTable> {
        self.engine.apply(&self.table, selection)
    }

    /// Recomputes every aggregate from scratch for `selection`.
    pub fn render(&self, selection: &FilterSelection) -> Result<Views> {
        let filtered = self.filtered(selection)?;

        let sales_trend = self.aggregator.trend(&filtered)?;
        let category_performance = self.aggregator.category_totals(&filtered)?;
        let top_regions = self.aggregator.regional_totals(&filtered)?;
        let region_legend = region_legend(&top_regions);
        let channel_split = self.aggregator.channel_split(&filtered)?;

        debug!(
            "Rendered {} rows: {} trend points, {} categories, {} regions",
            filtered.height(),
            sales_trend.len(),
            category_performance.len(),
            top_regions.len()
        );

        Ok(Views {
            selection: selection.clone(),
            row_count: filtered.height(),
            sales_trend,
            category_performance,
            top_regions,
            region_legend,
            channel_split,
        })
    }
}
