use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

use crate::dashboard::Views;

const NO_DATA: &str = "No data for the current filters.";

/// Draws `Views` as plain-text sections and bar charts.
pub struct TextPresenter {
    title: String,
    chart_width: usize,
}

impl TextPresenter {
    pub fn new(title: &str, chart_width: usize) -> Self {
        TextPresenter {
            title: title.to_string(),
            chart_width: chart_width.max(1),
        }
    }

    pub fn present<W: Write>(&self, views: &Views, out: &mut W) -> io::Result<()> {
        writeln!(out, "# {}", self.title)?;
        writeln!(
            out,
            "{} to {} | categories: {} | courier status: {} | {} orders",
            views.selection.start,
            views.selection.end,
            describe(&views.selection.categories),
            describe(&views.selection.courier_statuses),
            views.row_count
        )?;

        self.write_trend(views, out)?;
        self.write_category_performance(views, out)?;
        self.write_regions(views, out)?;
        self.write_channel_split(views, out)?;
        Ok(())
    }

    /// Date-by-category quantity table; days a category did not sell show "-".
    fn write_trend<W: Write>(&self, views: &Views, out: &mut W) -> io::Result<()> {
        writeln!(out, "\n## Sales Trend Based on Category")?;
        if views.sales_trend.is_empty() {
            return writeln!(out, "{}", NO_DATA);
        }

        let categories: BTreeSet<&str> = views
            .sales_trend
            .iter()
            .map(|p| p.category.as_str())
            .collect();
        let mut by_date: BTreeMap<_, BTreeMap<&str, i64>> = BTreeMap::new();
        for point in &views.sales_trend {
            by_date
                .entry(point.date)
                .or_default()
                .insert(point.category.as_str(), point.quantity);
        }

        let widths: Vec<usize> = categories.iter().map(|c| c.len().max(5)).collect();

        write!(out, "{:<10}", "Date")?;
        for (category, width) in categories.iter().zip(&widths) {
            write!(out, " | {:>width$}", category, width = width)?;
        }
        writeln!(out)?;

        for (date, quantities) in &by_date {
            write!(out, "{}", date)?;
            for (category, width) in categories.iter().zip(&widths) {
                match quantities.get(category) {
                    Some(quantity) => write!(out, " | {:>width$}", quantity, width = width)?,
                    None => write!(out, " | {:>width$}", "-", width = width)?,
                }
            }
            writeln!(out)?;
        }

        Ok(())
    }

    fn write_category_performance<W: Write>(&self, views: &Views, out: &mut W) -> io::Result<()> {
        writeln!(out, "\n## Category Performance")?;
        if views.category_performance.is_empty() {
            return writeln!(out, "{}", NO_DATA);
        }

        let label_width = views
            .category_performance
            .iter()
            .map(|c| c.category.len())
            .max()
            .unwrap_or(0);

        writeln!(out, "\n### Quantity Sold per Category")?;
        let max_quantity = views
            .category_performance
            .iter()
            .map(|c| c.quantity)
            .max()
            .unwrap_or(0) as f64;
        for total in &views.category_performance {
            writeln!(
                out,
                "{:<label_width$} {} {}",
                total.category,
                bar(total.quantity as f64, max_quantity, self.chart_width),
                total.quantity,
                label_width = label_width
            )?;
        }

        writeln!(out, "\n### Total Amount Sold per Category")?;
        let max_amount = views
            .category_performance
            .iter()
            .map(|c| c.amount)
            .fold(0.0, f64::max);
        for total in &views.category_performance {
            writeln!(
                out,
                "{:<label_width$} {} {:.2}",
                total.category,
                bar(total.amount, max_amount, self.chart_width),
                total.amount,
                label_width = label_width
            )?;
        }

        Ok(())
    }

    fn write_regions<W: Write>(&self, views: &Views, out: &mut W) -> io::Result<()> {
        writeln!(out, "\n## Top {} States by Sales", views.top_regions.len())?;
        if views.top_regions.is_empty() {
            return writeln!(out, "{}", NO_DATA);
        }

        let label_width = views
            .region_legend
            .iter()
            .map(|l| l.label.len())
            .max()
            .unwrap_or(0);

        for (region, legend) in views.top_regions.iter().zip(&views.region_legend) {
            writeln!(
                out,
                "{} {:<label_width$} {:>12.2} {:>6.1}%",
                legend.color,
                legend.label,
                region.amount,
                legend.share * 100.0,
                label_width = label_width
            )?;
        }

        Ok(())
    }

    fn write_channel_split<W: Write>(&self, views: &Views, out: &mut W) -> io::Result<()> {
        let split = views.channel_split;
        writeln!(out, "\n## B2B vs B2C Orders ({} total)", split.total())?;
        let max = split.b2b.max(split.b2c) as f64;

        writeln!(out, "B2B {} {}", bar(split.b2b as f64, max, self.chart_width), split.b2b)?;
        writeln!(out, "B2C {} {}", bar(split.b2c as f64, max, self.chart_width), split.b2c)?;
        Ok(())
    }
}

fn describe(selected: &BTreeSet<String>) -> String {
    if selected.is_empty() {
        "all".to_string()
    } else {
        selected.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let filled = ((value / max) * width as f64).round().max(1.0) as usize;
    "#".repeat(filled.min(width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::Dashboard;
    use crate::models::fixtures::*;
    use crate::processor::{FilterSelection, SalesAggregator};
    use std::sync::Arc;

    fn render(start: &str, end: &str, categories: &[&str]) -> String {
        let dashboard = Dashboard::new(Arc::new(sample_table()), SalesAggregator::default());
        let selection = FilterSelection::new(
            date(start),
            date(end),
            categories.iter().map(|c| c.to_string()).collect(),
            BTreeSet::new(),
        )
        .unwrap();
        let views = dashboard.render(&selection).unwrap();

        let mut out = Vec::new();
        TextPresenter::new("Sales", 20)
            .present(&views, &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_all_sections_present() {
        let text = render("2022-04-01", "2022-04-05", &[]);

        assert!(text.starts_with("# Sales\n"));
        assert!(text.contains("## Sales Trend Based on Category"));
        assert!(text.contains("### Quantity Sold per Category"));
        assert!(text.contains("### Total Amount Sold per Category"));
        assert!(text.contains("## Top 5 States by Sales"));
        assert!(text.contains("#1f77b4 Delhi"));
        assert!(text.contains("## B2B vs B2C Orders (8 total)"));
        assert!(text.contains("categories: all"));
    }

    #[test]
    fn test_missing_trend_days_show_placeholder() {
        let text = render("2022-04-01", "2022-04-05", &["Set", "Top"]);
        let row = text
            .lines()
            .find(|line| line.starts_with("2022-04-04"))
            .unwrap();

        assert_eq!(row, "2022-04-04 |     - |     2");
    }

    #[test]
    fn test_empty_views_render_without_failing() {
        let text = render("2022-04-03", "2022-04-03", &["Top"]);

        assert_eq!(text.matches(NO_DATA).count(), 3);
        assert!(text.contains("## B2B vs B2C Orders (0 total)"));
        assert!(text.contains("B2B  0"));
    }

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(10.0, 10.0, 20), "#".repeat(20));
        assert_eq!(bar(5.0, 10.0, 20), "#".repeat(10));
        assert_eq!(bar(0.01, 10.0, 20), "#");
        assert_eq!(bar(0.0, 10.0, 20), "");
        assert_eq!(bar(3.0, 0.0, 20), "");
    }
}
