use anyhow::{Context, Result};
use chrono::Utc;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::dashboard::Views;
use crate::models::SalesTable;

#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub views: PathBuf,
    pub filtered: PathBuf,
}

/// Writes rendered views and the filtered rows behind them to disk.
pub struct ExportManager {
    export_dir: PathBuf,
}

impl ExportManager {
    pub fn new(export_dir: impl AsRef<Path>) -> Self {
        ExportManager {
            export_dir: export_dir.as_ref().to_path_buf(),
        }
    }

    /// `<export_dir>/<YYYY/MM/DD>/<uuid>`
    pub fn generate_export_dir(&self) -> PathBuf {
        let date = Utc::now().format("%Y/%m/%d").to_string();
        let export_id = Uuid::new_v4();
        self.export_dir.join(date).join(export_id.to_string())
    }

    pub fn export(&self, views: &Views, filtered: &SalesTable) -> Result<ExportPaths> {
        let dir = self.generate_export_dir();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

        let views_path = dir.join("views.json");
        let json = serde_json::to_string_pretty(views)?;
        fs::write(&views_path, json)
            .with_context(|| format!("Failed to write {}", views_path.display()))?;

        let filtered_path = dir.join("filtered.parquet");
        let mut file = File::create(&filtered_path)
            .with_context(|| format!("Failed to create {}", filtered_path.display()))?;
        let mut df = filtered.frame().clone();
        ParquetWriter::new(&mut file).finish(&mut df)?;

        info!(
            "Exported {} rows to {}",
            filtered.height(),
            dir.display()
        );

        Ok(ExportPaths {
            views: views_path,
            filtered: filtered_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::Dashboard;
    use crate::models::fixtures::*;
    use crate::processor::{FilterSelection, SalesAggregator};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    #[test]
    fn test_export_dir_layout() {
        let manager = ExportManager::new("exports");
        let dir = manager.generate_export_dir();

        assert!(dir.starts_with("exports"));
        // exports / YYYY / MM / DD / uuid
        assert_eq!(dir.components().count(), 5);
        assert_ne!(dir, manager.generate_export_dir());
    }

    #[test]
    fn test_export_writes_views_and_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let dashboard = Dashboard::new(Arc::new(sample_table()), SalesAggregator::default());
        let selection = FilterSelection::new(
            date("2022-04-01"),
            date("2022-04-05"),
            BTreeSet::from(["Set".to_string()]),
            BTreeSet::new(),
        )
        .unwrap();
        let views = dashboard.render(&selection).unwrap();
        let filtered = dashboard.filtered(&selection).unwrap();

        let paths = ExportManager::new(tmp.path())
            .export(&views, &filtered)
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&paths.views).unwrap()).unwrap();
        assert_eq!(json["row_count"], 3);
        assert_eq!(json["category_performance"][0]["category"], "Set");

        let rows = ParquetReader::new(File::open(&paths.filtered).unwrap())
            .finish()
            .unwrap();
        assert_eq!(rows.height(), 3);
    }
}
