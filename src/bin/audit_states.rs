use anyhow::{Context, Result};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::env;

#[path = "../processor/state_normalizer.rs"]
mod state_normalizer;

use state_normalizer::StateNormalizer;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let path = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| "data/sample_sales.csv".to_string());
    let column = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| "ship-state".to_string());

    println!("=== SHIP-STATE AUDIT: {} ({}) ===\n", path, column);

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.clone().into()))?
        .finish()
        .with_context(|| format!("Failed to read {}", path))?;

    let states = df
        .column(&column)
        .with_context(|| format!("Column '{}' not found", column))?
        .str()?;

    let normalizer = StateNormalizer::new();
    let canonical_names = normalizer.canonical_names();

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut blanks = 0;
    for value in states.into_iter() {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => *counts.entry(raw.to_string()).or_insert(0) += 1,
            None => blanks += 1,
        }
    }

    println!("{:<32} {:<32} {:>8}", "raw", "canonical", "rows");
    let mut unmapped = Vec::new();
    for (raw, count) in &counts {
        let canonical = normalizer.normalize(raw);
        let marker = if normalizer.is_mapped(raw) { "*" } else { " " };
        println!("{:<32} {:<32} {:>8} {}", raw, canonical, count, marker);

        if !normalizer.is_mapped(raw) && !canonical_names.contains(&canonical.as_str()) {
            unmapped.push((canonical, *count));
        }
    }

    println!("\n* = rewritten through the mapping table");
    println!("Blank values: {}", blanks);
    println!("Distinct raw values: {}", counts.len());

    if unmapped.is_empty() {
        println!("✅ Every value maps to a known canonical name");
    } else {
        println!("\n⚠️  {} values pass through unmapped:", unmapped.len());
        for (value, count) in &unmapped {
            println!("   {} ({} rows)", value, count);
        }
    }

    Ok(())
}
