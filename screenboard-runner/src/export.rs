//! Ranked table export: pretty JSON and flat CSV.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use screenboard_core::RankedTable;

/// Columns of the CSV export, in order.
pub const CSV_COLUMNS: [&str; 7] = [
    "rank",
    "ticker",
    "sector",
    "sector_label",
    "price",
    "change_raw",
    "change_pct",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    /// Guess from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => bail!("unknown export format {other:?} (expected json or csv)"),
        }
    }
}

/// Serialize a ranked table to pretty JSON.
pub fn export_json(table: &RankedTable) -> Result<String> {
    serde_json::to_string_pretty(table).context("failed to serialize ranked table to JSON")
}

/// One line per ranked row. Change is written with two decimals.
pub fn export_csv(table: &RankedTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(CSV_COLUMNS)?;

    for row in &table.rows {
        wtr.write_record([
            row.rank.to_string(),
            row.ticker.clone(),
            row.sector.clone(),
            row.sector_label.clone(),
            row.price.clone().unwrap_or_default(),
            row.change_raw.clone(),
            format!("{:.2}", row.change_pct),
        ])?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

pub fn render(table: &RankedTable, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => export_json(table),
        ExportFormat::Csv => export_csv(table),
    }
}

/// Render and write to `path`, creating parent directories.
pub fn write_export(table: &RankedTable, format: ExportFormat, path: &Path) -> Result<()> {
    let content = render(table, format)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
