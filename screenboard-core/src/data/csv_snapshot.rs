//! CSV snapshots: the Finviz export body and offline snapshot files share
//! one parser.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::mode::ScreenerMode;
use super::provider::{DataError, ScreenerProvider};
use crate::domain::{DataSource, Row, Snapshot};

/// Parse a header-first CSV table into a snapshot.
///
/// Headers and cells are trimmed, a UTF-8 byte-order mark on the first header
/// is dropped, short records simply lack the trailing cells, and records with
/// every cell empty are skipped.
pub fn parse_snapshot<R: Read>(reader: R, source: DataSource) -> Result<Snapshot, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: Vec<String> = rdr
        .headers()
        .map_err(|e| DataError::Csv(format!("header: {e}")))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| DataError::Csv(format!("record {}: {e}", i + 1)))?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let row: Row = columns
            .iter()
            .zip(record.iter())
            .map(|(column, cell)| (column.as_str(), cell))
            .collect();
        rows.push(row);
    }

    debug!(columns = columns.len(), rows = rows.len(), ?source, "parsed CSV snapshot");
    Ok(Snapshot::new(columns, rows, source))
}

/// Reads a snapshot from a CSV file on disk.
///
/// The same file is served for every mode; the mode only labels the result
/// further down.
pub struct CsvFileProvider {
    path: PathBuf,
}

impl CsvFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScreenerProvider for CsvFileProvider {
    fn name(&self) -> &str {
        "csv_file"
    }

    fn fetch(&self, _mode: ScreenerMode) -> Result<Snapshot, DataError> {
        let file = File::open(&self.path)
            .map_err(|e| DataError::Io(format!("{}: {e}", self.path.display())))?;
        parse_snapshot(file, DataSource::CsvFile)
    }
}
