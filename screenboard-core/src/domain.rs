//! Domain types: raw screener snapshots and the ranked table derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data::mode::ScreenerMode;

/// Where a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Finviz,
    CsvFile,
    Synthetic,
}

/// One upstream row: column name → raw cell text.
///
/// Cells are kept as strings exactly as the provider returned them. Typed
/// values (the normalized change) are derived by the pipeline, never stored
/// back into the row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    cells: BTreeMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.cells.insert(column.into(), value.into());
    }

    /// Exact-name lookup.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(|s| s.as_str())
    }

    pub fn cells(&self) -> &BTreeMap<String, String> {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// One fetched tabular result from a screener provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Column names in upstream order.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub source: DataSource,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(columns: Vec<String>, rows: Vec<Row>, source: DataSource) -> Self {
        Self {
            columns,
            rows,
            source,
            fetched_at: Utc::now(),
        }
    }

    pub fn empty(source: DataSource) -> Self {
        Self::new(Vec::new(), Vec::new(), source)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// BLAKE3 fingerprint over columns and cell contents.
    ///
    /// Two snapshots with the same table content share a fingerprint regardless
    /// of when they were fetched or which provider produced them.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for column in &self.columns {
            hasher.update(column.as_bytes());
            hasher.update(&[0x1f]);
        }
        hasher.update(&[0x1d]);
        for row in &self.rows {
            for (column, value) in row.cells() {
                hasher.update(column.as_bytes());
                hasher.update(&[0x1f]);
                hasher.update(value.as_bytes());
                hasher.update(&[0x1f]);
            }
            hasher.update(&[0x1e]);
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Price direction of a ranked row. Zero counts as down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn from_change(change_pct: f64) -> Self {
        if change_pct > 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Direction::Up => "▲",
            Direction::Down => "▼",
        }
    }
}

/// A snapshot row after normalization, ranking and sector localization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    /// 1-based position in the ranked table.
    pub rank: usize,
    pub ticker: String,
    pub price: Option<String>,
    /// Change cell exactly as the provider sent it.
    pub change_raw: String,
    /// Normalized change in percent (unparseable → 0.0).
    pub change_pct: f64,
    pub sector: String,
    pub sector_label: String,
    /// All upstream cells, passed through untouched.
    pub cells: BTreeMap<String, String>,
}

impl RankedRow {
    pub fn direction(&self) -> Direction {
        Direction::from_change(self.change_pct)
    }
}

/// Output of the ranking pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTable {
    pub mode: ScreenerMode,
    /// Column the change values were read from; `None` for an empty snapshot.
    pub change_column: Option<String>,
    pub rows: Vec<RankedRow>,
    pub source: DataSource,
    pub fetched_at: DateTime<Utc>,
    /// Fingerprint of the snapshot the table was built from.
    pub snapshot_fingerprint: String,
}

impl RankedTable {
    /// Empty table carrying the provenance of an empty snapshot.
    pub fn empty(mode: ScreenerMode, snapshot: &Snapshot) -> Self {
        Self {
            mode,
            change_column: None,
            rows: Vec::new(),
            source: snapshot.source,
            fetched_at: snapshot.fetched_at,
            snapshot_fingerprint: snapshot.fingerprint(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Tickers of the first `n` ranked rows.
    pub fn top_tickers(&self, n: usize) -> Vec<String> {
        self.rows.iter().take(n).map(|r| r.ticker.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        Snapshot::new(
            vec!["Ticker".into(), "Change".into()],
            vec![
                Row::new().with("Ticker", "AAPL").with("Change", "1.2%"),
                Row::new().with("Ticker", "MSFT").with("Change", "-0.4%"),
            ],
            DataSource::Synthetic,
        )
    }

    #[test]
    fn row_lookup_is_exact() {
        let row = Row::new().with("Ticker", "AAPL");
        assert_eq!(row.get("Ticker"), Some("AAPL"));
        assert_eq!(row.get("ticker"), None);
    }

    #[test]
    fn fingerprint_ignores_fetch_time_and_source() {
        let a = sample();
        let mut b = sample();
        b.source = DataSource::CsvFile;
        b.fetched_at = a.fetched_at - chrono::Duration::hours(1);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_changes_with_content() {
        let a = sample();
        let mut b = sample();
        b.rows[1].insert("Change", "-0.5%");
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn zero_change_is_down() {
        assert_eq!(Direction::from_change(0.0), Direction::Down);
        assert_eq!(Direction::from_change(0.01), Direction::Up);
        assert_eq!(Direction::Up.arrow(), "▲");
    }
}
