//! Ranking pipeline: normalize the change column, sort descending, truncate,
//! localize sectors.
//!
//! Everything here is a pure function of its input. Re-running the pipeline
//! on the same snapshot yields the same table.

use std::cmp::Ordering;
use thiserror::Error;

use crate::data::mode::ScreenerMode;
use crate::domain::{RankedRow, RankedTable, Row, Snapshot};
use crate::sector::SectorTable;

/// Substring that identifies the percent-change column.
pub const CHANGE_MARKER: &str = "Change";
pub const TICKER_COLUMN: &str = "Ticker";
pub const SECTOR_COLUMN: &str = "Sector";
pub const PRICE_COLUMN: &str = "Price";

/// Default number of rows kept after ranking.
pub const DEFAULT_LIMIT: usize = 30;

/// Recoverable pipeline conditions. Both are shown to the user as a notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("no column containing \"Change\" (available: {})", .available.join(", "))]
    ChangeColumnNotFound { available: Vec<String> },

    #[error("no \"Ticker\" column (available: {})", .available.join(", "))]
    TickerColumnNotFound { available: Vec<String> },
}

impl PipelineError {
    pub fn available_columns(&self) -> &[String] {
        match self {
            PipelineError::ChangeColumnNotFound { available }
            | PipelineError::TickerColumnNotFound { available } => available,
        }
    }
}

/// Parse a raw change cell (`"+2.5%"`, `"-1.3"`, `"0%"`) into a number.
///
/// Never fails: anything unparseable, and any non-finite result, is `0.0`.
pub fn normalize_change(raw: &str) -> f64 {
    let s = raw.trim();
    let s = s.strip_suffix('%').unwrap_or(s).trim_end();
    let s = s.strip_prefix('+').unwrap_or(s).trim_start();
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// First column whose name contains `"Change"`.
pub fn locate_change_column<S: AsRef<str>>(columns: &[S]) -> Result<String, PipelineError> {
    columns
        .iter()
        .map(|c| c.as_ref())
        .find(|c| c.contains(CHANGE_MARKER))
        .map(str::to_string)
        .ok_or_else(|| PipelineError::ChangeColumnNotFound {
            available: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        })
}

/// Normalized change of a row; a missing cell counts as zero.
pub fn row_change(row: &Row, change_column: &str) -> f64 {
    row.get(change_column).map(normalize_change).unwrap_or(0.0)
}

/// Sort rows by normalized change, descending, and keep the first `limit`.
///
/// The sort is stable: rows with equal change keep their input order.
pub fn rank(rows: &[Row], change_column: &str, limit: usize) -> Vec<Row> {
    let mut keyed: Vec<(f64, &Row)> = rows
        .iter()
        .map(|row| (row_change(row, change_column), row))
        .collect();

    // normalize_change only yields finite values, so partial_cmp is total here
    keyed.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    keyed
        .into_iter()
        .take(limit)
        .map(|(_, row)| row.clone())
        .collect()
}

/// Case-insensitive exact column match.
fn find_column<'a>(columns: &'a [String], name: &str) -> Option<&'a str> {
    columns
        .iter()
        .find(|c| c.trim().eq_ignore_ascii_case(name))
        .map(|c| c.as_str())
}

/// The ranking pipeline: snapshot in, bounded localized table out.
#[derive(Debug, Clone)]
pub struct RankingPipeline {
    sectors: SectorTable,
    limit: usize,
}

impl Default for RankingPipeline {
    fn default() -> Self {
        Self::new(SectorTable::default(), DEFAULT_LIMIT)
    }
}

impl RankingPipeline {
    pub fn new(sectors: SectorTable, limit: usize) -> Self {
        Self { sectors, limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn sectors(&self) -> &SectorTable {
        &self.sectors
    }

    /// Rank a snapshot.
    ///
    /// An empty snapshot produces an empty table. A snapshot without a change
    /// or ticker column is reported as a [`PipelineError`].
    pub fn run(&self, snapshot: &Snapshot, mode: ScreenerMode) -> Result<RankedTable, PipelineError> {
        if snapshot.is_empty() {
            return Ok(RankedTable::empty(mode, snapshot));
        }

        let change_column = locate_change_column(&snapshot.columns)?;
        let ticker_column = find_column(&snapshot.columns, TICKER_COLUMN).ok_or_else(|| {
            PipelineError::TickerColumnNotFound {
                available: snapshot.columns.clone(),
            }
        })?;
        let sector_column = find_column(&snapshot.columns, SECTOR_COLUMN);
        let price_column = find_column(&snapshot.columns, PRICE_COLUMN);

        let rows = rank(&snapshot.rows, &change_column, self.limit)
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let change_raw = row.get(&change_column).unwrap_or_default().to_string();
                let sector = sector_column
                    .and_then(|c| row.get(c))
                    .unwrap_or_default()
                    .to_string();
                RankedRow {
                    rank: i + 1,
                    ticker: row.get(ticker_column).unwrap_or_default().trim().to_string(),
                    price: price_column.and_then(|c| row.get(c)).map(str::to_string),
                    change_pct: normalize_change(&change_raw),
                    change_raw,
                    sector_label: self.sectors.localize(&sector).to_string(),
                    sector,
                    cells: row.cells().clone(),
                }
            })
            .collect();

        Ok(RankedTable {
            mode,
            change_column: Some(change_column),
            rows,
            source: snapshot.source,
            fetched_at: snapshot.fetched_at,
            snapshot_fingerprint: snapshot.fingerprint(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DataSource;

    fn row(ticker: &str, change: &str) -> Row {
        Row::new().with("Ticker", ticker).with("Change", change)
    }

    #[test]
    fn normalize_strips_sign_and_percent() {
        assert_eq!(normalize_change("+2.50%"), 2.5);
        assert_eq!(normalize_change("-1.3"), -1.3);
        assert_eq!(normalize_change("0%"), 0.0);
        assert_eq!(normalize_change(" +4.10 % "), 4.1);
    }

    #[test]
    fn normalize_garbage_is_zero() {
        for raw in ["", "-", "N/A", "abc%", "%", "+", "1.2.3", "NaN", "inf", "-infinity"] {
            assert_eq!(normalize_change(raw), 0.0, "input {raw:?}");
        }
    }

    #[test]
    fn locate_picks_first_match() {
        let cols = ["Ticker", "Change from Open", "Change", "Price"];
        assert_eq!(locate_change_column(&cols).unwrap(), "Change from Open");
    }

    #[test]
    fn locate_is_case_sensitive_substring() {
        let cols = ["Ticker", "Perf Change %"];
        assert_eq!(locate_change_column(&cols).unwrap(), "Perf Change %");
        let err = locate_change_column(&["Ticker", "change"]).unwrap_err();
        assert_eq!(
            err,
            PipelineError::ChangeColumnNotFound {
                available: vec!["Ticker".into(), "change".into()]
            }
        );
    }

    #[test]
    fn not_found_message_lists_columns() {
        let err = locate_change_column(&["Ticker", "Price"]).unwrap_err();
        assert!(err.to_string().contains("Ticker, Price"));
        assert_eq!(err.available_columns().len(), 2);
    }

    #[test]
    fn rank_sorts_descending_and_truncates() {
        let rows = vec![
            row("A", "1%"),
            row("B", "+3%"),
            row("C", "-2%"),
            row("D", "0.5"),
        ];
        let ranked = rank(&rows, "Change", 3);
        let tickers: Vec<_> = ranked.iter().map(|r| r.get("Ticker").unwrap()).collect();
        assert_eq!(tickers, vec!["B", "A", "D"]);
    }

    #[test]
    fn rank_ties_keep_input_order() {
        let rows = vec![
            row("A", "1%"),
            row("B", "junk"),
            row("C", "1.0"),
            row("D", "0"),
            row("E", "+1%"),
        ];
        let ranked = rank(&rows, "Change", 10);
        let tickers: Vec<_> = ranked.iter().map(|r| r.get("Ticker").unwrap()).collect();
        assert_eq!(tickers, vec!["A", "C", "E", "B", "D"]);
    }

    #[test]
    fn rank_missing_cell_counts_as_zero() {
        let rows = vec![Row::new().with("Ticker", "X"), row("Y", "-0.1%")];
        let ranked = rank(&rows, "Change", 10);
        assert_eq!(ranked[0].get("Ticker"), Some("X"));
    }

    #[test]
    fn pipeline_builds_localized_table() {
        let snapshot = Snapshot::new(
            vec!["ticker".into(), "Sector".into(), "Price".into(), "Change".into()],
            vec![
                Row::new()
                    .with("ticker", "XOM")
                    .with("Sector", "Energy")
                    .with("Price", "110.2")
                    .with("Change", "-0.8%"),
                Row::new()
                    .with("ticker", "NVDA")
                    .with("Sector", "Technology")
                    .with("Price", "880.1")
                    .with("Change", "+4.2%"),
            ],
            DataSource::Synthetic,
        );
        let table = RankingPipeline::default()
            .run(&snapshot, ScreenerMode::Momentum)
            .unwrap();

        assert_eq!(table.change_column.as_deref(), Some("Change"));
        assert_eq!(table.rows[0].ticker, "NVDA");
        assert_eq!(table.rows[0].rank, 1);
        assert_eq!(table.rows[0].sector_label, "科技");
        assert_eq!(table.rows[0].price.as_deref(), Some("880.1"));
        assert_eq!(table.rows[1].change_pct, -0.8);
        assert_eq!(table.rows[1].change_raw, "-0.8%");
        assert_eq!(table.rows[1].sector_label, "能源");
    }

    #[test]
    fn pipeline_empty_snapshot_is_empty_table() {
        let snapshot = Snapshot::empty(DataSource::Finviz);
        let table = RankingPipeline::default()
            .run(&snapshot, ScreenerMode::Sp500)
            .unwrap();
        assert!(table.is_empty());
        assert_eq!(table.change_column, None);
    }

    #[test]
    fn pipeline_requires_ticker_column() {
        let snapshot = Snapshot::new(
            vec!["Symbol".into(), "Change".into()],
            vec![Row::new().with("Symbol", "A").with("Change", "1%")],
            DataSource::Synthetic,
        );
        let err = RankingPipeline::default()
            .run(&snapshot, ScreenerMode::Sp500)
            .unwrap_err();
        assert!(matches!(err, PipelineError::TickerColumnNotFound { .. }));
    }

    #[test]
    fn pipeline_without_sector_column_uses_empty_label() {
        let snapshot = Snapshot::new(
            vec!["Ticker".into(), "Change".into()],
            vec![row("A", "1%")],
            DataSource::Synthetic,
        );
        let table = RankingPipeline::default()
            .run(&snapshot, ScreenerMode::Sp500)
            .unwrap();
        assert_eq!(table.rows[0].sector, "");
        assert_eq!(table.rows[0].sector_label, "");
        assert_eq!(table.rows[0].price, None);
    }

    #[test]
    fn pipeline_is_idempotent() {
        let snapshot = Snapshot::new(
            vec!["Ticker".into(), "Change".into()],
            vec![row("A", "1%"), row("B", "2%"), row("C", "x")],
            DataSource::Synthetic,
        );
        let pipeline = RankingPipeline::new(SectorTable::default(), 2);
        let a = pipeline.run(&snapshot, ScreenerMode::Momentum).unwrap();
        let b = pipeline.run(&snapshot, ScreenerMode::Momentum).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }
}
