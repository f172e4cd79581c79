//! Screenboard Core — snapshot domain types, ranking pipeline, data providers.
//!
//! This crate contains everything that does not need a cache or a worker pool:
//! - Domain types (snapshot rows, snapshots, ranked rows and tables)
//! - The ranking pipeline (change normalization, column discovery, stable ranking)
//! - Sector localization with identity fallback
//! - Quote link construction with explicit percent-encoding
//! - Heatmap layout data
//! - Screener providers (Finviz export, CSV file, synthetic) and the circuit breaker

pub mod data;
pub mod domain;
pub mod heatmap;
pub mod links;
pub mod pipeline;
pub mod sector;

pub use data::{DataError, ScreenerMode, ScreenerProvider};
pub use domain::{DataSource, Direction, RankedRow, RankedTable, Row, Snapshot};
pub use links::{quote_url, LinkError, QuoteLinker};
pub use pipeline::{
    locate_change_column, normalize_change, rank, PipelineError, RankingPipeline, DEFAULT_LIMIT,
};
pub use sector::{localize_sector, SectorTable};
