//! Screenboard Runner — board orchestration on top of `screenboard-core`.
//!
//! This crate adds the parts that hold state or spawn work:
//! - TOML board configuration
//! - Time-window snapshot cache keyed by screener mode
//! - Company description enrichment on a bounded worker pool
//! - Board assembly (cards, heatmap, notices)
//! - JSON / CSV export of ranked tables

pub mod board;
pub mod cache;
pub mod config;
pub mod enrich;
pub mod export;

pub use board::{Board, BoardCard, BoardView, Notice};
pub use cache::{Cached, Clock, Lookup, ManualClock, SnapshotCache, SystemClock};
pub use config::{BoardConfig, ConfigError, ProviderKind};
pub use enrich::{
    summarize, DescriptionSource, EnrichError, EnrichOptions, Enricher, Enrichment,
    PlaceholderReason, Translator,
};
pub use export::{export_csv, export_json, write_export, ExportFormat};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn shared_state_is_send_sync() {
        assert_send::<SnapshotCache>();
        assert_sync::<SnapshotCache>();
        assert_send::<Enricher>();
        assert_sync::<Enricher>();
        assert_send::<Board>();
        assert_sync::<Board>();
        assert_send::<BoardView>();
    }
}
