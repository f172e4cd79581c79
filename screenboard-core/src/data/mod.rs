//! Screener snapshot providers

pub mod circuit_breaker;
pub mod csv_snapshot;
pub mod finviz;
pub mod mode;
pub mod provider;
pub mod synthetic;

pub use circuit_breaker::CircuitBreaker;
pub use csv_snapshot::{parse_snapshot, CsvFileProvider};
pub use finviz::FinvizProvider;
pub use mode::{ScreenerFilter, ScreenerMode};
pub use provider::{DataError, ScreenerProvider};
pub use synthetic::{generate_snapshot, SyntheticProvider};
