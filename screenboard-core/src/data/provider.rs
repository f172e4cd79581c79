//! Screener provider trait and structured error types.
//!
//! The ScreenerProvider trait abstracts over snapshot sources (Finviz export,
//! CSV file, synthetic) so the board can swap implementations and tests can
//! substitute stubs.

use thiserror::Error;

use super::mode::ScreenerMode;
use crate::domain::Snapshot;

/// Structured error types for snapshot fetches.
///
/// These are displayable in the CLI as a one-line notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("hard stop: screener has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("snapshot file error: {0}")]
    Io(String),

    #[error("malformed CSV: {0}")]
    Csv(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for screener snapshot providers.
///
/// Providers know nothing about caching; the time-window cache sits above
/// this trait.
pub trait ScreenerProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the current snapshot for a mode. An empty result is `Ok`.
    fn fetch(&self, mode: ScreenerMode) -> Result<Snapshot, DataError>;

    /// Whether the provider is currently willing to make requests.
    fn is_available(&self) -> bool {
        true
    }
}
