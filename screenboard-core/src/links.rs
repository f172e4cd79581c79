//! Outbound quote links: `<base>/quote/<TICKER>`.
//!
//! The ticker is pushed as a single path segment, so `/`, `%`, spaces and
//! non-ASCII characters are percent-encoded while `.` and `-` (as in `BRK.B`,
//! `BF-B`) are kept.

use reqwest::Url;
use thiserror::Error;

pub const DEFAULT_QUOTE_BASE: &str = "https://finance.yahoo.com";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("empty ticker")]
    EmptyTicker,

    #[error("invalid quote base URL: {0}")]
    InvalidBase(String),
}

/// Builds quote URLs against a fixed base.
#[derive(Debug, Clone)]
pub struct QuoteLinker {
    base: Url,
}

impl QuoteLinker {
    pub fn new(base: &str) -> Result<Self, LinkError> {
        let mut url = Url::parse(base).map_err(|e| LinkError::InvalidBase(format!("{base}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(LinkError::InvalidBase(base.to_string()));
        }
        url.set_query(None);
        url.set_fragment(None);
        Ok(Self { base: url })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn quote_url(&self, ticker: &str) -> Result<Url, LinkError> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(LinkError::EmptyTicker);
        }

        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| LinkError::InvalidBase(self.base.to_string()))?;
            segments.pop_if_empty().push("quote").push(ticker);
        }
        Ok(url)
    }
}

impl Default for QuoteLinker {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTE_BASE).expect("default quote base is a valid URL")
    }
}

/// Quote URL against the default base.
pub fn quote_url(ticker: &str) -> Result<Url, LinkError> {
    QuoteLinker::default().quote_url(ticker)
}
