//! Company description enrichment for the top of the board.
//!
//! Each ticker is looked up (and translated) on a private fixed-size rayon
//! pool. Results are joined by ticker once every task has settled; a failure
//! in one task only turns that ticker's entry into a placeholder.

pub mod sources;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use sources::{
    DescriptionSource, EnrichError, MyMemoryTranslator, PassthroughTranslator, Translator,
    YahooProfileSource,
};

/// Shown when the company has no description.
pub const PLACEHOLDER_EMPTY: &str = "暂无描述";
/// Shown when the lookup or translation failed.
pub const PLACEHOLDER_FAILED: &str = "数据更新中...";

pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_MAX_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderReason {
    EmptyDescription,
    DescriptionFailed,
    TranslationFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Enrichment {
    Described { text: String },
    Placeholder { text: String, reason: PlaceholderReason },
}

impl Enrichment {
    pub fn text(&self) -> &str {
        match self {
            Enrichment::Described { text } | Enrichment::Placeholder { text, .. } => text,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Enrichment::Placeholder { .. })
    }
}

/// First sentence of `description` (text before the first `.`), trimmed and
/// cut to at most `max_chars` characters.
pub fn summarize(description: &str, max_chars: usize) -> String {
    let first = description.split('.').next().unwrap_or("").trim();
    match first.char_indices().nth(max_chars) {
        Some((cut, _)) => first[..cut].trim_end().to_string(),
        None => first.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichOptions {
    pub workers: usize,
    /// `en` skips translation.
    pub target_lang: String,
    pub max_chars: usize,
    pub placeholder_empty: String,
    pub placeholder_failed: String,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            target_lang: "zh".to_string(),
            max_chars: DEFAULT_MAX_CHARS,
            placeholder_empty: PLACEHOLDER_EMPTY.to_string(),
            placeholder_failed: PLACEHOLDER_FAILED.to_string(),
        }
    }
}

pub struct Enricher {
    source: Arc<dyn DescriptionSource>,
    translator: Arc<dyn Translator>,
    options: EnrichOptions,
    pool: rayon::ThreadPool,
}

impl Enricher {
    pub fn new(
        source: Arc<dyn DescriptionSource>,
        translator: Arc<dyn Translator>,
        options: EnrichOptions,
    ) -> Result<Self, EnrichError> {
        // Private pool: enrichment must not compete with the global rayon pool.
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.workers.max(1))
            .thread_name(|i| format!("screenboard-enrich-{i}"))
            .build()
            .map_err(|e| EnrichError::Pool(e.to_string()))?;
        Ok(Self {
            source,
            translator,
            options,
            pool,
        })
    }

    pub fn options(&self) -> &EnrichOptions {
        &self.options
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn placeholder(&self, reason: PlaceholderReason) -> Enrichment {
        let text = match reason {
            PlaceholderReason::EmptyDescription => self.options.placeholder_empty.clone(),
            PlaceholderReason::DescriptionFailed | PlaceholderReason::TranslationFailed => {
                self.options.placeholder_failed.clone()
            }
        };
        Enrichment::Placeholder { text, reason }
    }

    /// Describe one ticker. Never fails; errors become placeholders.
    pub fn enrich_one(&self, ticker: &str) -> Enrichment {
        let description = match self.source.describe(ticker) {
            Ok(d) => d,
            Err(e) => {
                warn!(ticker, error = %e, "description lookup failed");
                return self.placeholder(PlaceholderReason::DescriptionFailed);
            }
        };

        let summary = summarize(&description, self.options.max_chars);
        if summary.is_empty() {
            return self.placeholder(PlaceholderReason::EmptyDescription);
        }

        if self.options.target_lang.eq_ignore_ascii_case("en") {
            return Enrichment::Described { text: summary };
        }

        match self.translator.translate(&summary, &self.options.target_lang) {
            Ok(text) => Enrichment::Described { text },
            Err(e) => {
                warn!(ticker, error = %e, "translation failed");
                self.placeholder(PlaceholderReason::TranslationFailed)
            }
        }
    }

    /// Describe every distinct ticker in parallel and key the results by
    /// ticker. Blank tickers are skipped.
    pub fn enrich(&self, tickers: &[String]) -> BTreeMap<String, Enrichment> {
        let unique: Vec<&str> = tickers
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if unique.is_empty() {
            return BTreeMap::new();
        }

        let started = Instant::now();
        debug!(count = unique.len(), workers = self.workers(), "enriching tickers");

        let results: BTreeMap<String, Enrichment> = self.pool.install(|| {
            unique
                .par_iter()
                .map(|ticker| (ticker.to_string(), self.enrich_one(ticker)))
                .collect()
        });

        let placeholders = results.values().filter(|e| e.is_placeholder()).count();
        info!(
            count = results.len(),
            placeholders,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "enrichment finished"
        );
        results
    }
}
