//! Board assembly: cache → provider → ranking → enrichment → cards.
//!
//! `Board::build` never fails. Anything that goes wrong upstream is carried
//! on the view as a [`Notice`] next to whatever could still be produced.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use screenboard_core::data::{CircuitBreaker, CsvFileProvider, FinvizProvider, SyntheticProvider};
use screenboard_core::heatmap::{self, SectorGroup, DEFAULT_COLOR_RANGE};
use screenboard_core::{
    DataError, Direction, PipelineError, QuoteLinker, RankedRow, RankedTable, RankingPipeline,
    ScreenerMode, ScreenerProvider,
};

use crate::cache::SnapshotCache;
use crate::config::{BoardConfig, ProviderKind};
use crate::enrich::{
    EnrichOptions, Enricher, Enrichment, MyMemoryTranslator, PassthroughTranslator, Translator,
    YahooProfileSource,
};

pub const DEFAULT_ENRICH_TOP: usize = 5;

/// Non-fatal condition shown alongside the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    UpstreamEmpty,
    ChangeColumnMissing { available: Vec<String> },
    TickerColumnMissing { available: Vec<String> },
    FetchFailed { reason: String },
    LinkFailed { ticker: String, reason: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::UpstreamEmpty => write!(f, "screener returned no rows"),
            Notice::ChangeColumnMissing { available } => write!(
                f,
                "no change column in snapshot (columns: {})",
                available.join(", ")
            ),
            Notice::TickerColumnMissing { available } => write!(
                f,
                "no ticker column in snapshot (columns: {})",
                available.join(", ")
            ),
            Notice::FetchFailed { reason } => write!(f, "snapshot fetch failed: {reason}"),
            Notice::LinkFailed { ticker, reason } => {
                write!(f, "no quote link for {ticker:?}: {reason}")
            }
        }
    }
}

impl From<&PipelineError> for Notice {
    fn from(err: &PipelineError) -> Self {
        match err {
            PipelineError::ChangeColumnNotFound { available } => Notice::ChangeColumnMissing {
                available: available.clone(),
            },
            PipelineError::TickerColumnNotFound { available } => Notice::TickerColumnMissing {
                available: available.clone(),
            },
        }
    }
}

/// One rendered row of the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardCard {
    pub rank: usize,
    pub ticker: String,
    pub sector_label: String,
    pub price: Option<String>,
    pub change_raw: String,
    pub change_pct: f64,
    pub direction: Direction,
    /// Only the enriched top rows carry a description.
    pub description: Option<Enrichment>,
    pub quote_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub mode: ScreenerMode,
    pub table: Option<RankedTable>,
    pub cards: Vec<BoardCard>,
    pub heatmap: Vec<SectorGroup>,
    pub notices: Vec<Notice>,
    pub from_cache: bool,
    #[serde(with = "duration_secs")]
    pub age: Duration,
}

impl BoardView {
    fn empty(mode: ScreenerMode) -> Self {
        Self {
            mode,
            table: None,
            cards: Vec::new(),
            heatmap: Vec::new(),
            notices: Vec::new(),
            from_cache: false,
            age: Duration::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
}

pub struct Board {
    provider: Arc<dyn ScreenerProvider>,
    cache: SnapshotCache,
    pipeline: RankingPipeline,
    enricher: Option<Enricher>,
    linker: QuoteLinker,
    enrich_top: usize,
    color_range: f64,
}

impl Board {
    pub fn new(
        provider: Arc<dyn ScreenerProvider>,
        cache: SnapshotCache,
        pipeline: RankingPipeline,
    ) -> Self {
        Self {
            provider,
            cache,
            pipeline,
            enricher: None,
            linker: QuoteLinker::default(),
            enrich_top: DEFAULT_ENRICH_TOP,
            color_range: DEFAULT_COLOR_RANGE,
        }
    }

    pub fn with_enricher(mut self, enricher: Option<Enricher>, top: usize) -> Self {
        self.enricher = enricher;
        self.enrich_top = top;
        self
    }

    pub fn with_linker(mut self, linker: QuoteLinker) -> Self {
        self.linker = linker;
        self
    }

    pub fn with_color_range(mut self, color_range: f64) -> Self {
        self.color_range = color_range;
        self
    }

    /// Wire up provider, cache, pipeline and enricher from a config.
    pub fn from_config(config: &BoardConfig) -> Result<Self> {
        let provider: Arc<dyn ScreenerProvider> = match config.screener.provider {
            ProviderKind::Finviz => Arc::new(
                FinvizProvider::new(Arc::new(CircuitBreaker::for_screener()))
                    .context("failed to create Finviz provider")?
                    .with_base_url(config.screener.base_url.clone())
                    .with_auth_token(config.screener.auth_token.clone()),
            ),
            ProviderKind::Csv => {
                let path = config
                    .screener
                    .csv_path
                    .clone()
                    .context("screener.csv_path is required for the csv provider")?;
                Arc::new(CsvFileProvider::new(path))
            }
            ProviderKind::Synthetic => Arc::new(SyntheticProvider::new(
                config.screener.synthetic_seed,
                config.screener.synthetic_rows,
            )),
        };

        let pipeline = RankingPipeline::new(config.sector_table(), config.board.limit);
        let cache = SnapshotCache::new(config.cache_ttl());
        let linker = QuoteLinker::new(&config.links.quote_base)
            .with_context(|| format!("bad links.quote_base {:?}", config.links.quote_base))?;

        let top = config.enrich_count();
        let enricher = if top > 0 {
            Some(build_enricher(config).context("failed to create enricher")?)
        } else {
            None
        };

        Ok(Self::new(provider, cache, pipeline)
            .with_enricher(enricher, top)
            .with_linker(linker)
            .with_color_range(config.board.color_range))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Fetch (or reuse), rank, enrich and lay out one mode.
    pub fn build(&self, mode: ScreenerMode) -> BoardView {
        let mut view = BoardView::empty(mode);

        let cached = match self.cache.get_or_fetch(mode, || self.provider.fetch(mode)) {
            Ok(c) => c,
            Err(e) => {
                warn!(%mode, provider = self.provider.name(), error = %e, "snapshot fetch failed");
                view.notices.push(fetch_notice(&e));
                return view;
            }
        };
        view.from_cache = cached.from_cache();
        view.age = cached.age;

        let table = match self.pipeline.run(&cached.snapshot, mode) {
            Ok(t) => t,
            Err(e) => {
                warn!(%mode, error = %e, "snapshot could not be ranked");
                view.notices.push(Notice::from(&e));
                return view;
            }
        };
        if table.is_empty() {
            view.notices.push(Notice::UpstreamEmpty);
        }

        let descriptions = match &self.enricher {
            Some(enricher) if self.enrich_top > 0 && !table.is_empty() => {
                enricher.enrich(&table.top_tickers(self.enrich_top))
            }
            _ => Default::default(),
        };

        for row in &table.rows {
            let quote_url = match self.linker.quote_url(&row.ticker) {
                Ok(url) => Some(url.to_string()),
                Err(e) => {
                    view.notices.push(Notice::LinkFailed {
                        ticker: row.ticker.clone(),
                        reason: e.to_string(),
                    });
                    None
                }
            };
            let description = if row.rank <= self.enrich_top {
                descriptions.get(&row.ticker).cloned()
            } else {
                None
            };
            view.cards.push(card(row, description, quote_url));
        }

        view.heatmap = heatmap::layout(&table, self.color_range);
        info!(
            %mode,
            rows = table.len(),
            cached = view.from_cache,
            notices = view.notices.len(),
            "board built"
        );
        view.table = Some(table);
        view
    }
}

fn card(row: &RankedRow, description: Option<Enrichment>, quote_url: Option<String>) -> BoardCard {
    BoardCard {
        rank: row.rank,
        ticker: row.ticker.clone(),
        sector_label: row.sector_label.clone(),
        price: row.price.clone(),
        change_raw: row.change_raw.clone(),
        change_pct: row.change_pct,
        direction: row.direction(),
        description,
        quote_url,
    }
}

fn fetch_notice(err: &DataError) -> Notice {
    Notice::FetchFailed {
        reason: err.to_string(),
    }
}

fn build_enricher(config: &BoardConfig) -> Result<Enricher> {
    let section = &config.enrichment;
    let timeout = Duration::from_secs(section.timeout_secs.max(1));

    let source = Arc::new(YahooProfileSource::new(timeout)?);
    let translator: Arc<dyn Translator> = if section.target_lang.eq_ignore_ascii_case("en") {
        Arc::new(PassthroughTranslator)
    } else {
        Arc::new(MyMemoryTranslator::new(timeout)?)
    };

    let options = EnrichOptions {
        workers: section.workers,
        target_lang: section.target_lang.clone(),
        max_chars: section.max_chars,
        placeholder_empty: section.placeholder_empty.clone(),
        placeholder_failed: section.placeholder_failed.clone(),
    };
    Ok(Enricher::new(source, translator, options)?)
}
