//! Enrichment fan-out under partial failure and uneven latency.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::Rng;
use screenboard_runner::enrich::{PLACEHOLDER_EMPTY, PLACEHOLDER_FAILED};
use screenboard_runner::{
    DescriptionSource, EnrichError, EnrichOptions, Enricher, Enrichment, PlaceholderReason,
    Translator,
};

/// Sleeps a random few milliseconds per call, fails for listed tickers and
/// records the peak number of calls in flight.
struct JitterSource {
    failing: Vec<&'static str>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl JitterSource {
    fn new(failing: Vec<&'static str>) -> Self {
        Self {
            failing,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }
}

impl DescriptionSource for JitterSource {
    fn describe(&self, ticker: &str) -> Result<String, EnrichError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = rand::thread_rng().gen_range(5..40);
        thread::sleep(Duration::from_millis(delay));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.failing.contains(&ticker) {
            Err(EnrichError::Request(format!("{ticker}: connection reset")))
        } else {
            Ok(format!("{ticker} makes things. More detail follows."))
        }
    }
}

struct Tag;

impl Translator for Tag {
    fn translate(&self, text: &str, target_lang: &str) -> Result<String, EnrichError> {
        Ok(format!("[{target_lang}] {text}"))
    }
}

fn tickers(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

fn run(source: Arc<JitterSource>, workers: usize, list: &[&str]) -> BTreeMap<String, Enrichment> {
    let options = EnrichOptions {
        workers,
        ..EnrichOptions::default()
    };
    let enricher = Enricher::new(source, Arc::new(Tag), options).unwrap();
    enricher.enrich(&tickers(list))
}

#[test]
fn five_tickers_two_failures_yield_five_entries() {
    let source = Arc::new(JitterSource::new(vec!["AMD", "LLY"]));
    let out = run(source.clone(), 5, &["TSLA", "AMD", "MMM", "LLY", "GE"]);

    assert_eq!(out.len(), 5);
    assert_eq!(source.calls.load(Ordering::SeqCst), 5);

    for failed in ["AMD", "LLY"] {
        assert_eq!(
            out[failed],
            Enrichment::Placeholder {
                text: PLACEHOLDER_FAILED.to_string(),
                reason: PlaceholderReason::DescriptionFailed,
            }
        );
    }
    for ok in ["TSLA", "MMM", "GE"] {
        assert_eq!(out[ok].text(), format!("[zh] {ok} makes things"));
        assert_ne!(out[ok].text(), PLACEHOLDER_EMPTY);
    }
}

#[test]
fn every_task_fails_and_the_batch_still_completes() {
    let source = Arc::new(JitterSource::new(vec!["A", "B", "C"]));
    let out = run(source, 3, &["A", "B", "C"]);
    assert_eq!(out.len(), 3);
    assert!(out.values().all(Enrichment::is_placeholder));
}

#[test]
fn concurrency_never_exceeds_pool_size() {
    let names: Vec<String> = (0..24).map(|i| format!("T{i:02}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();

    let source = Arc::new(JitterSource::new(vec![]));
    let out = run(source.clone(), 3, &refs);

    assert_eq!(out.len(), 24);
    let peak = source.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak in-flight {peak} exceeded pool of 3");
    assert!(peak >= 1);
}

#[test]
fn duplicates_are_looked_up_once() {
    let source = Arc::new(JitterSource::new(vec![]));
    let out = run(source.clone(), 4, &["NVDA", "NVDA", "AAPL", "NVDA"]);
    assert_eq!(out.len(), 2);
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}
