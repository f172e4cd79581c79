//! Time-window snapshot cache keyed by screener mode.
//!
//! A read returns the stored snapshot while `now - fetched_at < ttl`; past
//! that it refetches and overwrites. Failed fetches and empty snapshots are
//! never stored.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use screenboard_core::{DataError, ScreenerMode, Snapshot};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Source of "now" for freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let step = ChronoDuration::from_std(by).unwrap_or(ChronoDuration::zero());
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now += step;
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: ScreenerMode,
    pub value: Snapshot,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

/// How a lookup was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Hit,
    Miss,
    Expired,
}

#[derive(Debug, Clone)]
pub struct Cached {
    pub snapshot: Snapshot,
    pub lookup: Lookup,
    /// Age of the returned snapshot; zero for a fresh fetch.
    pub age: Duration,
}

impl Cached {
    pub fn from_cache(&self) -> bool {
        self.lookup == Lookup::Hit
    }
}

pub struct SnapshotCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<ScreenerMode, CacheEntry>>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ScreenerMode, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Serve `mode` from the cache, or call `fetch` and store its result.
    ///
    /// The lock is not held across `fetch`; two callers racing on an expired
    /// key may both fetch, and the later write wins.
    pub fn get_or_fetch<F>(&self, mode: ScreenerMode, fetch: F) -> Result<Cached, DataError>
    where
        F: FnOnce() -> Result<Snapshot, DataError>,
    {
        let now = self.clock.now();
        let lookup = match self.lock().get(&mode) {
            Some(entry) if entry.is_fresh(now, self.ttl) => {
                let age = entry.age(now);
                tracing::debug!(%mode, age_secs = age.as_secs(), "snapshot cache hit");
                return Ok(Cached {
                    snapshot: entry.value.clone(),
                    lookup: Lookup::Hit,
                    age,
                });
            }
            Some(_) => Lookup::Expired,
            None => Lookup::Miss,
        };

        tracing::debug!(%mode, ?lookup, "fetching snapshot");
        let snapshot = fetch()?;

        if snapshot.is_empty() {
            tracing::debug!(%mode, "empty snapshot not cached");
            self.lock().remove(&mode);
        } else {
            self.lock().insert(
                mode,
                CacheEntry {
                    key: mode,
                    value: snapshot.clone(),
                    fetched_at: self.clock.now(),
                },
            );
        }

        Ok(Cached {
            snapshot,
            lookup,
            age: Duration::ZERO,
        })
    }

    /// Stored entry for `mode`, fresh or not.
    pub fn peek(&self, mode: ScreenerMode) -> Option<CacheEntry> {
        self.lock().get(&mode).cloned()
    }

    pub fn invalidate(&self, mode: ScreenerMode) -> bool {
        self.lock().remove(&mode).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use screenboard_core::{DataSource, Row};
    use std::cell::Cell;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap()
    }

    fn snapshot(ticker: &str) -> Snapshot {
        Snapshot::new(
            vec!["Ticker".into(), "Change".into()],
            vec![Row::new().with("Ticker", ticker).with("Change", "1.0%")],
            DataSource::Synthetic,
        )
    }

    fn cache(ttl_secs: u64) -> (SnapshotCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = SnapshotCache::with_clock(Duration::from_secs(ttl_secs), clock.clone());
        (cache, clock)
    }

    #[test]
    fn hit_within_window() {
        let (cache, clock) = cache(300);
        let calls = Cell::new(0);
        let fetch = || {
            calls.set(calls.get() + 1);
            Ok(snapshot("AAPL"))
        };

        let first = cache.get_or_fetch(ScreenerMode::Momentum, fetch).unwrap();
        assert_eq!(first.lookup, Lookup::Miss);

        clock.advance_secs(299);
        let second = cache.get_or_fetch(ScreenerMode::Momentum, fetch).unwrap();
        assert_eq!(second.lookup, Lookup::Hit);
        assert_eq!(second.age, Duration::from_secs(299));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn refetch_at_ttl_boundary() {
        let (cache, clock) = cache(300);
        cache
            .get_or_fetch(ScreenerMode::Momentum, || Ok(snapshot("AAPL")))
            .unwrap();

        clock.advance_secs(300);
        let again = cache
            .get_or_fetch(ScreenerMode::Momentum, || Ok(snapshot("MSFT")))
            .unwrap();
        assert_eq!(again.lookup, Lookup::Expired);
        assert_eq!(again.snapshot.rows[0].get("Ticker"), Some("MSFT"));

        let entry = cache.peek(ScreenerMode::Momentum).unwrap();
        assert_eq!(entry.fetched_at, start() + ChronoDuration::seconds(300));
        assert_eq!(entry.key, ScreenerMode::Momentum);
    }

    #[test]
    fn modes_are_cached_independently() {
        let (cache, _clock) = cache(300);
        cache
            .get_or_fetch(ScreenerMode::Momentum, || Ok(snapshot("AAPL")))
            .unwrap();
        let sp = cache
            .get_or_fetch(ScreenerMode::Sp500, || Ok(snapshot("XOM")))
            .unwrap();
        assert_eq!(sp.lookup, Lookup::Miss);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn errors_are_not_cached() {
        let (cache, _clock) = cache(300);
        let err = cache
            .get_or_fetch(ScreenerMode::Momentum, || {
                Err(DataError::NetworkUnreachable("down".into()))
            })
            .unwrap_err();
        assert!(matches!(err, DataError::NetworkUnreachable(_)));
        assert!(cache.is_empty());

        let ok = cache
            .get_or_fetch(ScreenerMode::Momentum, || Ok(snapshot("AAPL")))
            .unwrap();
        assert_eq!(ok.lookup, Lookup::Miss);
    }

    #[test]
    fn failed_refresh_keeps_nothing_stale_in_the_way() {
        let (cache, clock) = cache(60);
        cache
            .get_or_fetch(ScreenerMode::Momentum, || Ok(snapshot("AAPL")))
            .unwrap();
        clock.advance_secs(61);
        assert!(cache
            .get_or_fetch(ScreenerMode::Momentum, || Err(DataError::CircuitBreakerTripped))
            .is_err());
        // The expired entry stays but is never served as a hit.
        let next = cache
            .get_or_fetch(ScreenerMode::Momentum, || Ok(snapshot("MSFT")))
            .unwrap();
        assert_eq!(next.lookup, Lookup::Expired);
    }

    #[test]
    fn empty_snapshots_are_not_cached() {
        let (cache, _clock) = cache(300);
        let empty = cache
            .get_or_fetch(ScreenerMode::Momentum, || Ok(Snapshot::empty(DataSource::Finviz)))
            .unwrap();
        assert!(empty.snapshot.is_empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_and_clear() {
        let (cache, _clock) = cache(300);
        cache
            .get_or_fetch(ScreenerMode::Momentum, || Ok(snapshot("AAPL")))
            .unwrap();
        cache
            .get_or_fetch(ScreenerMode::Sp500, || Ok(snapshot("XOM")))
            .unwrap();

        assert!(cache.invalidate(ScreenerMode::Momentum));
        assert!(!cache.invalidate(ScreenerMode::Momentum));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn clock_going_backwards_counts_as_fresh() {
        let entry = CacheEntry {
            key: ScreenerMode::Momentum,
            value: snapshot("AAPL"),
            fetched_at: start(),
        };
        let earlier = start() - ChronoDuration::seconds(10);
        assert_eq!(entry.age(earlier), Duration::ZERO);
        assert!(entry.is_fresh(earlier, Duration::from_secs(1)));
    }
}
