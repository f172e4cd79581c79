//! Finviz screener provider.
//!
//! Pulls the screener's CSV export for a mode's filter set. Handles rate
//! limiting, retries with exponential backoff and the circuit breaker. The
//! export endpoint answers with an HTML login page instead of CSV when the
//! auth token is missing or expired; that is reported as a format change
//! rather than parsed as data.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Response;
use reqwest::{StatusCode, Url};
use tracing::{debug, info, warn};

use super::circuit_breaker::CircuitBreaker;
use super::csv_snapshot::parse_snapshot;
use super::mode::ScreenerMode;
use super::provider::{DataError, ScreenerProvider};
use crate::domain::{DataSource, Snapshot};

pub const DEFAULT_FINVIZ_BASE: &str = "https://elite.finviz.com";

/// Overview view (ticker, company, sector, industry, country, market cap, P/E, price, change, volume).
const OVERVIEW_VIEW: &str = "111";

/// Reported to callers when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Longest wait a `Retry-After` header can impose between attempts.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Finviz screener provider.
pub struct FinvizProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    base_url: String,
    auth_token: Option<String>,
    max_retries: u32,
    base_delay: Duration,
    max_retry_after: Duration,
}

/// What one request told us to do next.
enum Outcome {
    Body(String),
    /// Try again, waiting at least `wait` if the server asked for it.
    Retry {
        error: DataError,
        wait: Option<Duration>,
    },
    Fatal(DataError),
}

impl FinvizProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            base_url: DEFAULT_FINVIZ_BASE.to_string(),
            auth_token: None,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_retry_after: MAX_RETRY_AFTER,
        })
    }

    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// Ceiling for server-requested waits.
    pub fn with_max_retry_after(mut self, ceiling: Duration) -> Self {
        self.max_retry_after = ceiling;
        self
    }

    /// Build the export URL for a mode. The token is form-encoded.
    pub fn export_url(&self, mode: ScreenerMode) -> Result<Url, DataError> {
        self.build_url(mode, self.auth_token.as_deref())
    }

    /// Same URL with the token masked, for logs.
    fn redacted_url(&self, mode: ScreenerMode) -> String {
        let masked = self.auth_token.as_ref().map(|_| "***");
        match self.build_url(mode, masked) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}/export.ashx", self.base_url),
        }
    }

    fn build_url(&self, mode: ScreenerMode, token: Option<&str>) -> Result<Url, DataError> {
        let mut url = Url::parse(&format!("{}/export.ashx", self.base_url))
            .map_err(|e| DataError::Other(format!("invalid screener base URL {:?}: {e}", self.base_url)))?;
        // Filter codes are comma-joined; set verbatim so the commas survive.
        url.set_query(Some(&format!("v={OVERVIEW_VIEW}&f={}", mode.filter_codes())));
        if let Some(token) = token {
            url.query_pairs_mut().append_pair("auth", token);
        }
        Ok(url)
    }

    /// Turn an export response body into a snapshot.
    pub fn parse_export_body(body: &str) -> Result<Snapshot, DataError> {
        let trimmed = body.trim_start_matches('\u{feff}').trim_start();
        if trimmed.starts_with('<') {
            return Err(DataError::ResponseFormatChanged(
                "received HTML instead of CSV (is the auth token valid?)".into(),
            ));
        }
        parse_snapshot(trimmed.as_bytes(), DataSource::Finviz)
    }

    /// Pause before `attempt` (1-based): exponential backoff, stretched to
    /// the server's `Retry-After` up to the configured ceiling.
    fn wait_before(&self, attempt: u32, requested: Option<Duration>) -> Duration {
        let backoff = self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1));
        match requested {
            Some(wait) => backoff.max(wait.min(self.max_retry_after)),
            None => backoff,
        }
    }

    /// Request the export, retrying transient failures.
    fn fetch_with_retry(&self, mode: ScreenerMode) -> Result<String, DataError> {
        let url = self.export_url(mode)?;
        let mut requested_wait = None;
        let mut last_error = DataError::Other("max retries exceeded".into());

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.wait_before(attempt, requested_wait.take());
                debug!(attempt, ?delay, "retrying screener export");
                std::thread::sleep(delay);
            }
            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            match self.request(&url, mode) {
                Outcome::Body(body) => return Ok(body),
                Outcome::Fatal(err) => return Err(err),
                Outcome::Retry { error, wait } => {
                    requested_wait = wait;
                    last_error = error;
                }
            }
        }

        Err(last_error)
    }

    fn request(&self, url: &Url, mode: ScreenerMode) -> Outcome {
        let resp = match self.client.get(url.clone()).send() {
            Ok(resp) => resp,
            Err(e) if e.is_connect() || e.is_timeout() => {
                return Outcome::Retry {
                    error: DataError::NetworkUnreachable(e.to_string()),
                    wait: None,
                }
            }
            Err(e) => return Outcome::Fatal(DataError::NetworkUnreachable(e.to_string())),
        };

        let status = resp.status();
        match status {
            s if s == StatusCode::FORBIDDEN => {
                self.circuit_breaker.trip();
                Outcome::Fatal(DataError::CircuitBreakerTripped)
            }
            s if s == StatusCode::UNAUTHORIZED => Outcome::Fatal(DataError::AuthenticationRequired(
                "Finviz export requires an auth token".into(),
            )),
            s if s == StatusCode::TOO_MANY_REQUESTS => {
                self.circuit_breaker.record_failure();
                let wait = retry_after(&resp, Utc::now());
                let retry_after_secs = wait.map_or(DEFAULT_RETRY_AFTER_SECS, |w| w.as_secs());
                warn!(retry_after_secs, "screener rate limited");
                Outcome::Retry {
                    error: DataError::RateLimited { retry_after_secs },
                    wait,
                }
            }
            s if !s.is_success() => {
                self.circuit_breaker.record_failure();
                Outcome::Retry {
                    error: DataError::Other(format!("HTTP {status} for {mode}")),
                    wait: None,
                }
            }
            _ => match resp.text() {
                Ok(body) => {
                    self.circuit_breaker.record_success();
                    Outcome::Body(body)
                }
                Err(e) => Outcome::Fatal(DataError::ResponseFormatChanged(format!(
                    "unreadable body for {mode}: {e}"
                ))),
            },
        }
    }
}

fn retry_after(resp: &Response, now: DateTime<Utc>) -> Option<Duration> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| parse_retry_after(v, now))
}

/// `Retry-After` is either delta-seconds or an HTTP date.
fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

impl ScreenerProvider for FinvizProvider {
    fn name(&self) -> &str {
        "finviz"
    }

    fn fetch(&self, mode: ScreenerMode) -> Result<Snapshot, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }
        info!(url = %self.redacted_url(mode), "fetching screener snapshot");
        let body = self.fetch_with_retry(mode)?;
        let snapshot = Self::parse_export_body(&body)?;
        info!(%mode, rows = snapshot.len(), "screener snapshot received");
        Ok(snapshot)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
