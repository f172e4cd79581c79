//! Description and translation backends.
//!
//! Both are blocking HTTP calls made from enrichment workers. Neither retries:
//! a failure becomes a placeholder one level up.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_PROFILE_BASE: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_TRANSLATE_URL: &str = "https://api.mymemory.translated.net/get";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrichError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status} from {service}")]
    Status { service: &'static str, status: u16 },

    #[error("unexpected response: {0}")]
    Format(String),

    #[error("translation rejected: {0}")]
    Translation(String),

    #[error("worker pool: {0}")]
    Pool(String),
}

/// Looks up the long business description for a ticker.
pub trait DescriptionSource: Send + Sync {
    /// An empty string means the company has no description.
    fn describe(&self, ticker: &str) -> Result<String, EnrichError>;
}

/// Translates English text into `target_lang`.
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, target_lang: &str) -> Result<String, EnrichError>;
}

fn build_client(timeout: Duration) -> Result<reqwest::blocking::Client, EnrichError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
        .build()
        .map_err(|e| EnrichError::Request(format!("failed to build HTTP client: {e}")))
}

// ─── Yahoo profile ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<QuoteSummaryResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    asset_profile: Option<AssetProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetProfile {
    long_business_summary: Option<String>,
}

/// Company descriptions from Yahoo's quoteSummary `assetProfile` module.
pub struct YahooProfileSource {
    client: reqwest::blocking::Client,
    base: Url,
}

impl YahooProfileSource {
    pub fn new(timeout: Duration) -> Result<Self, EnrichError> {
        Self::with_base(DEFAULT_PROFILE_BASE, timeout)
    }

    pub fn with_base(base: &str, timeout: Duration) -> Result<Self, EnrichError> {
        let base = Url::parse(base).map_err(|e| EnrichError::Format(format!("{base}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(EnrichError::Format(format!("{base} cannot be a base URL")));
        }
        Ok(Self {
            client: build_client(timeout)?,
            base,
        })
    }

    /// `<base>/v10/finance/quoteSummary/<TICKER>?modules=assetProfile`, ticker
    /// percent-encoded as one segment.
    pub fn profile_url(&self, ticker: &str) -> Result<Url, EnrichError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| EnrichError::Format(format!("{} cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(["v10", "finance", "quoteSummary", ticker]);
        url.query_pairs_mut().append_pair("modules", "assetProfile");
        Ok(url)
    }

    /// Pull `longBusinessSummary` out of a quoteSummary body.
    pub fn parse_profile(body: &str) -> Result<String, EnrichError> {
        let resp: QuoteSummaryResponse =
            serde_json::from_str(body).map_err(|e| EnrichError::Format(e.to_string()))?;
        if let Some(err) = resp.quote_summary.error.filter(|e| !e.is_null()) {
            return Err(EnrichError::Format(format!("quoteSummary error: {err}")));
        }
        let summary = resp
            .quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .and_then(|r| r.asset_profile)
            .and_then(|p| p.long_business_summary)
            .unwrap_or_default();
        Ok(summary.trim().to_string())
    }
}

impl DescriptionSource for YahooProfileSource {
    fn describe(&self, ticker: &str) -> Result<String, EnrichError> {
        let url = self.profile_url(ticker)?;
        debug!(%url, "fetching company profile");
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| EnrichError::Request(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(EnrichError::Status {
                service: "quoteSummary",
                status: status.as_u16(),
            });
        }
        let body = resp.text().map_err(|e| EnrichError::Request(e.to_string()))?;
        Self::parse_profile(&body)
    }
}

// ─── MyMemory translation ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryResponse {
    response_data: MyMemoryData,
    // Number on success, sometimes a string on errors.
    response_status: serde_json::Value,
    #[serde(default)]
    response_details: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryData {
    translated_text: Option<String>,
}

/// Free MyMemory translation API (English source).
pub struct MyMemoryTranslator {
    client: reqwest::blocking::Client,
    endpoint: Url,
    email: Option<String>,
}

impl MyMemoryTranslator {
    pub fn new(timeout: Duration) -> Result<Self, EnrichError> {
        Self::with_endpoint(DEFAULT_TRANSLATE_URL, timeout)
    }

    pub fn with_endpoint(endpoint: &str, timeout: Duration) -> Result<Self, EnrichError> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| EnrichError::Format(format!("{endpoint}: {e}")))?;
        Ok(Self {
            client: build_client(timeout)?,
            endpoint,
            email: None,
        })
    }

    /// Contact address; raises MyMemory's daily quota.
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email.filter(|e| !e.trim().is_empty());
        self
    }

    pub fn request_url(&self, text: &str, target_lang: &str) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("q", text)
                .append_pair("langpair", &format!("en|{target_lang}"));
            if let Some(email) = &self.email {
                query.append_pair("de", email);
            }
        }
        url
    }

    pub fn parse_translation(body: &str) -> Result<String, EnrichError> {
        let resp: MyMemoryResponse =
            serde_json::from_str(body).map_err(|e| EnrichError::Format(e.to_string()))?;

        let status = match &resp.response_status {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        };
        if status != Some(200) {
            let details = resp
                .response_details
                .map(|d| d.to_string())
                .unwrap_or_else(|| resp.response_status.to_string());
            return Err(EnrichError::Translation(details));
        }

        let text = resp.response_data.translated_text.unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            return Err(EnrichError::Translation("empty translation".into()));
        }
        // Quota exhaustion comes back as a 200 with a warning in place of the text.
        if text.starts_with("MYMEMORY WARNING") || text.starts_with("QUERY LENGTH LIMIT") {
            return Err(EnrichError::Translation(text.to_string()));
        }
        Ok(text.to_string())
    }
}

impl Translator for MyMemoryTranslator {
    fn translate(&self, text: &str, target_lang: &str) -> Result<String, EnrichError> {
        let resp = self
            .client
            .get(self.request_url(text, target_lang))
            .send()
            .map_err(|e| EnrichError::Request(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(EnrichError::Status {
                service: "mymemory",
                status: status.as_u16(),
            });
        }
        let body = resp.text().map_err(|e| EnrichError::Request(e.to_string()))?;
        Self::parse_translation(&body)
    }
}

/// Returns the input unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughTranslator;

impl Translator for PassthroughTranslator {
    fn translate(&self, text: &str, _target_lang: &str) -> Result<String, EnrichError> {
        Ok(text.to_string())
    }
}
