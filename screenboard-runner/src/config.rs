//! Serializable board configuration.
//!
//! Loaded from a TOML file; every field has a default so an empty file (or no
//! file at all) yields a working momentum board.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use screenboard_core::data::finviz::DEFAULT_FINVIZ_BASE;
use screenboard_core::links::DEFAULT_QUOTE_BASE;
use screenboard_core::{ScreenerMode, SectorTable, DEFAULT_LIMIT};

use crate::enrich::{PLACEHOLDER_EMPTY, PLACEHOLDER_FAILED};

/// Environment variable consulted for the Finviz export token.
pub const FINVIZ_TOKEN_ENV: &str = "SCREENBOARD_FINVIZ_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("parse config TOML: {0}")]
    Parse(String),

    #[error("serialize config: {0}")]
    Serialize(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete board configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BoardConfig {
    pub board: BoardSection,
    pub screener: ScreenerSection,
    pub enrichment: EnrichmentSection,
    pub links: LinksSection,
    /// Sector label overrides, merged over the built-in table.
    pub sectors: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSection {
    pub mode: ScreenerMode,
    /// Rows kept after ranking.
    pub limit: usize,
    /// Snapshot cache window in seconds.
    pub cache_ttl_secs: u64,
    /// Change (percent) at which heatmap colour saturates.
    pub color_range: f64,
}

impl Default for BoardSection {
    fn default() -> Self {
        Self {
            mode: ScreenerMode::Momentum,
            limit: DEFAULT_LIMIT,
            cache_ttl_secs: 300,
            color_range: 3.0,
        }
    }
}

/// Which snapshot provider backs the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Finviz,
    Csv,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerSection {
    pub provider: ProviderKind,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Snapshot file for the `csv` provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,
    pub synthetic_seed: u64,
    pub synthetic_rows: usize,
}

impl Default for ScreenerSection {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Finviz,
            base_url: DEFAULT_FINVIZ_BASE.to_string(),
            auth_token: None,
            csv_path: None,
            synthetic_seed: 42,
            synthetic_rows: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentSection {
    pub enabled: bool,
    /// How many of the top ranked rows get a description.
    pub top_n: usize,
    /// Worker pool size for description lookups.
    pub workers: usize,
    /// Translation target; `en` skips translation.
    pub target_lang: String,
    pub max_chars: usize,
    pub timeout_secs: u64,
    pub placeholder_empty: String,
    pub placeholder_failed: String,
}

impl Default for EnrichmentSection {
    fn default() -> Self {
        Self {
            enabled: true,
            top_n: 5,
            workers: 5,
            target_lang: "zh".to_string(),
            max_chars: 120,
            timeout_secs: 10,
            placeholder_empty: PLACEHOLDER_EMPTY.to_string(),
            placeholder_failed: PLACEHOLDER_FAILED.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksSection {
    pub quote_base: String,
}

impl Default for LinksSection {
    fn default() -> Self {
        Self {
            quote_base: DEFAULT_QUOTE_BASE.to_string(),
        }
    }
}

impl BoardConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board.limit == 0 {
            return Err(ConfigError::Invalid("board.limit must be at least 1".into()));
        }
        if self.board.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid("board.cache_ttl_secs must be positive".into()));
        }
        if !(self.board.color_range > 0.0) {
            return Err(ConfigError::Invalid("board.color_range must be positive".into()));
        }
        if self.enrichment.workers == 0 {
            return Err(ConfigError::Invalid("enrichment.workers must be at least 1".into()));
        }
        if self.enrichment.max_chars == 0 {
            return Err(ConfigError::Invalid("enrichment.max_chars must be at least 1".into()));
        }
        if self.screener.provider == ProviderKind::Csv && self.screener.csv_path.is_none() {
            return Err(ConfigError::Invalid(
                "screener.csv_path is required for the csv provider".into(),
            ));
        }
        Ok(())
    }

    /// Fill the Finviz token from the environment if the file has none.
    pub fn apply_env(&mut self) {
        if self.screener.auth_token.is_none() {
            self.screener.auth_token = std::env::var(FINVIZ_TOKEN_ENV)
                .ok()
                .filter(|t| !t.trim().is_empty());
        }
    }

    /// Built-in sector table with this config's overrides applied.
    pub fn sector_table(&self) -> SectorTable {
        SectorTable::default().with_overrides(self.sectors.clone())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.board.cache_ttl_secs)
    }

    /// Rows to enrich: never more than the table holds.
    pub fn enrich_count(&self) -> usize {
        if self.enrichment.enabled {
            self.enrichment.top_n.min(self.board.limit)
        } else {
            0
        }
    }
}
