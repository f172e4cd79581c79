//! Sector localization.
//!
//! The screener reports sectors from a fixed 11-value vocabulary. The lookup
//! table maps each to a localized label; anything unknown maps to itself, so
//! localization is total.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upstream sector vocabulary paired with the default (Simplified Chinese) labels.
pub const DEFAULT_SECTOR_LABELS: [(&str, &str); 11] = [
    ("Technology", "科技"),
    ("Financial", "金融"),
    ("Healthcare", "医疗"),
    ("Consumer Cyclical", "可选消费"),
    ("Industrials", "工业"),
    ("Communication Services", "通讯"),
    ("Consumer Defensive", "必需消费"),
    ("Energy", "能源"),
    ("Real Estate", "地产"),
    ("Utilities", "公用事业"),
    ("Basic Materials", "材料"),
];

/// Localize a sector with the default table.
pub fn localize_sector(sector: &str) -> &str {
    DEFAULT_SECTOR_LABELS
        .iter()
        .find(|(key, _)| *key == sector.trim())
        .map(|(_, label)| *label)
        .unwrap_or(sector)
}

/// Sector → label lookup with identity fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorTable {
    labels: BTreeMap<String, String>,
}

impl Default for SectorTable {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_SECTOR_LABELS)
    }
}

impl SectorTable {
    /// A table with no entries: every sector maps to itself.
    pub fn identity() -> Self {
        Self {
            labels: BTreeMap::new(),
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            labels: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Add or replace entries.
    pub fn with_overrides<K, V>(mut self, overrides: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in overrides {
            self.labels.insert(k.into(), v.into());
        }
        self
    }

    pub fn localize<'a>(&'a self, sector: &'a str) -> &'a str {
        self.labels
            .get(sector.trim())
            .map(|s| s.as_str())
            .unwrap_or(sector)
    }

    /// Entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
