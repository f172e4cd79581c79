//! Screener modes and the filter criteria each one sends upstream.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single screener criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenerFilter {
    /// Criterion name as shown on the screener.
    pub name: &'static str,
    /// Selected value as shown on the screener.
    pub value: &'static str,
    /// Finviz URL code for this criterion/value pair.
    pub code: &'static str,
}

/// Which basket to screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenerMode {
    /// Fixed index basket: S&P 500 members.
    Sp500,
    /// Momentum basket: actively traded mid/large caps above $5.
    Momentum,
}

const SP500_FILTERS: [ScreenerFilter; 1] = [ScreenerFilter {
    name: "Index",
    value: "S&P 500",
    code: "idx_sp500",
}];

const MOMENTUM_FILTERS: [ScreenerFilter; 3] = [
    ScreenerFilter {
        name: "Price",
        value: "Over $5",
        code: "sh_price_o5",
    },
    ScreenerFilter {
        name: "Average Volume",
        value: "Over 1M",
        code: "sh_avgvol_o1000",
    },
    ScreenerFilter {
        name: "Market Cap.",
        value: "+Mid (over $2bln)",
        code: "cap_midover",
    },
];

impl ScreenerMode {
    pub const ALL: [ScreenerMode; 2] = [ScreenerMode::Momentum, ScreenerMode::Sp500];

    pub fn filters(self) -> &'static [ScreenerFilter] {
        match self {
            ScreenerMode::Sp500 => &SP500_FILTERS,
            ScreenerMode::Momentum => &MOMENTUM_FILTERS,
        }
    }

    /// Comma-joined Finviz filter codes, e.g. `sh_price_o5,sh_avgvol_o1000,cap_midover`.
    pub fn filter_codes(self) -> String {
        self.filters()
            .iter()
            .map(|f| f.code)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ScreenerMode::Sp500 => "S&P 500",
            ScreenerMode::Momentum => "Momentum",
        }
    }
}

impl Default for ScreenerMode {
    fn default() -> Self {
        ScreenerMode::Momentum
    }
}

impl fmt::Display for ScreenerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ScreenerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sp500" | "s&p500" | "s&p 500" | "index" => Ok(ScreenerMode::Sp500),
            "momentum" | "movers" => Ok(ScreenerMode::Momentum),
            other => Err(format!(
                "unknown screener mode '{other}'. Valid: momentum, sp500"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_codes_join() {
        assert_eq!(ScreenerMode::Sp500.filter_codes(), "idx_sp500");
        assert_eq!(
            ScreenerMode::Momentum.filter_codes(),
            "sh_price_o5,sh_avgvol_o1000,cap_midover"
        );
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("S&P 500".parse::<ScreenerMode>().unwrap(), ScreenerMode::Sp500);
        assert_eq!("SP500".parse::<ScreenerMode>().unwrap(), ScreenerMode::Sp500);
        assert_eq!("movers".parse::<ScreenerMode>().unwrap(), ScreenerMode::Momentum);
        assert!("nasdaq".parse::<ScreenerMode>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&ScreenerMode::Sp500).unwrap();
        assert_eq!(json, "\"sp500\"");
    }
}
