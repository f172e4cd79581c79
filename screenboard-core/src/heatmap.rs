//! Heatmap layout: the data behind the sector → ticker treemap.
//!
//! Groups follow the order in which their sector first appears in the ranked
//! table. Every tile has equal weight; colour comes from `intensity`, the
//! change clamped to `[-range, range]` and scaled to `[-1, 1]`.

use serde::{Deserialize, Serialize};

use crate::domain::RankedTable;

/// Change (in percent) at which the colour scale saturates.
pub const DEFAULT_COLOR_RANGE: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub ticker: String,
    pub change_pct: f64,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorGroup {
    pub label: String,
    pub tiles: Vec<Tile>,
}

impl SectorGroup {
    pub fn mean_change(&self) -> f64 {
        if self.tiles.is_empty() {
            return 0.0;
        }
        self.tiles.iter().map(|t| t.change_pct).sum::<f64>() / self.tiles.len() as f64
    }
}

/// Map a change onto `[-1, 1]`. A non-positive range yields 0.
pub fn intensity(change_pct: f64, color_range: f64) -> f64 {
    if !(color_range > 0.0) || !change_pct.is_finite() {
        return 0.0;
    }
    (change_pct / color_range).clamp(-1.0, 1.0)
}

pub fn layout(table: &RankedTable, color_range: f64) -> Vec<SectorGroup> {
    let mut groups: Vec<SectorGroup> = Vec::new();
    for row in &table.rows {
        let tile = Tile {
            ticker: row.ticker.clone(),
            change_pct: row.change_pct,
            intensity: intensity(row.change_pct, color_range),
        };
        match groups.iter_mut().find(|g| g.label == row.sector_label) {
            Some(group) => group.tiles.push(tile),
            None => groups.push(SectorGroup {
                label: row.sector_label.clone(),
                tiles: vec![tile],
            }),
        }
    }
    groups
}
