//! Synthetic snapshots for demos and tests.
//!
//! Rows look like a screener export but the data is made up: column order is
//! shuffled, the change column name varies with the seed, and change cells
//! mix every format the real feed has produced, including unparseable ones.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::mode::ScreenerMode;
use super::provider::{DataError, ScreenerProvider};
use crate::domain::{DataSource, Row, Snapshot};
use crate::sector::DEFAULT_SECTOR_LABELS;

/// Change column names seen across screener revisions.
pub const CHANGE_COLUMN_VARIANTS: [&str; 3] = ["Change", "Change %", "Perf Change"];

/// Generate a snapshot of `rows` rows. Same seed, same snapshot content.
pub fn generate_snapshot(seed: u64, rows: usize) -> Snapshot {
    let mut rng = StdRng::seed_from_u64(seed);
    let change_column = CHANGE_COLUMN_VARIANTS[rng.gen_range(0..CHANGE_COLUMN_VARIANTS.len())];

    let mut columns: Vec<String> = ["No.", "Ticker", "Company", "Sector", "Price", change_column, "Volume"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    columns.shuffle(&mut rng);

    let data = (0..rows)
        .map(|i| {
            let sector = if rng.gen_bool(0.05) {
                "Conglomerates"
            } else {
                DEFAULT_SECTOR_LABELS[rng.gen_range(0..DEFAULT_SECTOR_LABELS.len())].0
            };
            let change: f64 = rng.gen_range(-8.0..8.0);
            let change_cell = match rng.gen_range(0..10) {
                0 => "-".to_string(),
                1 => format!("{change:.2}"),
                _ => format!("{change:+.2}%"),
            };
            Row::new()
                .with("No.", (i + 1).to_string())
                .with("Ticker", format!("SYN{i:03}"))
                .with("Company", format!("Synthetic Holdings {i}"))
                .with("Sector", sector)
                .with("Price", format!("{:.2}", rng.gen_range(5.0..500.0)))
                .with(change_column, change_cell)
                .with("Volume", rng.gen_range(1_000_000u64..50_000_000).to_string())
        })
        .collect();

    Snapshot::new(columns, data, DataSource::Synthetic)
}

/// Provider that serves generated snapshots.
pub struct SyntheticProvider {
    seed: u64,
    rows: usize,
}

impl SyntheticProvider {
    pub fn new(seed: u64, rows: usize) -> Self {
        Self { seed, rows }
    }
}

impl ScreenerProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, mode: ScreenerMode) -> Result<Snapshot, DataError> {
        let seed = match mode {
            ScreenerMode::Sp500 => self.seed,
            ScreenerMode::Momentum => self.seed.wrapping_add(1),
        };
        Ok(generate_snapshot(seed, self.rows))
    }
}
