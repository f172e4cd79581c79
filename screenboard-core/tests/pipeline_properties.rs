//! Property tests for the ranking pipeline.
//!
//! Uses proptest to verify:
//! 1. normalize_change reads every well-formed change cell and never panics
//! 2. rank output is bounded, non-increasing, stable and idempotent
//! 3. locate_change_column returns the first match or the full column list
//! 4. sector localization is total

use proptest::prelude::*;
use screenboard_core::{
    locate_change_column, normalize_change, rank, PipelineError, Row, SectorTable,
};
use screenboard_core::sector::DEFAULT_SECTOR_LABELS;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_change_cell() -> impl Strategy<Value = String> {
    prop_oneof![
        "[+-]?[0-9]{1,4}(\\.[0-9]{1,3})?%?",
        Just(String::new()),
        Just("-".to_string()),
        "[a-zA-Z/ ]{1,6}",
    ]
}

fn arb_rows() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(arb_change_cell(), 0..60).prop_map(|cells| {
        cells
            .into_iter()
            .enumerate()
            .map(|(i, c)| Row::new().with("Ticker", format!("T{i}")).with("Change", c))
            .collect()
    })
}

fn index_of(row: &Row) -> usize {
    row.get("Ticker").unwrap()[1..].parse().unwrap()
}

// ── 1. normalize_change ─────────────────────────────────────────────

proptest! {
    /// Well-formed cells parse to the signed number with `+`/`%` removed.
    #[test]
    fn well_formed_cells_parse(
        negative in any::<bool>(),
        explicit_plus in any::<bool>(),
        int_part in 0u32..10_000,
        frac in proptest::option::of(0u32..1000),
        percent in any::<bool>(),
    ) {
        let magnitude = match frac {
            Some(f) => format!("{int_part}.{f}"),
            None => int_part.to_string(),
        };
        let sign = if negative { "-" } else if explicit_plus { "+" } else { "" };
        let cell = format!("{sign}{magnitude}{}", if percent { "%" } else { "" });

        let expected: f64 = format!("{}{magnitude}", if negative { "-" } else { "" })
            .parse()
            .unwrap();
        prop_assert_eq!(normalize_change(&cell), expected);
    }

    /// Letters-only input never parses to anything but zero.
    #[test]
    fn non_numeric_is_zero(raw in "[a-zA-Z ]{0,12}") {
        prop_assert_eq!(normalize_change(&raw), 0.0);
    }

    /// Arbitrary input never panics and always yields a finite number.
    #[test]
    fn never_panics(raw in ".{0,24}") {
        prop_assert!(normalize_change(&raw).is_finite());
    }
}

// ── 2. rank ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rank_is_bounded(rows in arb_rows(), limit in 0usize..80) {
        let ranked = rank(&rows, "Change", limit);
        prop_assert!(ranked.len() <= limit);
        prop_assert!(ranked.len() <= rows.len());
        prop_assert_eq!(ranked.len(), limit.min(rows.len()));
    }

    #[test]
    fn rank_is_non_increasing_and_stable(rows in arb_rows(), limit in 0usize..80) {
        let ranked = rank(&rows, "Change", limit);
        for pair in ranked.windows(2) {
            let a = normalize_change(pair[0].get("Change").unwrap());
            let b = normalize_change(pair[1].get("Change").unwrap());
            prop_assert!(a >= b);
            if a == b {
                prop_assert!(index_of(&pair[0]) < index_of(&pair[1]));
            }
        }
    }

    #[test]
    fn rank_is_idempotent(rows in arb_rows(), limit in 0usize..80) {
        let once = rank(&rows, "Change", limit);
        let twice = rank(&once, "Change", limit);
        prop_assert_eq!(once, twice);
    }
}

// ── 3. locate_change_column ─────────────────────────────────────────

proptest! {
    #[test]
    fn locate_returns_first_match(
        before in prop::collection::vec("[A-Za-z ]{1,8}", 0..5),
        after in prop::collection::vec("[A-Za-z ]{1,8}", 0..5),
    ) {
        let before: Vec<String> = before.into_iter().filter(|c| !c.contains("Change")).collect();
        let mut columns = before;
        columns.push("Change %".to_string());
        columns.push("Change".to_string());
        columns.extend(after);
        prop_assert_eq!(locate_change_column(&columns).unwrap(), "Change %");
    }

    #[test]
    fn locate_without_match_lists_columns(
        columns in prop::collection::vec("[a-z ]{1,8}", 0..6),
    ) {
        prop_assert_eq!(
            locate_change_column(&columns),
            Err(PipelineError::ChangeColumnNotFound { available: columns.clone() })
        );
    }
}

// ── 4. localize ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn localize_is_total(sector in ".{0,24}") {
        let table = SectorTable::default();
        let label = table.localize(&sector);
        match DEFAULT_SECTOR_LABELS.iter().find(|(k, _)| *k == sector.trim()) {
            Some((_, expected)) => prop_assert_eq!(label, *expected),
            None => prop_assert_eq!(label, sector.as_str()),
        }
    }
}
