//! Property tests for A1 address encoding.

use proptest::prelude::*;
use sheetcalc_core::{CellAddress, CellRange, MAX_COLS, MAX_ROWS};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn encode_decode_round_trips(row in 0u32..10_000, col in 0u16..1000) {
        let text = CellAddress::encode(row, col);
        prop_assert_eq!(CellAddress::decode(&text), Some(CellAddress::new(row, col)));
    }

    #[test]
    fn encode_decode_round_trips_at_the_edges(row in 0u32..MAX_ROWS, col in 0u16..MAX_COLS) {
        let text = CellAddress::encode(row, col);
        prop_assert_eq!(CellAddress::decode(&text), Some(CellAddress::new(row, col)));
    }

    #[test]
    fn column_letters_are_uppercase_alpha(col in 0u16..MAX_COLS) {
        let letters = CellAddress::column_to_letters(col);
        prop_assert!(!letters.is_empty() && letters.len() <= 3);
        prop_assert!(letters.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn lowercase_never_decodes(row in 0u32..1000, col in 0u16..700) {
        let text = CellAddress::encode(row, col).to_lowercase();
        prop_assert_eq!(CellAddress::decode(&text), None);
    }

    #[test]
    fn range_iteration_matches_count(
        r1 in 0u32..40, c1 in 0u16..40, r2 in 0u32..40, c2 in 0u16..40,
    ) {
        let range = CellRange::from_indices(r1, c1, r2, c2);
        let cells: Vec<CellAddress> = range.cells().collect();

        prop_assert_eq!(cells.len() as u64, range.cell_count());
        prop_assert!(cells.iter().all(|addr| range.contains(addr)));
        prop_assert!(cells.windows(2).all(|pair| pair[0] < pair[1]));
    }
}

#[test]
fn out_of_bounds_addresses_do_not_decode() {
    assert_eq!(CellAddress::decode("XFD1048576"), Some(CellAddress::new(MAX_ROWS - 1, MAX_COLS - 1)));
    assert_eq!(CellAddress::decode("XFE1"), None);
    assert_eq!(CellAddress::decode("A1048577"), None);
}
