// Property-based tests for the filter/paginate/select pipeline.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashSet;

use proptest::prelude::*;

use custommarket_core::{FilterState, Grid, Pager, Selection, ROWS_PER_PAGE_OPTIONS};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Arbitrary cell: short mixed text, sometimes empty.
fn arb_cell() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => r"[a-zA-Z0-9 ]{0,8}",
        1 => Just(String::new()),
    ]
}

/// Arbitrary grid: 1-5 header columns, ragged data rows (width 0..=6).
fn arb_grid(max_rows: usize) -> impl Strategy<Value = Grid> {
    let header = proptest::collection::vec(r"[a-z]{1,6}", 1..=5);
    let rows = proptest::collection::vec(
        proptest::collection::vec(arb_cell(), 0..=6),
        0..=max_rows,
    );
    (header, rows).prop_map(|(header, rows)| {
        let mut all = vec![header];
        all.extend(rows);
        Grid::new(all)
    })
}

// ---------------------------------------------------------------------------
// Filter properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn identity_filter_maps_every_row(grid in arb_grid(40)) {
        let filter = FilterState::default();
        let visible = filter.apply(&grid);
        let expected: Vec<usize> = (0..grid.data_row_count()).collect();
        prop_assert_eq!(visible.as_slice(), expected.as_slice());
    }

    #[test]
    fn search_includes_exactly_the_matching_rows(
        grid in arb_grid(40),
        needle in r"[a-z0-9]{1,3}",
    ) {
        let filter = FilterState {
            search: needle.clone(),
            ..Default::default()
        };
        let visible: HashSet<usize> = filter.apply(&grid).iter().collect();
        let wanted = needle.to_lowercase();
        for (i, row) in grid.data_rows().iter().enumerate() {
            let matches = row.iter().any(|c| c.to_lowercase().contains(&wanted));
            prop_assert_eq!(
                visible.contains(&i),
                matches,
                "row {} inclusion disagrees with substring match",
                i
            );
        }
    }

    #[test]
    fn column_filters_compose_with_and(
        grid in arb_grid(40),
        col in 0..6usize,
        needle in r"[a-z0-9]{1,2}",
        search in r"[a-z0-9]{1,2}",
    ) {
        let mut filter = FilterState {
            search: search.clone(),
            ..Default::default()
        };
        filter.set_column_filter(col, needle.clone());
        let visible: HashSet<usize> = filter.apply(&grid).iter().collect();
        let needle = needle.to_lowercase();
        let search = search.to_lowercase();
        for (i, row) in grid.data_rows().iter().enumerate() {
            let cell = row.get(col).map(String::as_str).unwrap_or("");
            let col_ok = cell.to_lowercase().contains(&needle);
            let search_ok = row.iter().any(|c| c.to_lowercase().contains(&search));
            prop_assert_eq!(visible.contains(&i), col_ok && search_ok);
        }
    }
}

// ---------------------------------------------------------------------------
// Pagination properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn pages_concatenate_to_the_whole_row_set(
        total in 0..300usize,
        size_idx in 0..4usize,
    ) {
        let rows: Vec<usize> = (0..total).collect();
        let mut pager = Pager::default();
        pager.set_rows_per_page(ROWS_PER_PAGE_OPTIONS[size_idx]);

        let mut seen = Vec::new();
        pager.first_page();
        loop {
            seen.extend_from_slice(&rows[pager.page_range(total)]);
            if !pager.can_next(total) {
                break;
            }
            pager.next_page(total);
        }
        prop_assert_eq!(seen, rows);

        let k = pager.rows_per_page();
        let expected_pages = if total == 0 { 1 } else { total.div_ceil(k) };
        prop_assert_eq!(pager.total_pages(total), expected_pages);
    }

    #[test]
    fn current_page_is_always_clamped(
        total in 0..300usize,
        size_idx in 0..4usize,
        jump in 0..50usize,
    ) {
        let mut pager = Pager::default();
        pager.set_rows_per_page(ROWS_PER_PAGE_OPTIONS[size_idx]);
        pager.set_page(jump, total);
        let page = pager.current_page(total);
        prop_assert!(page >= 1);
        prop_assert!(page <= pager.total_pages(total));
        // shrinking the row set keeps the invariant
        let page = pager.current_page(total / 2);
        prop_assert!(page >= 1);
        prop_assert!(page <= pager.total_pages(total / 2));
    }
}

// ---------------------------------------------------------------------------
// Selection properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn toggle_row_is_its_own_inverse(
        rows in proptest::collection::btree_set(0..100usize, 0..20),
        row in 0..100usize,
    ) {
        let mut sel = Selection {
            rows,
            ..Default::default()
        };
        let before = sel.clone();
        sel.toggle_row(row);
        sel.toggle_row(row);
        prop_assert_eq!(sel, before);
    }

    #[test]
    fn select_all_then_again_empties_the_page(
        page in proptest::collection::btree_set(0..50usize, 1..12),
        prior in proptest::collection::btree_set(50..80usize, 0..6),
    ) {
        let page: Vec<usize> = page.into_iter().collect();
        let mut sel = Selection {
            rows: prior,
            ..Default::default()
        };
        sel.toggle_page_rows(&page);
        for r in &page {
            prop_assert!(sel.row_selected(*r));
        }
        prop_assert_eq!(sel.sorted_rows(), page.clone());
        sel.toggle_page_rows(&page);
        prop_assert!(sel.rows.is_empty());
    }
}
