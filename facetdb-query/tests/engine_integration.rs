// SPDX-License-Identifier: AGPL-3.0-or-later
// FacetDB - In-Memory Faceted Filtering & Seriation Engine
// Copyright (C) 2026 FacetDB Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! End-to-end engine scenarios: ingestion through selection, refresh,
//! sorting, seriation and state round-trips, all through the public
//! `FacetEngine` surface.

use facetdb_core::{Channel, FacetError, SelectionMode, INVALID_ORDER};
use facetdb_query::{CatSortBy, FacetEngine, FilterState, MissingMode, SortSpec};

/// Movie-ish fixture: multi-valued "tags", single-valued "rating".
fn movie_engine() -> (FacetEngine, usize, usize) {
    let mut engine = FacetEngine::new();
    let tags = engine.add_attribute("tags", true, 0).unwrap();
    let rating = engine.add_attribute("rating", false, 0).unwrap();
    let rows: &[(&[&str], &[&str])] = &[
        (&["action", "thriller"], &["PG-13"]),
        (&["action"], &["R"]),
        (&["drama", "thriller"], &["R"]),
        (&["drama"], &["PG"]),
        (&["comedy"], &["PG"]),
        (&["comedy", "drama"], &["PG-13"]),
    ];
    for (t, r) in rows {
        engine.add_record(&[t, r]).unwrap();
    }
    (engine, tags, rating)
}

#[test]
fn test_progressive_and_narrowing_on_multi_valued() {
    let (mut engine, tags, rating) = movie_engine();
    assert_eq!(engine.active_count(), 6);

    // First AND keeps every record carrying "thriller".
    engine
        .apply_selection(tags, "thriller", SelectionMode::And)
        .unwrap();
    assert_eq!(engine.active_count(), 2);
    assert_eq!(
        engine.record_count(rating, "R", Channel::Active).unwrap(),
        1
    );

    // Second AND requires both values on the same record.
    engine
        .apply_selection(tags, "drama", SelectionMode::And)
        .unwrap();
    assert_eq!(engine.active_count(), 1);
    assert!(engine.is_included(2).unwrap());
    assert_eq!(
        engine.record_count(rating, "R", Channel::Active).unwrap(),
        1
    );
    assert_eq!(
        engine
            .record_count(rating, "PG-13", Channel::Active)
            .unwrap(),
        0
    );

    // Unwinding one AND widens back out.
    engine
        .apply_selection(tags, "drama", SelectionMode::And)
        .unwrap();
    assert_eq!(engine.active_count(), 2);
}

#[test]
fn test_total_coverage_not_is_rejected_without_side_effects() {
    let mut engine = FacetEngine::new();
    let lang = engine.add_attribute("language", false, 0).unwrap();
    for _ in 0..4 {
        engine.add_record(&[&["en"]]).unwrap();
    }

    // Every active record is "en"; excluding it would empty the set.
    let err = engine
        .apply_selection(lang, "en", SelectionMode::Not)
        .unwrap_err();
    assert!(err.is_rejection());

    // Untouched: counts, inclusion, exported state.
    assert_eq!(engine.active_count(), 4);
    for r in 0..4u32 {
        assert!(engine.is_included(r).unwrap());
    }
    assert!(engine.export_state(lang).unwrap().is_empty());

    // After other records dilute the coverage the same NOT is accepted.
    engine.add_record(&[&["fr"]]).unwrap();
    engine
        .apply_selection(lang, "en", SelectionMode::Not)
        .unwrap();
    assert_eq!(engine.active_count(), 1);
    assert!(engine.is_included(4).unwrap());
}

#[test]
fn test_filters_on_different_attributes_compose_as_and() {
    let (mut engine, tags, rating) = movie_engine();
    engine
        .apply_selection(tags, "drama", SelectionMode::And)
        .unwrap();
    engine
        .apply_selection(rating, "R", SelectionMode::And)
        .unwrap();

    // drama AND rating=R: only the drama/thriller/R record.
    assert_eq!(engine.active_count(), 1);
    assert!(engine.is_included(2).unwrap());

    // Dropping the rating filter leaves the tags filter in force.
    engine
        .apply_selection(rating, "R", SelectionMode::And)
        .unwrap();
    assert_eq!(engine.active_count(), 3);
}

#[test]
fn test_or_set_growth_and_singleton_normalization() {
    let (mut engine, tags, _) = movie_engine();
    engine
        .apply_selection(tags, "action", SelectionMode::And)
        .unwrap();
    assert_eq!(engine.active_count(), 2);

    // OR-ing a second category demotes the lone AND into a 2-element OR.
    engine
        .apply_selection(tags, "comedy", SelectionMode::Or)
        .unwrap();
    assert_eq!(engine.active_count(), 4);
    let state = engine.export_state(tags).unwrap();
    assert!(state.and.is_empty());
    assert_eq!(state.or, vec!["action", "comedy"]);

    // Clearing one OR leaves a singleton, which normalizes back to AND.
    engine
        .apply_selection(tags, "comedy", SelectionMode::Or)
        .unwrap();
    let state = engine.export_state(tags).unwrap();
    assert_eq!(state.and, vec!["action"]);
    assert!(state.or.is_empty());
    assert_eq!(engine.active_count(), 2);
}

#[test]
fn test_state_json_roundtrip_via_replay() {
    let (mut engine, tags, rating) = movie_engine();
    engine
        .apply_selection(tags, "thriller", SelectionMode::Or)
        .unwrap();
    engine
        .apply_selection(tags, "drama", SelectionMode::Or)
        .unwrap();
    engine
        .apply_selection(tags, "comedy", SelectionMode::Not)
        .unwrap();
    engine
        .apply_selection(rating, "PG", SelectionMode::Not)
        .unwrap();

    let active_before = engine.active_count();
    let json_tags = serde_json::to_string(&engine.export_state(tags).unwrap()).unwrap();
    let json_rating = serde_json::to_string(&engine.export_state(rating).unwrap()).unwrap();

    engine.clear_all_selections();
    assert_eq!(engine.active_count(), 6);

    let tags_state: FilterState = serde_json::from_str(&json_tags).unwrap();
    let rating_state: FilterState = serde_json::from_str(&json_rating).unwrap();
    engine.import_state(tags, &tags_state).unwrap();
    engine.import_state(rating, &rating_state).unwrap();

    assert_eq!(engine.active_count(), active_before);
    assert_eq!(engine.export_state(tags).unwrap(), tags_state);
    assert_eq!(engine.export_state(rating).unwrap(), rating_state);
}

#[test]
fn test_missing_state_roundtrip() {
    let mut engine = FacetEngine::new();
    let tags = engine.add_attribute("tags", true, 0).unwrap();
    engine.add_record(&[&["a"]]).unwrap();
    engine.add_record(&[&[]]).unwrap();
    engine.set_missing_filter(tags, MissingMode::Out).unwrap();
    assert_eq!(engine.active_count(), 1);

    let json = serde_json::to_string(&engine.export_state(tags).unwrap()).unwrap();
    assert_eq!(json, r#"{"missing":"out"}"#);

    engine.clear_all_selections();
    let state: FilterState = serde_json::from_str(&json).unwrap();
    engine.import_state(tags, &state).unwrap();
    assert_eq!(engine.active_count(), 1);
    assert!(engine.is_included(0).unwrap());
    assert!(!engine.is_included(1).unwrap());
}

#[test]
fn test_sorted_categories_reflect_active_filtering() {
    let (mut engine, tags, _) = movie_engine();
    let spec = SortSpec {
        by: CatSortBy::Active,
        channel: Channel::Active,
        inverse: false,
    };

    // Unfiltered: drama (3) leads, then action/comedy/thriller (2 each)
    // alphabetically.
    let order = engine.sorted_categories(tags, &spec).unwrap();
    let labels: Vec<&str> = order
        .iter()
        .map(|&c| engine.attribute(tags).unwrap().arena.get(c).label())
        .collect();
    assert_eq!(labels, vec!["drama", "action", "comedy", "thriller"]);

    // Filtering shifts Active measures and with them the order; the
    // selected category leads regardless of measure.
    engine
        .apply_selection(tags, "thriller", SelectionMode::And)
        .unwrap();
    let order = engine.sorted_categories(tags, &spec).unwrap();
    let labels: Vec<&str> = order
        .iter()
        .map(|&c| engine.attribute(tags).unwrap().arena.get(c).label())
        .collect();
    assert_eq!(labels[0], "thriller");
}

#[test]
fn test_perceptual_order_end_to_end() {
    let (mut engine, tags, rating) = movie_engine();
    let trees = engine
        .recompute_perceptual_order(tags, Channel::Active)
        .unwrap();
    assert!(trees >= 1);

    // Every non-removed category got a distinct order in 0..n.
    let arena = &engine.attribute(tags).unwrap().arena;
    let mut orders: Vec<u32> = arena.iter().map(|c| c.order).collect();
    orders.sort_unstable();
    assert_eq!(orders, (0..arena.len() as u32).collect::<Vec<_>>());
    assert!(orders.iter().all(|&o| o != INVALID_ORDER));

    // Single-valued attributes have no co-occurrence structure to order.
    assert!(matches!(
        engine.recompute_perceptual_order(rating, Channel::Active),
        Err(FacetError::InvalidArgument(_))
    ));
}
