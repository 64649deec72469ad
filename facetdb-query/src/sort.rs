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

//! Category Sort Engine
//!
//! Produces a total order over one attribute's categories.
//!
//! | Key           | Primary ordering                                       |
//! |---------------|--------------------------------------------------------|
//! | `Active`      | selected first, removed last, channel measure desc,    |
//! |               | Total desc                                             |
//! | `Alphanumeric`| label, natural                                         |
//! | `Id`          | id, natural                                            |
//! | `Fixed`       | stored label permutation (unseen labels rank last)     |
//! | `Custom`      | caller-provided numeric key, ascending                 |
//! | `Relatedness` | seriation `order` (see facetdb-index)                  |
//!
//! Every comparator finishes with a natural label tie-break (digit runs
//! compare numerically, not lexicographically), so output is byte-identical
//! run-to-run. The inversion flag reverses the final sequence without
//! re-running the comparator.

use std::cmp::Ordering;
use std::collections::HashMap;

use facetdb_core::{CatIdx, CategoryAggregate, CategoryArena, Channel};

/// Sort key variants.
#[derive(Debug, Clone)]
pub enum CatSortBy {
    /// Dynamic, value-based: measure on the highlighted channel.
    Active,
    /// By display label.
    Alphanumeric,
    /// By category id.
    Id,
    /// Stored permutation of labels used as a lookup rank.
    Fixed(Vec<String>),
    /// Caller-provided numeric key, ascending.
    Custom(fn(&CategoryAggregate) -> f64),
    /// Seriation output (`order` field).
    Relatedness,
}

/// Full sort specification. `channel` feeds the `Active` comparator; the
/// comparison channel is an explicit parameter, never ambient state.
#[derive(Debug, Clone)]
pub struct SortSpec {
    pub by: CatSortBy,
    pub channel: Channel,
    pub inverse: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            by: CatSortBy::Active,
            channel: Channel::Active,
            inverse: false,
        }
    }
}

/// Sort an attribute's categories. Pure: does not touch `order_index`.
pub fn sort_categories(arena: &CategoryArena, spec: &SortSpec) -> Vec<CatIdx> {
    // Fixed ranks resolved once up front.
    let ranks: Option<HashMap<&str, usize>> = match &spec.by {
        CatSortBy::Fixed(labels) => Some(
            labels
                .iter()
                .enumerate()
                .map(|(i, l)| (l.as_str(), i))
                .collect(),
        ),
        _ => None,
    };

    let mut idxs: Vec<CatIdx> = arena.indices().collect();
    idxs.sort_by(|&x, &y| compare(arena, spec, ranks.as_ref(), x, y));
    if spec.inverse {
        idxs.reverse();
    }
    idxs
}

/// Sort and write the resulting display positions back into `order_index`
/// (removed categories keep their cleared position).
pub fn resort(arena: &mut CategoryArena, spec: &SortSpec) -> Vec<CatIdx> {
    let sorted = sort_categories(arena, spec);
    let mut pos: u32 = 0;
    for &cat in &sorted {
        if !arena.get(cat).is_removed() {
            arena.get_mut(cat).order_index = pos;
            pos += 1;
        }
    }
    sorted
}

fn compare(
    arena: &CategoryArena,
    spec: &SortSpec,
    ranks: Option<&HashMap<&str, usize>>,
    x: CatIdx,
    y: CatIdx,
) -> Ordering {
    let a = arena.get(x);
    let b = arena.get(y);
    let primary = match &spec.by {
        CatSortBy::Active => {
            // Selected categories first, removed/inactive always last,
            // then highlighted-channel measure desc, Total desc.
            b.is_selected()
                .cmp(&a.is_selected())
                .then(a.is_removed().cmp(&b.is_removed()))
                .then(
                    b.measures()
                        .sum(spec.channel)
                        .total_cmp(&a.measures().sum(spec.channel)),
                )
                .then(
                    b.measures()
                        .sum(Channel::Total)
                        .total_cmp(&a.measures().sum(Channel::Total)),
                )
        }
        CatSortBy::Alphanumeric => Ordering::Equal,
        CatSortBy::Id => natural_cmp(a.id(), b.id()),
        CatSortBy::Fixed(_) => {
            let ranks = ranks.expect("fixed ranks resolved above");
            let ra = ranks.get(a.label()).copied().unwrap_or(usize::MAX);
            let rb = ranks.get(b.label()).copied().unwrap_or(usize::MAX);
            ra.cmp(&rb)
        }
        CatSortBy::Custom(key) => key(a).total_cmp(&key(b)),
        CatSortBy::Relatedness => a.order.cmp(&b.order),
    };
    primary.then_with(|| natural_cmp(a.label(), b.label()))
}

/// Natural string ordering: runs of ASCII digits compare as numbers, other
/// characters compare case-insensitively, with a full byte-wise compare as
/// the final determinism anchor.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let ab = a.as_bytes();
    let bb = b.as_bytes();
    let (mut i, mut j) = (0usize, 0usize);
    while i < ab.len() && j < bb.len() {
        if ab[i].is_ascii_digit() && bb[j].is_ascii_digit() {
            let si = i;
            while i < ab.len() && ab[i].is_ascii_digit() {
                i += 1;
            }
            let sj = j;
            while j < bb.len() && bb[j].is_ascii_digit() {
                j += 1;
            }
            let ra = a[si..i].trim_start_matches('0');
            let rb = b[sj..j].trim_start_matches('0');
            // More significant digits = bigger number; equal lengths fall
            // back to digit-wise comparison.
            let ord = ra.len().cmp(&rb.len()).then_with(|| ra.cmp(rb));
            if ord != Ordering::Equal {
                return ord;
            }
            // Same numeric value: fewer leading zeros sorts first.
            let ord = (i - si).cmp(&(j - sj));
            if ord != Ordering::Equal {
                return ord;
            }
        } else {
            let ca = ab[i].to_ascii_lowercase();
            let cb = bb[j].to_ascii_lowercase();
            if ca != cb {
                return ca.cmp(&cb);
            }
            i += 1;
            j += 1;
        }
    }
    (ab.len() - i)
        .cmp(&(bb.len() - j))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use facetdb_core::SelectionMode;

    fn arena_with_counts(counts: &[(&str, u32)]) -> CategoryArena {
        let mut arena = CategoryArena::new();
        for (id, n) in counts {
            let cat = arena.intern(id);
            for _ in 0..*n {
                arena.get_mut(cat).measures_mut().add(Channel::Total, 1.0);
                arena.get_mut(cat).measures_mut().add(Channel::Active, 1.0);
            }
        }
        arena
    }

    fn labels(arena: &CategoryArena, order: &[CatIdx]) -> Vec<String> {
        order
            .iter()
            .map(|&c| arena.get(c).label().to_string())
            .collect()
    }

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("a2", "a10"), Ordering::Less);
        assert_eq!(natural_cmp("file9", "file10"), Ordering::Less);
        assert_eq!(natural_cmp("file10", "file10"), Ordering::Equal);
        assert_eq!(natural_cmp("2020", "199"), Ordering::Greater);
        assert_eq!(natural_cmp("alpha", "Beta"), Ordering::Less);
        // Same numeric value, fewer leading zeros first.
        assert_eq!(natural_cmp("a07", "a7"), Ordering::Greater);
        // Prefix sorts before its extension.
        assert_eq!(natural_cmp("ab", "abc"), Ordering::Less);
    }

    #[test]
    fn test_active_sort_descending_with_label_ties() {
        let arena = arena_with_counts(&[("b", 2), ("a", 2), ("c", 5)]);
        let spec = SortSpec::default();
        let sorted = sort_categories(&arena, &spec);
        assert_eq!(labels(&arena, &sorted), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_selected_sort_first() {
        let mut arena = arena_with_counts(&[("a", 1), ("b", 5)]);
        let a = arena.lookup("a").unwrap();
        let mut lists = facetdb_core::SelectionLists::new();
        lists.set_mode(&mut arena, a, SelectionMode::And);

        let sorted = sort_categories(&arena, &SortSpec::default());
        assert_eq!(labels(&arena, &sorted), vec!["a", "b"]);
    }

    #[test]
    fn test_removed_sort_last() {
        let mut arena = arena_with_counts(&[("a", 1), ("b", 5)]);
        let b = arena.lookup("b").unwrap();
        arena.get_mut(b).set_removed(true);

        let sorted = sort_categories(&arena, &SortSpec::default());
        assert_eq!(labels(&arena, &sorted), vec!["a", "b"]);
    }

    #[test]
    fn test_sort_is_stable_across_reruns_and_double_inversion() {
        let arena = arena_with_counts(&[("x1", 3), ("x2", 3), ("y", 1), ("z", 3)]);
        let spec = SortSpec::default();
        let first = sort_categories(&arena, &spec);
        let second = sort_categories(&arena, &spec);
        assert_eq!(first, second);

        let inverted = sort_categories(
            &arena,
            &SortSpec {
                inverse: true,
                ..SortSpec::default()
            },
        );
        let mut back = inverted.clone();
        back.reverse();
        assert_eq!(first, back);
    }

    #[test]
    fn test_fixed_order_unseen_last() {
        let arena = arena_with_counts(&[("small", 9), ("medium", 1), ("large", 4), ("odd", 2)]);
        let spec = SortSpec {
            by: CatSortBy::Fixed(vec![
                "small".to_string(),
                "medium".to_string(),
                "large".to_string(),
            ]),
            channel: Channel::Active,
            inverse: false,
        };
        let sorted = sort_categories(&arena, &spec);
        assert_eq!(labels(&arena, &sorted), vec!["small", "medium", "large", "odd"]);
    }

    #[test]
    fn test_alphanumeric_natural() {
        let arena = arena_with_counts(&[("track10", 1), ("track2", 1), ("intro", 1)]);
        let spec = SortSpec {
            by: CatSortBy::Alphanumeric,
            channel: Channel::Active,
            inverse: false,
        };
        let sorted = sort_categories(&arena, &spec);
        assert_eq!(labels(&arena, &sorted), vec!["intro", "track2", "track10"]);
    }

    #[test]
    fn test_custom_key() {
        let arena = arena_with_counts(&[("a", 3), ("b", 1), ("c", 2)]);
        let spec = SortSpec {
            by: CatSortBy::Custom(|c| c.measures().sum(Channel::Total)),
            channel: Channel::Active,
            inverse: false,
        };
        let sorted = sort_categories(&arena, &spec);
        assert_eq!(labels(&arena, &sorted), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_relatedness_uses_order_field() {
        let mut arena = arena_with_counts(&[("a", 1), ("b", 1), ("c", 1)]);
        for (id, ord) in [("a", 2u32), ("b", 0), ("c", 1)] {
            let cat = arena.lookup(id).unwrap();
            arena.get_mut(cat).order = ord;
        }
        let spec = SortSpec {
            by: CatSortBy::Relatedness,
            channel: Channel::Active,
            inverse: false,
        };
        let sorted = sort_categories(&arena, &spec);
        assert_eq!(labels(&arena, &sorted), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_resort_assigns_order_index() {
        let mut arena = arena_with_counts(&[("a", 1), ("b", 5), ("c", 3)]);
        resort(&mut arena, &SortSpec::default());
        let pos = |id: &str| arena.get(arena.lookup(id).unwrap()).order_index;
        assert_eq!(pos("b"), 0);
        assert_eq!(pos("c"), 1);
        assert_eq!(pos("a"), 2);
    }
}
