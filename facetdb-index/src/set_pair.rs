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

//! Set-Pair (Co-occurrence) Index
//!
//! For a multi-valued categorical attribute, one `SetPairAggregate` per
//! unordered pair of categories that at least one record carries together.
//! Pairs are keyed canonically (lexicographically smaller category id
//! first), so `(a, b)` and `(b, a)` resolve to the same aggregate no matter
//! which side is queried first.
//!
//! ## Maintenance
//!
//! | Event                  | Update                                        |
//! |------------------------|-----------------------------------------------|
//! | Ingestion              | lazily create pair, bump `Total` (+`Active`)  |
//! | Active set changed     | `clear_channel(Active)` then replay, or ±1    |
//! | Compare set assigned   | `clear_channel(ch)` then replay the subset    |
//!
//! ## Similarity
//!
//! `similarity = coOcc(ch) / min(size(a, ch), size(b, ch))`, defined as 0
//! when the co-occurrence is 0 so disjoint pairs rank as maximally
//! dissimilar and the division never sees a zero denominator.

use std::collections::HashMap;

use facetdb_core::{CatIdx, CategoryArena, Channel, MeasureSet};

/// Index of a set-pair aggregate within its attribute's index.
pub type PairIdx = u32;

/// Aggregate over records sharing two specific category values.
#[derive(Debug, Clone)]
pub struct SetPairAggregate {
    a: CatIdx,
    b: CatIdx,
    measures: MeasureSet,
    /// Neighbor-divergence distance, written during seriation only.
    pub distance: f64,
}

impl SetPairAggregate {
    fn new(a: CatIdx, b: CatIdx) -> Self {
        Self {
            a,
            b,
            measures: MeasureSet::new(),
            distance: 0.0,
        }
    }

    /// Canonical endpoints (smaller category id first).
    pub fn endpoints(&self) -> (CatIdx, CatIdx) {
        (self.a, self.b)
    }

    /// The endpoint that is not `cat`.
    pub fn other(&self, cat: CatIdx) -> CatIdx {
        debug_assert!(cat == self.a || cat == self.b);
        if cat == self.a {
            self.b
        } else {
            self.a
        }
    }

    pub fn measures(&self) -> &MeasureSet {
        &self.measures
    }

    /// Co-occurrence record count on a channel.
    pub fn co_occurrence(&self, channel: Channel) -> u32 {
        self.measures.count(channel)
    }
}

/// Co-occurrence index for one multi-valued categorical attribute.
#[derive(Debug, Default)]
pub struct SetPairIndex {
    pairs: Vec<SetPairAggregate>,
    by_key: HashMap<(CatIdx, CatIdx), PairIdx>,
    /// Incident pair ids per category (grown on demand).
    adjacency: Vec<Vec<PairIdx>>,
}

impl SetPairIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, idx: PairIdx) -> &SetPairAggregate {
        &self.pairs[idx as usize]
    }

    pub fn get_mut(&mut self, idx: PairIdx) -> &mut SetPairAggregate {
        &mut self.pairs[idx as usize]
    }

    /// Canonical key: the category with the lexicographically smaller id
    /// comes first.
    fn canonical(arena: &CategoryArena, x: CatIdx, y: CatIdx) -> (CatIdx, CatIdx) {
        debug_assert_ne!(x, y, "set pair endpoints must be distinct");
        if arena.get(x).id() <= arena.get(y).id() {
            (x, y)
        } else {
            (y, x)
        }
    }

    /// Lookup without creating. `None` means the pair never co-occurred in
    /// any ingested record.
    pub fn lookup(&self, arena: &CategoryArena, x: CatIdx, y: CatIdx) -> Option<PairIdx> {
        self.by_key.get(&Self::canonical(arena, x, y)).copied()
    }

    /// Pair ids incident to a category.
    pub fn pairs_of(&self, cat: CatIdx) -> &[PairIdx] {
        self.adjacency
            .get(cat as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn intern(&mut self, arena: &CategoryArena, x: CatIdx, y: CatIdx) -> PairIdx {
        let key = Self::canonical(arena, x, y);
        if let Some(&idx) = self.by_key.get(&key) {
            return idx;
        }
        let idx = self.pairs.len() as PairIdx;
        self.pairs.push(SetPairAggregate::new(key.0, key.1));
        self.by_key.insert(key, idx);
        for cat in [key.0, key.1] {
            let slot = cat as usize;
            if self.adjacency.len() <= slot {
                self.adjacency.resize_with(slot + 1, Vec::new);
            }
            self.adjacency[slot].push(idx);
        }
        idx
    }

    /// Visit every unordered pair of a record's distinct values once and
    /// bump the channel. Pairs are created lazily (ingestion / replay entry
    /// point).
    pub fn add_record(
        &mut self,
        arena: &CategoryArena,
        values: &[CatIdx],
        channel: Channel,
        weight: f64,
    ) {
        for i in 0..values.len() {
            for j in (i + 1)..values.len() {
                let idx = self.intern(arena, values[i], values[j]);
                self.pairs[idx as usize].measures.add(channel, weight);
            }
        }
    }

    /// Differential counterpart of `add_record`. All pairs must already
    /// exist (ingestion created them when the record arrived).
    pub fn sub_record(
        &mut self,
        arena: &CategoryArena,
        values: &[CatIdx],
        channel: Channel,
        weight: f64,
    ) {
        for i in 0..values.len() {
            for j in (i + 1)..values.len() {
                let idx = self
                    .lookup(arena, values[i], values[j])
                    .expect("set pair missing during differential update");
                self.pairs[idx as usize].measures.sub(channel, weight);
            }
        }
    }

    /// Zero one channel across every pair (reset-then-replay).
    pub fn clear_channel(&mut self, channel: Channel) {
        for pair in &mut self.pairs {
            pair.measures.clear(channel);
        }
    }

    /// Similarity score of a pair on a channel, given the endpoint category
    /// sizes from the arena. 0 when the pair never co-occurs on the channel.
    pub fn similarity(&self, arena: &CategoryArena, idx: PairIdx, channel: Channel) -> f64 {
        let pair = &self.pairs[idx as usize];
        let co = pair.co_occurrence(channel);
        if co == 0 {
            return 0.0;
        }
        let (a, b) = pair.endpoints();
        let size_a = arena.get(a).measures().count(channel);
        let size_b = arena.get(b).measures().count(channel);
        let denom = size_a.min(size_b);
        if denom == 0 {
            // Co-occurrence exceeding an endpoint size would be a replay bug.
            debug_assert!(false, "co-occurrence without endpoint membership");
            return 0.0;
        }
        f64::from(co) / f64::from(denom)
    }

    pub fn stats(&self) -> SetPairIndexStats {
        SetPairIndexStats {
            pair_count: self.pairs.len(),
            active_pair_count: self
                .pairs
                .iter()
                .filter(|p| p.co_occurrence(Channel::Active) > 0)
                .count(),
            max_degree: self.adjacency.iter().map(Vec::len).max().unwrap_or(0),
        }
    }
}

/// Statistics for a set-pair index.
#[derive(Debug, Clone)]
pub struct SetPairIndexStats {
    pub pair_count: usize,
    pub active_pair_count: usize,
    pub max_degree: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena_with(ids: &[&str]) -> CategoryArena {
        let mut arena = CategoryArena::new();
        for id in ids {
            arena.intern(id);
        }
        arena
    }

    #[test]
    fn test_canonical_key_is_symmetric() {
        let arena = arena_with(&["b", "a"]);
        let b = arena.lookup("b").unwrap();
        let a = arena.lookup("a").unwrap();
        let mut idx = SetPairIndex::new();
        idx.add_record(&arena, &[b, a], Channel::Total, 1.0);

        let p1 = idx.lookup(&arena, a, b).unwrap();
        let p2 = idx.lookup(&arena, b, a).unwrap();
        assert_eq!(p1, p2);
        // Canonical order: "a" before "b".
        assert_eq!(idx.get(p1).endpoints(), (a, b));
    }

    #[test]
    fn test_each_unordered_pair_once_per_record() {
        let arena = arena_with(&["a", "b", "c"]);
        let v: Vec<CatIdx> = arena.indices().collect();
        let mut idx = SetPairIndex::new();
        idx.add_record(&arena, &v, Channel::Total, 1.0);

        // 3 values -> 3 unordered pairs, each counted exactly once.
        assert_eq!(idx.len(), 3);
        for p in 0..idx.len() as PairIdx {
            assert_eq!(idx.get(p).co_occurrence(Channel::Total), 1);
        }
    }

    #[test]
    fn test_adjacency_tracks_incident_pairs() {
        let arena = arena_with(&["a", "b", "c"]);
        let v: Vec<CatIdx> = arena.indices().collect();
        let mut idx = SetPairIndex::new();
        idx.add_record(&arena, &v, Channel::Total, 1.0);

        for &cat in &v {
            assert_eq!(idx.pairs_of(cat).len(), 2);
        }
        // A category the index never saw has no incident pairs.
        assert!(idx.pairs_of(99).is_empty());
    }

    #[test]
    fn test_add_sub_roundtrip() {
        let arena = arena_with(&["a", "b"]);
        let v: Vec<CatIdx> = arena.indices().collect();
        let mut idx = SetPairIndex::new();
        idx.add_record(&arena, &v, Channel::Total, 1.0);
        idx.add_record(&arena, &v, Channel::Active, 1.0);
        idx.sub_record(&arena, &v, Channel::Active, 1.0);

        let p = idx.lookup(&arena, v[0], v[1]).unwrap();
        assert_eq!(idx.get(p).co_occurrence(Channel::Total), 1);
        assert_eq!(idx.get(p).co_occurrence(Channel::Active), 0);
    }

    #[test]
    fn test_similarity_zero_guard() {
        let mut arena = arena_with(&["a", "b"]);
        let v: Vec<CatIdx> = arena.indices().collect();
        let mut idx = SetPairIndex::new();
        idx.add_record(&arena, &v, Channel::Total, 1.0);

        // No Active co-occurrence: similarity is 0, no division.
        let p = idx.lookup(&arena, v[0], v[1]).unwrap();
        assert_eq!(idx.similarity(&arena, p, Channel::Active), 0.0);

        // 1 shared active record, endpoint sizes 2 and 1 -> 1 / 1.
        idx.add_record(&arena, &v, Channel::Active, 1.0);
        arena.get_mut(v[0]).measures_mut().add(Channel::Active, 1.0);
        arena.get_mut(v[0]).measures_mut().add(Channel::Active, 1.0);
        arena.get_mut(v[1]).measures_mut().add(Channel::Active, 1.0);
        let sim = idx.similarity(&arena, p, Channel::Active);
        assert!((sim - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clear_channel() {
        let arena = arena_with(&["a", "b"]);
        let v: Vec<CatIdx> = arena.indices().collect();
        let mut idx = SetPairIndex::new();
        idx.add_record(&arena, &v, Channel::Total, 1.0);
        idx.add_record(&arena, &v, Channel::Active, 1.0);
        idx.clear_channel(Channel::Active);

        let p = idx.lookup(&arena, v[0], v[1]).unwrap();
        assert_eq!(idx.get(p).co_occurrence(Channel::Active), 0);
        assert_eq!(idx.get(p).co_occurrence(Channel::Total), 1);
    }
}
