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

//! Categorical Filter Combinator
//!
//! One `CategoricalFilter` per categorical attribute: the three selection
//! lists, the tri-state missing-value filter, and the filter-cache slot id.
//! `evaluate` is the single source of truth for whether a record passes the
//! attribute's selections.
//!
//! ## Evaluation order (load-bearing)
//!
//! 1. missing-mode `In`: pass iff the record has no values - nothing else
//!    is consulted;
//! 2. record has no values: fail under missing-mode `Out`, otherwise pass
//!    iff no AND and no OR selections exist;
//! 3. NOT is a hard veto: any NOT-selected value fails the record;
//! 4. AND requires full coverage: the number of the record's AND-selected
//!    values must equal the AND-list length, so a multi-valued record
//!    satisfies "AND x,y" only if it carries both;
//! 5. OR is an any-match, evaluated last so AND+OR combinations (which the
//!    orchestrator normally prevents) still degrade predictably;
//! 6. otherwise pass (pure NOT filtering that did not veto).

use facetdb_core::{CatIdx, CategoryArena, FilterId, SelectionLists, SelectionMode};

/// Tri-state missing-value filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingMode {
    /// Missing values are not filtered on.
    #[default]
    NotFiltered,
    /// Keep only records with no value for the attribute.
    In,
    /// Drop records with no value for the attribute.
    Out,
}

/// Selection state and combinator for one categorical attribute.
#[derive(Debug)]
pub struct CategoricalFilter {
    filter_id: FilterId,
    pub lists: SelectionLists,
    missing: MissingMode,
    active: bool,
    dirty: bool,
}

impl CategoricalFilter {
    pub fn new(filter_id: FilterId) -> Self {
        Self {
            filter_id,
            lists: SelectionLists::new(),
            missing: MissingMode::NotFiltered,
            active: false,
            dirty: false,
        }
    }

    /// Cache slot this filter writes.
    pub fn filter_id(&self) -> FilterId {
        self.filter_id
    }

    pub fn missing(&self) -> MissingMode {
        self.missing
    }

    pub fn set_missing(&mut self, mode: MissingMode) {
        self.missing = mode;
    }

    /// Vacuously-true state: nothing selected, missing unset. The engine
    /// deactivates such a filter instead of evaluating it.
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty() && self.missing == MissingMode::NotFiltered
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Orchestrator marked the last transition as not incrementally
    /// reasoned about; the next pass must reset-then-replay.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Evaluate the combinator against one record's resolved values.
    ///
    /// Selection membership is read off the aggregates' mode flags, which
    /// the state machine keeps in lockstep with the lists.
    pub fn evaluate(&self, arena: &CategoryArena, values: &[CatIdx]) -> bool {
        if self.missing == MissingMode::In {
            return values.is_empty();
        }
        if values.is_empty() {
            if self.missing == MissingMode::Out {
                return false;
            }
            return self.lists.and().is_empty() && self.lists.or().is_empty();
        }

        let mode_of = |v: CatIdx| arena.get(v).mode();

        if !self.lists.not().is_empty() && values.iter().any(|&v| mode_of(v) == SelectionMode::Not)
        {
            return false;
        }
        if !self.lists.and().is_empty() {
            let covered = values
                .iter()
                .filter(|&&v| mode_of(v) == SelectionMode::And)
                .count();
            if covered != self.lists.and().len() {
                return false;
            }
        }
        if !self.lists.or().is_empty() {
            return values.iter().any(|&v| mode_of(v) == SelectionMode::Or);
        }
        true
    }
}
