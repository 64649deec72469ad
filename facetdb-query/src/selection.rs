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

//! Selection Orchestration
//!
//! AND/OR/NOT are attribute-global concepts, but a user acts on one category
//! at a time. `FacetAttribute::apply_selection` translates a single request
//! "apply {mode} to category C" into a consistent filter state. Rules, in
//! order:
//!
//! 1. **Toggle-off** - requesting a category's current mode clears it;
//! 2. **OR / AND-or-NOT mixing** - supported but not incrementally
//!    reasoned about; the filter is marked dirty and the next pass replays;
//! 3. **NONE cascade** - if exactly one OR survives and no ANDs exist, the
//!    lone OR is promoted to AND (a one-element OR set is logically an AND
//!    and must be normalized for single-select behavior);
//! 4. **NOT guard** - refused when it would empty the active result set;
//!    user-correctable rejection, state untouched;
//! 5. **AND** - unconditional move into the AND list;
//! 6. **OR** - on single-valued attributes a lone NOT is cleared first
//!    (excluded-and-any-of is unsatisfiable there); a lone AND with no ORs
//!    is demoted to OR so "AND single + OR another" becomes a 2-element OR
//!    set. The single-valued-only NOT demotion is intentional UX asymmetry,
//!    not an oversight.
//!
//! A transition that leaves the combinator vacuously true deactivates the
//! whole filter rather than leaving it evaluating to true for every record.

use facetdb_core::{CatIdx, CategoryArena, Channel, FacetError, FacetResult, SelectionMode};
use facetdb_index::SetPairIndex;

use crate::combinator::{CategoricalFilter, MissingMode};

/// One categorical attribute: its category arena, filter state, and (for
/// multi-valued attributes) the co-occurrence index.
#[derive(Debug)]
pub struct FacetAttribute {
    name: String,
    multi_valued: bool,
    /// Categories whose Total membership stays below this are parked as
    /// removed. 0 disables the threshold.
    min_size: u32,
    pub arena: CategoryArena,
    pub filter: CategoricalFilter,
    pub set_pairs: Option<SetPairIndex>,
}

impl FacetAttribute {
    pub fn new(name: &str, multi_valued: bool, min_size: u32, filter_id: usize) -> Self {
        Self {
            name: name.to_string(),
            multi_valued,
            min_size,
            arena: CategoryArena::new(),
            filter: CategoricalFilter::new(filter_id),
            set_pairs: multi_valued.then(SetPairIndex::new),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn multi_valued(&self) -> bool {
        self.multi_valued
    }

    /// Resolve a selection request into a consistent filter state.
    ///
    /// `active_total` is the engine-wide count of currently included
    /// records, used by the NOT guard. On `Err` the filter state is exactly
    /// as it was.
    pub fn apply_selection(
        &mut self,
        cat: CatIdx,
        requested: SelectionMode,
        active_total: u32,
    ) -> FacetResult<()> {
        let current = self.arena.get(cat).mode();
        let mut mode = requested;

        // Rule 1: toggle-off.
        if mode != SelectionMode::None && current == mode {
            mode = SelectionMode::None;
        }

        match mode {
            SelectionMode::None => {
                self.filter
                    .lists
                    .set_mode(&mut self.arena, cat, SelectionMode::None);
                // Rule 3: a lone surviving OR with no ANDs promotes to AND.
                // Fires only when a selection was actually cleared; a NONE
                // request on an unselected category must not reshape the
                // filter.
                if current != SelectionMode::None
                    && self.filter.lists.or().len() == 1
                    && self.filter.lists.and().is_empty()
                {
                    let lone = self.filter.lists.or()[0];
                    self.filter
                        .lists
                        .set_mode(&mut self.arena, lone, SelectionMode::And);
                }
            }
            SelectionMode::Not => {
                // Rule 4: refuse a NOT that would empty the working set.
                let cat_active = self.arena.get(cat).measures().count(Channel::Active);
                if active_total > 0 && cat_active >= active_total {
                    let label = self.arena.get(cat).label().to_string();
                    tracing::warn!(
                        attribute = %self.name,
                        category = %label,
                        "NOT selection rejected: would empty the result set"
                    );
                    return Err(FacetError::rejected(format!(
                        "excluding '{label}' would leave no records"
                    )));
                }
                self.filter
                    .lists
                    .set_mode(&mut self.arena, cat, SelectionMode::Not);
            }
            SelectionMode::And => {
                // Rule 5: unconditional; demotes out of NOT/OR via the
                // state machine.
                self.filter
                    .lists
                    .set_mode(&mut self.arena, cat, SelectionMode::And);
            }
            SelectionMode::Or => {
                // Rule 6a: single-valued attribute with exactly one NOT -
                // clear it, excluded-plus-any-of is unsatisfiable there.
                if !self.multi_valued && self.filter.lists.not().len() == 1 {
                    let lone_not = self.filter.lists.not()[0];
                    self.filter
                        .lists
                        .set_mode(&mut self.arena, lone_not, SelectionMode::None);
                }
                // Rule 6b: a lone AND with no ORs demotes to OR first.
                if self.filter.lists.and().len() == 1 && self.filter.lists.or().is_empty() {
                    let lone_and = self.filter.lists.and()[0];
                    self.filter
                        .lists
                        .set_mode(&mut self.arena, lone_and, SelectionMode::Or);
                }
                self.filter
                    .lists
                    .set_mode(&mut self.arena, cat, SelectionMode::Or);
            }
        }

        // Rule 2: OR coexisting with AND-or-NOT changed the combinator's
        // shape; the next pass must reset-then-replay.
        if !self.filter.lists.or().is_empty()
            && (!self.filter.lists.and().is_empty() || !self.filter.lists.not().is_empty())
        {
            self.filter.mark_dirty();
        }

        // Vacuously-true combinators are deactivated outright.
        self.filter.set_active(!self.filter.is_empty());
        Ok(())
    }

    /// Clear every selection and the missing-value filter.
    pub fn clear_selections(&mut self) {
        self.filter.lists.clear(&mut self.arena);
        self.filter.set_missing(MissingMode::NotFiltered);
        self.filter.set_active(false);
        self.filter.mark_dirty();
    }

    /// Apply the minimum-size threshold: park categories whose Total
    /// membership fell below it (clearing their selection through the state
    /// machine first), revive those that grew back.
    pub fn retire_small(&mut self) {
        if self.min_size == 0 {
            return;
        }
        for cat in self.arena.indices().collect::<Vec<_>>() {
            let total = self.arena.get(cat).measures().count(Channel::Total);
            if total < self.min_size {
                if self.arena.get(cat).is_selected() {
                    self.filter
                        .lists
                        .set_mode(&mut self.arena, cat, SelectionMode::None);
                    self.filter.set_active(!self.filter.is_empty());
                    self.filter.mark_dirty();
                }
                if !self.arena.get(cat).is_removed() {
                    self.arena.get_mut(cat).set_removed(true);
                }
            } else if self.arena.get(cat).is_removed() {
                self.arena.get_mut(cat).set_removed(false);
            }
        }
    }
}
