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

//! Category Aggregates & Selection State Machine
//!
//! One `CategoryAggregate` per distinct value of a categorical attribute,
//! stored in a flat `CategoryArena` and addressed by `CatIdx`. The aggregate
//! carries:
//!
//! - per-channel measures (see `channel`),
//! - a selection mode in {None, And, Or, Not},
//! - display bookkeeping (`label`, `order_index`, seriation `order`).
//!
//! ## Mode/list invariant
//!
//! A category belongs to at most one of the three selection lists (AND, OR,
//! NOT) at any time, and its `mode` flag always names that list. The only
//! way to move a category between lists is `SelectionLists::set_mode`, which
//! updates list membership and the flag in the same call. Direct field
//! writes are not exposed; a disagreement between flag and lists is a bug in
//! the orchestrator and trips a `debug_assert!`.

use std::collections::HashMap;

use crate::channel::MeasureSet;

/// Arena index of a category aggregate within its attribute.
pub type CatIdx = u32;

/// Sentinel for "no display position assigned" (removed categories).
pub const INVALID_ORDER: u32 = u32::MAX;

/// Which selection list (if any) a category currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectionMode {
    #[default]
    None,
    And,
    Or,
    Not,
}

impl SelectionMode {
    /// True for And/Or/Not.
    pub fn is_selected(self) -> bool {
        self != SelectionMode::None
    }
}

// ============================================================================
// CategoryAggregate
// ============================================================================

/// One categorical value of one attribute.
#[derive(Debug, Clone)]
pub struct CategoryAggregate {
    id: String,
    label: String,
    /// Display row position, assigned by the sort engine. `INVALID_ORDER`
    /// until the first sort or after removal.
    pub order_index: u32,
    /// Seriation output (perceptual order). Transient: overwritten by every
    /// `recompute_perceptual_order` pass.
    pub order: u32,
    measures: MeasureSet,
    mode: SelectionMode,
    removed: bool,
}

impl CategoryAggregate {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            label: id.to_string(),
            order_index: INVALID_ORDER,
            order: 0,
            measures: MeasureSet::new(),
            mode: SelectionMode::None,
            removed: false,
        }
    }

    /// Stable identity, unique within the attribute.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display label; defaults to the id.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn measures(&self) -> &MeasureSet {
        &self.measures
    }

    pub fn measures_mut(&mut self) -> &mut MeasureSet {
        &mut self.measures
    }

    /// Current selection mode. Mutated only through
    /// `SelectionLists::set_mode`.
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn is_selected(&self) -> bool {
        self.mode.is_selected()
    }

    /// Unused flag: membership fell below the attribute's minimum-size
    /// threshold. The aggregate is never destroyed, only parked.
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Park or revive the aggregate. Parking requires the selection mode to
    /// have been cleared first (through the state machine).
    pub fn set_removed(&mut self, removed: bool) {
        if removed {
            debug_assert_eq!(
                self.mode,
                SelectionMode::None,
                "clear selection before removal"
            );
            self.order_index = INVALID_ORDER;
        }
        self.removed = removed;
    }
}

// ============================================================================
// CategoryArena
// ============================================================================

/// Flat arena of category aggregates plus an id -> index map.
///
/// Aggregates are created lazily the first time a record maps to a value
/// (`intern`) and never destroyed. Lookups of unknown ids return `None`;
/// nothing is silently created outside ingestion.
#[derive(Debug, Default)]
pub struct CategoryArena {
    cats: Vec<CategoryAggregate>,
    by_id: HashMap<String, CatIdx>,
}

impl CategoryArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create by id. Ingestion entry point only.
    pub fn intern(&mut self, id: &str) -> CatIdx {
        if let Some(&idx) = self.by_id.get(id) {
            return idx;
        }
        let idx = self.cats.len() as CatIdx;
        self.cats.push(CategoryAggregate::new(id));
        self.by_id.insert(id.to_string(), idx);
        idx
    }

    /// Lookup by id without creating.
    pub fn lookup(&self, id: &str) -> Option<CatIdx> {
        self.by_id.get(id).copied()
    }

    pub fn get(&self, idx: CatIdx) -> &CategoryAggregate {
        &self.cats[idx as usize]
    }

    pub fn get_mut(&mut self, idx: CatIdx) -> &mut CategoryAggregate {
        &mut self.cats[idx as usize]
    }

    pub fn len(&self) -> usize {
        self.cats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cats.is_empty()
    }

    /// All arena indices, creation order.
    pub fn indices(&self) -> impl Iterator<Item = CatIdx> {
        0..self.cats.len() as CatIdx
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryAggregate> {
        self.cats.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CategoryAggregate> {
        self.cats.iter_mut()
    }
}

// ============================================================================
// SelectionLists - the state machine
// ============================================================================

/// The three selection lists of one categorical filter.
///
/// Insertion order is preserved (it matters for display, not semantics).
/// All transitions go through `set_mode`, which keeps list membership and
/// each aggregate's mode flag in agreement atomically.
#[derive(Debug, Clone, Default)]
pub struct SelectionLists {
    and_list: Vec<CatIdx>,
    or_list: Vec<CatIdx>,
    not_list: Vec<CatIdx>,
}

impl SelectionLists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(&self) -> &[CatIdx] {
        &self.and_list
    }

    pub fn or(&self) -> &[CatIdx] {
        &self.or_list
    }

    pub fn not(&self) -> &[CatIdx] {
        &self.not_list
    }

    /// No category selected in any mode.
    pub fn is_empty(&self) -> bool {
        self.and_list.is_empty() && self.or_list.is_empty() && self.not_list.is_empty()
    }

    pub fn selected_count(&self) -> usize {
        self.and_list.len() + self.or_list.len() + self.not_list.len()
    }

    /// Move `cat` into the list named by `mode` (or out of all lists for
    /// `None`). Same-mode calls are no-ops. List membership and the
    /// aggregate's mode flag change in this one call.
    pub fn set_mode(&mut self, arena: &mut CategoryArena, cat: CatIdx, mode: SelectionMode) {
        let current = arena.get(cat).mode();
        if current == mode {
            return;
        }
        if let Some(list) = self.list_mut(current) {
            list.retain(|&c| c != cat);
        }
        if let Some(list) = self.list_mut(mode) {
            list.push(cat);
        }
        arena.get_mut(cat).mode = mode;
        self.debug_validate(arena);
    }

    /// Clear every selection back to `None`.
    pub fn clear(&mut self, arena: &mut CategoryArena) {
        for cat in self
            .and_list
            .drain(..)
            .chain(self.or_list.drain(..))
            .chain(self.not_list.drain(..))
        {
            arena.get_mut(cat).mode = SelectionMode::None;
        }
    }

    fn list_mut(&mut self, mode: SelectionMode) -> Option<&mut Vec<CatIdx>> {
        match mode {
            SelectionMode::None => None,
            SelectionMode::And => Some(&mut self.and_list),
            SelectionMode::Or => Some(&mut self.or_list),
            SelectionMode::Not => Some(&mut self.not_list),
        }
    }

    /// Mode/list agreement check; compiled out of release builds.
    pub fn debug_validate(&self, arena: &CategoryArena) {
        #[cfg(debug_assertions)]
        {
            for (list_mode, list) in [
                (SelectionMode::And, &self.and_list),
                (SelectionMode::Or, &self.or_list),
                (SelectionMode::Not, &self.not_list),
            ] {
                for &cat in list {
                    debug_assert_eq!(
                        arena.get(cat).mode(),
                        list_mode,
                        "category {} mode disagrees with list membership",
                        arena.get(cat).id()
                    );
                }
            }
        }
        let _ = arena;
    }
}
