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

//! Records & Filter Cache
//!
//! A record is one data row: per categorical attribute, the resolved set of
//! category arena indices it maps to (empty = missing value), plus one
//! boolean cache slot per registered filter.
//!
//! ## Inclusion invariant
//!
//! A record is **included** in the working set iff every registered filter's
//! slot is true - a plain AND across all filters, reduced by `is_included`.
//! Individual filters only ever write their own slot; the reduction is never
//! cached elsewhere, so it cannot go stale.
//!
//! Category values are immutable after ingestion. Slots default to `true`
//! when a filter registers, so an unconfigured filter is vacuously passing.

use smallvec::SmallVec;

use crate::aggregate::CatIdx;

/// Index of a record in the engine's record table.
pub type RecordIdx = u32;

/// Index of a categorical attribute in the engine's attribute table.
pub type AttrId = usize;

/// Identifier handed out per registered filter, monotonically increasing.
pub type FilterId = usize;

/// Hands out filter-cache slot ids. One per engine.
#[derive(Debug, Default)]
pub struct FilterRegistry {
    count: usize,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new filter and get its cache slot id.
    pub fn register(&mut self) -> FilterId {
        let id = self.count;
        self.count += 1;
        id
    }

    /// Number of registered filters (== required cache slots per record).
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// One data row.
#[derive(Debug, Clone)]
pub struct Record {
    /// Category indices per attribute; most records carry 1-4 values.
    values: Vec<SmallVec<[CatIdx; 4]>>,
    /// One pass/fail slot per registered filter.
    filter_cache: SmallVec<[bool; 8]>,
}

impl Record {
    /// New record with `attr_count` empty value sets and `filter_count`
    /// vacuously-true cache slots.
    pub fn new(attr_count: usize, filter_count: usize) -> Self {
        Self {
            values: vec![SmallVec::new(); attr_count],
            filter_cache: SmallVec::from_elem(true, filter_count),
        }
    }

    /// Resolved category indices for one attribute. Empty slice = missing.
    pub fn values(&self, attr: AttrId) -> &[CatIdx] {
        &self.values[attr]
    }

    /// True if the record has no value for the attribute.
    pub fn is_missing(&self, attr: AttrId) -> bool {
        self.values[attr].is_empty()
    }

    /// Ingestion-time write of an attribute's resolved, deduplicated values.
    pub fn set_values(&mut self, attr: AttrId, vals: SmallVec<[CatIdx; 4]>) {
        self.values[attr] = vals;
    }

    /// Grow the per-attribute value table when an attribute is added after
    /// this record was ingested.
    pub fn ensure_attrs(&mut self, attr_count: usize) {
        while self.values.len() < attr_count {
            self.values.push(SmallVec::new());
        }
    }

    /// Grow the filter cache when a filter registers after this record was
    /// ingested. New slots pass vacuously.
    pub fn ensure_slots(&mut self, filter_count: usize) {
        while self.filter_cache.len() < filter_count {
            self.filter_cache.push(true);
        }
    }

    /// Read one filter's cached verdict.
    pub fn passes(&self, filter: FilterId) -> bool {
        debug_assert!(filter < self.filter_cache.len(), "missing cache slot");
        self.filter_cache[filter]
    }

    /// Write one filter's verdict into its cache slot.
    pub fn set_pass(&mut self, filter: FilterId, pass: bool) {
        debug_assert!(filter < self.filter_cache.len(), "missing cache slot");
        self.filter_cache[filter] = pass;
    }

    /// The working-set reduction: AND across all filter slots.
    pub fn is_included(&self) -> bool {
        self.filter_cache.iter().all(|&b| b)
    }

    /// AND across all slots except one. Used by the differential refresh to
    /// decide whether flipping that one slot changes overall inclusion.
    pub fn passes_all_except(&self, filter: FilterId) -> bool {
        self.filter_cache
            .iter()
            .enumerate()
            .all(|(i, &b)| i == filter || b)
    }
}
