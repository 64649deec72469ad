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

//! FacetEngine - the facade the rendering/UI layer talks to
//!
//! Owns the record table, the filter registry and one `FacetAttribute` per
//! categorical attribute. Every mutation entry point runs its refresh
//! synchronously to completion:
//!
//! ```text
//! apply_selection ─► orchestrator ─► cache re-evaluation ─► measures
//!                                     (this filter only)     (differential,
//!                                                             or replay when
//!                                                             marked dirty)
//! ```
//!
//! The differential path re-evaluates the touched filter for every record
//! and adjusts Active measures only for records whose overall inclusion
//! flipped. The dirty path resets every Active measure (categories and set
//! pairs, all attributes) and replays the included records.
//!
//! A `ConcurrentFacetEngine` wrapper serializes whole passes behind a
//! `parking_lot::RwLock` for callers that need shared access; the core
//! itself stays single-threaded and synchronous.

use std::collections::HashMap;

use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::debug;

use facetdb_core::{
    AttrId, CatIdx, CategoryAggregate, Channel, FacetError, FacetResult, FilterRegistry, Record,
    RecordIdx, SelectionMode,
};
use facetdb_index::compute_perceptual_order;

use crate::combinator::MissingMode;
use crate::selection::FacetAttribute;
use crate::sort::{self, SortSpec};
use crate::state::FilterState;

// ============================================================================
// FacetEngine
// ============================================================================

#[derive(Default)]
pub struct FacetEngine {
    attributes: Vec<FacetAttribute>,
    attr_by_name: HashMap<String, AttrId>,
    records: Vec<Record>,
    registry: FilterRegistry,
    active_records: u32,
}

impl FacetEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------

    /// Register a categorical attribute. `min_size` of 0 disables the
    /// minimum-membership threshold. Records ingested earlier get an empty
    /// value set and a vacuously-passing cache slot for the new attribute.
    pub fn add_attribute(
        &mut self,
        name: &str,
        multi_valued: bool,
        min_size: u32,
    ) -> FacetResult<AttrId> {
        if self.attr_by_name.contains_key(name) {
            return Err(FacetError::InvalidArgument(format!(
                "attribute '{name}' already exists"
            )));
        }
        let filter_id = self.registry.register();
        let id = self.attributes.len();
        self.attributes
            .push(FacetAttribute::new(name, multi_valued, min_size, filter_id));
        self.attr_by_name.insert(name.to_string(), id);

        let attr_count = self.attributes.len();
        let slot_count = self.registry.len();
        for rec in &mut self.records {
            rec.ensure_attrs(attr_count);
            rec.ensure_slots(slot_count);
        }
        Ok(id)
    }

    /// Ingest one record: `values[attr_id]` is the resolved list of category
    /// ids for that attribute (empty = missing). Categories are created
    /// lazily here - the only creation point. The record is evaluated
    /// against current selections immediately, so ingestion into a filtered
    /// engine stays consistent.
    pub fn add_record(&mut self, values: &[&[&str]]) -> FacetResult<RecordIdx> {
        if values.len() != self.attributes.len() {
            return Err(FacetError::InvalidArgument(format!(
                "expected {} value lists, got {}",
                self.attributes.len(),
                values.len()
            )));
        }
        for (aid, vals) in values.iter().enumerate() {
            if !self.attributes[aid].multi_valued() && vals.len() > 1 {
                return Err(FacetError::InvalidArgument(format!(
                    "attribute '{}' is single-valued, got {} values",
                    self.attributes[aid].name(),
                    vals.len()
                )));
            }
        }

        let rec_idx = self.records.len() as RecordIdx;
        let mut rec = Record::new(self.attributes.len(), self.registry.len());

        // Resolve + Total measures.
        for (aid, vals) in values.iter().enumerate() {
            let attr = &mut self.attributes[aid];
            let mut resolved: SmallVec<[CatIdx; 4]> = SmallVec::new();
            for id in vals.iter() {
                let cat = attr.arena.intern(id);
                if !resolved.contains(&cat) {
                    resolved.push(cat);
                }
            }
            for &cat in &resolved {
                attr.arena.get_mut(cat).measures_mut().add(Channel::Total, 1.0);
            }
            if let Some(sp) = attr.set_pairs.as_mut() {
                sp.add_record(&attr.arena, &resolved, Channel::Total, 1.0);
            }
            rec.set_values(aid, resolved);
        }

        // Evaluate current selections against the new record.
        for (aid, attr) in self.attributes.iter().enumerate() {
            let pass = !attr.filter.is_active()
                || attr.filter.evaluate(&attr.arena, rec.values(aid));
            rec.set_pass(attr.filter.filter_id(), pass);
        }
        if rec.is_included() {
            self.active_records += 1;
            for (aid, attr) in self.attributes.iter_mut().enumerate() {
                let vals = rec.values(aid);
                for &cat in vals {
                    attr.arena.get_mut(cat).measures_mut().add(Channel::Active, 1.0);
                }
                if let Some(sp) = attr.set_pairs.as_mut() {
                    sp.add_record(&attr.arena, vals, Channel::Active, 1.0);
                }
            }
        }
        self.records.push(rec);

        // Membership thresholds may park or revive categories; a parked
        // category dropping out of a selection dirties the filter.
        for aid in 0..self.attributes.len() {
            self.attributes[aid].retire_small();
            if self.attributes[aid].filter.is_dirty() {
                self.refresh_filter(aid);
            }
        }
        Ok(rec_idx)
    }

    // ------------------------------------------------------------------
    // Selection entry points
    // ------------------------------------------------------------------

    /// Apply {AND|OR|NOT|NONE} to a category (click semantics, see the
    /// orchestrator rules). On rejection the filter state and all measures
    /// are untouched.
    pub fn apply_selection(
        &mut self,
        attr: AttrId,
        category: &str,
        mode: SelectionMode,
    ) -> FacetResult<()> {
        let cat = self.resolve_category(attr, category)?;
        let active_total = self.active_records;
        self.attributes[attr].apply_selection(cat, mode, active_total)?;
        self.refresh_filter(attr);
        Ok(())
    }

    /// Set the tri-state missing-value filter for an attribute.
    pub fn set_missing_filter(&mut self, attr: AttrId, mode: MissingMode) -> FacetResult<()> {
        let a = self.attr_mut(attr)?;
        a.filter.set_missing(mode);
        let empty = a.filter.is_empty();
        a.filter.set_active(!empty);
        a.filter.mark_dirty();
        self.refresh_filter(attr);
        Ok(())
    }

    /// Drop every selection and missing-value filter across all attributes.
    pub fn clear_all_selections(&mut self) {
        let mut fids = Vec::with_capacity(self.attributes.len());
        for attr in &mut self.attributes {
            attr.clear_selections();
            let _ = attr.filter.take_dirty();
            fids.push(attr.filter.filter_id());
        }
        for rec in &mut self.records {
            for &fid in &fids {
                rec.set_pass(fid, true);
            }
        }
        self.replay_active();
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Combined filter-cache verdict for one record.
    pub fn is_included(&self, rec: RecordIdx) -> FacetResult<bool> {
        self.records
            .get(rec as usize)
            .map(Record::is_included)
            .ok_or_else(|| FacetError::NotFound(format!("record {rec}")))
    }

    /// Number of records currently passing every filter.
    pub fn active_count(&self) -> u32 {
        self.active_records
    }

    pub fn record_count_total(&self) -> usize {
        self.records.len()
    }

    pub fn attribute_id(&self, name: &str) -> FacetResult<AttrId> {
        self.attr_by_name
            .get(name)
            .copied()
            .ok_or_else(|| FacetError::NotFound(format!("attribute '{name}'")))
    }

    pub fn attribute(&self, attr: AttrId) -> FacetResult<&FacetAttribute> {
        self.attributes
            .get(attr)
            .ok_or_else(|| FacetError::NotFound(format!("attribute {attr}")))
    }

    pub fn category(&self, attr: AttrId, id: &str) -> FacetResult<&CategoryAggregate> {
        let cat = self.resolve_category(attr, id)?;
        Ok(self.attributes[attr].arena.get(cat))
    }

    /// Weight-sum measure of a category on a channel.
    pub fn measure(&self, attr: AttrId, category: &str, channel: Channel) -> FacetResult<f64> {
        Ok(self.category(attr, category)?.measures().sum(channel))
    }

    /// Record count of a category on a channel.
    pub fn record_count(&self, attr: AttrId, category: &str, channel: Channel) -> FacetResult<u32> {
        Ok(self.category(attr, category)?.measures().count(channel))
    }

    /// Co-occurrence count of two categories on a channel. 0 when the pair
    /// never shares a record; unknown category ids are an error.
    pub fn pair_count(
        &self,
        attr: AttrId,
        a: &str,
        b: &str,
        channel: Channel,
    ) -> FacetResult<u32> {
        let (attr_ref, sp, ca, cb) = self.resolve_pair(attr, a, b)?;
        Ok(sp
            .lookup(&attr_ref.arena, ca, cb)
            .map(|p| sp.get(p).co_occurrence(channel))
            .unwrap_or(0))
    }

    /// Weight-sum co-occurrence measure of two categories on a channel.
    pub fn pair_measure(
        &self,
        attr: AttrId,
        a: &str,
        b: &str,
        channel: Channel,
    ) -> FacetResult<f64> {
        let (attr_ref, sp, ca, cb) = self.resolve_pair(attr, a, b)?;
        Ok(sp
            .lookup(&attr_ref.arena, ca, cb)
            .map(|p| sp.get(p).measures().sum(channel))
            .unwrap_or(0.0))
    }

    /// Similarity score of two categories on a channel; 0 for disjoint
    /// pairs.
    pub fn similarity(
        &self,
        attr: AttrId,
        a: &str,
        b: &str,
        channel: Channel,
    ) -> FacetResult<f64> {
        let (attr_ref, sp, ca, cb) = self.resolve_pair(attr, a, b)?;
        Ok(sp
            .lookup(&attr_ref.arena, ca, cb)
            .map(|p| sp.similarity(&attr_ref.arena, p, channel))
            .unwrap_or(0.0))
    }

    // ------------------------------------------------------------------
    // Ordering
    // ------------------------------------------------------------------

    /// Current total order over an attribute's categories.
    pub fn sorted_categories(&self, attr: AttrId, spec: &SortSpec) -> FacetResult<Vec<CatIdx>> {
        Ok(sort::sort_categories(&self.attribute(attr)?.arena, spec))
    }

    /// Sort and persist display positions into `order_index`.
    pub fn resort(&mut self, attr: AttrId, spec: &SortSpec) -> FacetResult<Vec<CatIdx>> {
        let a = self.attr_mut(attr)?;
        Ok(sort::resort(&mut a.arena, spec))
    }

    /// Recompute the similarity-based linear order for a multi-valued
    /// attribute. Valid until the next filter or compare-channel change.
    /// Returns the number of trees in the spanning forest.
    pub fn recompute_perceptual_order(
        &mut self,
        attr: AttrId,
        channel: Channel,
    ) -> FacetResult<usize> {
        let a = self.attr_mut(attr)?;
        let name = a.name().to_string();
        match a.set_pairs.as_mut() {
            Some(sp) => Ok(compute_perceptual_order(&mut a.arena, sp, channel)),
            None => Err(FacetError::InvalidArgument(format!(
                "attribute '{name}' is single-valued, no set-pair index"
            ))),
        }
    }

    // ------------------------------------------------------------------
    // Compare channels
    // ------------------------------------------------------------------

    /// Populate one compare channel from a caller-supplied record subset
    /// (the UI's compare selection). Inclusion state is not consulted; the
    /// caller decides what to compare.
    pub fn set_compare(&mut self, channel: Channel, records: &[RecordIdx]) -> FacetResult<()> {
        if !channel.is_compare() {
            return Err(FacetError::InvalidArgument(format!(
                "{channel:?} is not a compare channel"
            )));
        }
        for &r in records {
            if r as usize >= self.records.len() {
                return Err(FacetError::NotFound(format!("record {r}")));
            }
        }
        self.clear_compare(channel)?;
        let Self {
            attributes,
            records: all_records,
            ..
        } = self;
        for &r in records {
            let rec = &all_records[r as usize];
            for (aid, attr) in attributes.iter_mut().enumerate() {
                let vals = rec.values(aid);
                for &cat in vals {
                    attr.arena.get_mut(cat).measures_mut().add(channel, 1.0);
                }
                if let Some(sp) = attr.set_pairs.as_mut() {
                    sp.add_record(&attr.arena, vals, channel, 1.0);
                }
            }
        }
        Ok(())
    }

    /// Zero one compare channel everywhere.
    pub fn clear_compare(&mut self, channel: Channel) -> FacetResult<()> {
        if !channel.is_compare() {
            return Err(FacetError::InvalidArgument(format!(
                "{channel:?} is not a compare channel"
            )));
        }
        for attr in &mut self.attributes {
            for cat in attr.arena.iter_mut() {
                cat.measures_mut().clear(channel);
            }
            if let Some(sp) = attr.set_pairs.as_mut() {
                sp.clear_channel(channel);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // State import/export
    // ------------------------------------------------------------------

    pub fn export_state(&self, attr: AttrId) -> FacetResult<FilterState> {
        Ok(FilterState::capture(self.attribute(attr)?))
    }

    /// Replace an attribute's filter state with a previously captured one,
    /// replayed through `apply_selection` / `set_missing_filter`.
    pub fn import_state(&mut self, attr: AttrId, state: &FilterState) -> FacetResult<()> {
        // Reset this attribute first.
        {
            let a = self.attr_mut(attr)?;
            a.clear_selections();
        }
        self.refresh_filter(attr);

        if let Some(missing) = state.missing {
            return self.set_missing_filter(attr, missing.into());
        }
        // OR before AND: AND moves are unconditional, while an OR request
        // demotes a lone existing AND. This order reproduces every reachable
        // state, including mixed AND+OR combinators.
        for id in &state.or {
            self.apply_selection(attr, id, SelectionMode::Or)?;
        }
        for id in &state.and {
            self.apply_selection(attr, id, SelectionMode::And)?;
        }
        for id in &state.not {
            self.apply_selection(attr, id, SelectionMode::Not)?;
        }
        Ok(())
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            record_count: self.records.len(),
            active_count: self.active_records as usize,
            attribute_count: self.attributes.len(),
            category_count: self.attributes.iter().map(|a| a.arena.len()).sum(),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn attr_mut(&mut self, attr: AttrId) -> FacetResult<&mut FacetAttribute> {
        self.attributes
            .get_mut(attr)
            .ok_or_else(|| FacetError::NotFound(format!("attribute {attr}")))
    }

    fn resolve_category(&self, attr: AttrId, id: &str) -> FacetResult<CatIdx> {
        let a = self.attribute(attr)?;
        a.arena.lookup(id).ok_or_else(|| {
            FacetError::NotFound(format!("category '{id}' in attribute '{}'", a.name()))
        })
    }

    #[allow(clippy::type_complexity)]
    fn resolve_pair(
        &self,
        attr: AttrId,
        a: &str,
        b: &str,
    ) -> FacetResult<(
        &FacetAttribute,
        &facetdb_index::SetPairIndex,
        CatIdx,
        CatIdx,
    )> {
        let ca = self.resolve_category(attr, a)?;
        let cb = self.resolve_category(attr, b)?;
        let attr_ref = &self.attributes[attr];
        let sp = attr_ref.set_pairs.as_ref().ok_or_else(|| {
            FacetError::InvalidArgument(format!(
                "attribute '{}' is single-valued, no set-pair index",
                attr_ref.name()
            ))
        })?;
        Ok((attr_ref, sp, ca, cb))
    }

    /// Re-evaluate one attribute's filter into the cache, then bring Active
    /// measures up to date (differentially, or by reset-then-replay when
    /// the filter is dirty).
    fn refresh_filter(&mut self, attr_id: AttrId) {
        let full = self.attributes[attr_id].filter.take_dirty();
        let mut flips: Vec<(usize, bool)> = Vec::new();
        {
            let Self {
                attributes,
                records,
                ..
            } = self;
            let attr = &attributes[attr_id];
            let fid = attr.filter.filter_id();
            for (ri, rec) in records.iter_mut().enumerate() {
                let pass = !attr.filter.is_active()
                    || attr.filter.evaluate(&attr.arena, rec.values(attr_id));
                if pass != rec.passes(fid) {
                    // This slot flips overall inclusion only if every other
                    // slot passes.
                    let decisive = rec.passes_all_except(fid);
                    rec.set_pass(fid, pass);
                    if decisive {
                        flips.push((ri, pass));
                    }
                }
            }
        }

        if full {
            self.replay_active();
        } else {
            self.apply_flips(&flips);
        }
        debug!(
            attribute = %self.attributes[attr_id].name(),
            full,
            flipped = flips.len(),
            active = self.active_records,
            "filter refresh complete"
        );
    }

    /// Differential measure update for records whose inclusion flipped.
    fn apply_flips(&mut self, flips: &[(usize, bool)]) {
        let Self {
            attributes,
            records,
            active_records,
            ..
        } = self;
        for &(ri, included) in flips {
            let rec = &records[ri];
            for (aid, attr) in attributes.iter_mut().enumerate() {
                let vals = rec.values(aid);
                for &cat in vals {
                    if included {
                        attr.arena.get_mut(cat).measures_mut().add(Channel::Active, 1.0);
                    } else {
                        attr.arena.get_mut(cat).measures_mut().sub(Channel::Active, 1.0);
                    }
                }
                if let Some(sp) = attr.set_pairs.as_mut() {
                    if included {
                        sp.add_record(&attr.arena, vals, Channel::Active, 1.0);
                    } else {
                        sp.sub_record(&attr.arena, vals, Channel::Active, 1.0);
                    }
                }
            }
            if included {
                *active_records += 1;
            } else {
                *active_records -= 1;
            }
        }
    }

    /// Reset-then-replay of every Active measure (categories and set pairs,
    /// all attributes) over the included records.
    fn replay_active(&mut self) {
        let Self {
            attributes,
            records,
            active_records,
            ..
        } = self;
        for attr in attributes.iter_mut() {
            for cat in attr.arena.iter_mut() {
                cat.measures_mut().clear(Channel::Active);
            }
            if let Some(sp) = attr.set_pairs.as_mut() {
                sp.clear_channel(Channel::Active);
            }
        }
        *active_records = 0;
        for rec in records.iter() {
            if !rec.is_included() {
                continue;
            }
            *active_records += 1;
            for (aid, attr) in attributes.iter_mut().enumerate() {
                let vals = rec.values(aid);
                for &cat in vals {
                    attr.arena.get_mut(cat).measures_mut().add(Channel::Active, 1.0);
                }
                if let Some(sp) = attr.set_pairs.as_mut() {
                    sp.add_record(&attr.arena, vals, Channel::Active, 1.0);
                }
            }
        }
    }
}

/// Engine-wide statistics snapshot.
#[derive(Debug, Clone)]
pub struct EngineStats {
    pub record_count: usize,
    pub active_count: usize,
    pub attribute_count: usize,
    pub category_count: usize,
}

// ============================================================================
// Thread-Safe Wrapper
// ============================================================================

/// `FacetEngine` behind a `parking_lot::RwLock`. Whole passes are the
/// critical section: no reader observes a half-refreshed measure or order
/// field.
pub struct ConcurrentFacetEngine {
    inner: RwLock<FacetEngine>,
}

impl ConcurrentFacetEngine {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(FacetEngine::new()),
        }
    }

    pub fn apply_selection(
        &self,
        attr: AttrId,
        category: &str,
        mode: SelectionMode,
    ) -> FacetResult<()> {
        self.inner.write().apply_selection(attr, category, mode)
    }

    pub fn clear_all_selections(&self) {
        self.inner.write().clear_all_selections();
    }

    pub fn is_included(&self, rec: RecordIdx) -> FacetResult<bool> {
        self.inner.read().is_included(rec)
    }

    pub fn active_count(&self) -> u32 {
        self.inner.read().active_count()
    }

    pub fn export_state(&self, attr: AttrId) -> FacetResult<FilterState> {
        self.inner.read().export_state(attr)
    }

    /// Run an arbitrary read under the lock.
    pub fn with_read<R>(&self, f: impl FnOnce(&FacetEngine) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run an arbitrary mutation under the lock.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut FacetEngine) -> R) -> R {
        f(&mut self.inner.write())
    }
}

impl Default for ConcurrentFacetEngine {
    fn default() -> Self {
        Self::new()
    }
}
