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

//! FacetDB Index
//!
//! Pairwise co-occurrence aggregates over multi-valued categorical
//! attributes, and the similarity-driven linear ordering built on top of
//! them:
//!
//! - `set_pair`: the co-occurrence ("set pair") index. One aggregate per
//!   unordered category pair that shares at least one record, with the same
//!   per-channel measures as a category aggregate.
//! - `seriation`: minimum-spanning-forest linearization that assigns every
//!   category an `order` index such that categories with similar
//!   neighborhood profiles end up adjacent.

pub mod seriation;
pub mod set_pair;

pub use seriation::compute_perceptual_order;
pub use set_pair::{PairIdx, SetPairAggregate, SetPairIndex, SetPairIndexStats};
