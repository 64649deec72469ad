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

//! FacetDB Query Engine
//!
//! The user-facing half of the faceted filtering engine:
//!
//! | Module       | Contents                                               |
//! |--------------|--------------------------------------------------------|
//! | `combinator` | AND/OR/NOT + missing-value evaluation per record       |
//! | `selection`  | per-attribute orchestration of selection transitions   |
//! | `sort`       | category sort engine (value, label, fixed, relatedness)|
//! | `state`      | serde import/export of one attribute's filter state    |
//! | `engine`     | `FacetEngine` facade + thread-safe wrapper             |
//!
//! ## Execution model
//!
//! Single-threaded, synchronous, cooperative. Every mutation entry point
//! runs its refresh to completion before returning: filter cache first,
//! then measures (differentially for shape-preserving changes, full
//! reset-then-replay when the orchestrator marked the filter dirty). Mid-
//! pass, `order_index` / `order` / measure fields are transiently
//! inconsistent; callers only ever observe post-pass state.

pub mod combinator;
pub mod engine;
pub mod selection;
pub mod sort;
pub mod state;

pub use combinator::{CategoricalFilter, MissingMode};
pub use engine::{ConcurrentFacetEngine, EngineStats, FacetEngine};
pub use selection::FacetAttribute;
pub use sort::{resort, sort_categories, CatSortBy, SortSpec};
pub use state::{FilterState, MissingState};
