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

//! FacetDB Core
//!
//! Leaf data model for the faceted filtering engine:
//!
//! | Module      | Contents                                                |
//! |-------------|---------------------------------------------------------|
//! | `channel`   | Measure channels (Total/Active/Compare) and `MeasureSet`|
//! | `aggregate` | Category aggregates, arena, selection state machine     |
//! | `record`    | Records, per-filter inclusion cache, filter registry    |
//! | `error`     | `FacetError` / `FacetResult`                            |
//!
//! Everything here is addressed by flat arena indices (`CatIdx`, `RecordIdx`)
//! rather than references: aggregates are shared by many call paths (filter
//! evaluation, sorting, seriation) and indices sidestep ownership cycles.

pub mod aggregate;
pub mod channel;
pub mod error;
pub mod record;

pub use aggregate::{
    CatIdx, CategoryAggregate, CategoryArena, SelectionLists, SelectionMode, INVALID_ORDER,
};
pub use channel::{Channel, MeasureSet, CHANNEL_COUNT};
pub use error::{FacetError, FacetResult};
pub use record::{AttrId, FilterId, FilterRegistry, Record, RecordIdx};
