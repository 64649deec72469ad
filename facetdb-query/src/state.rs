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

//! Filter-State Import/Export
//!
//! Plain serde structure for persisting one attribute's filter state:
//! either the three selection lists (`{and, or, not}` as category ids in
//! insertion order) or a missing-value filter (`{missing: "in"|"out"}`).
//! Import replays the captured state through the ordinary selection entry
//! points; nothing is written behind the orchestrator's back.

use serde::{Deserialize, Serialize};

use crate::combinator::MissingMode;
use crate::selection::FacetAttribute;

/// Persisted missing-value filter direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingState {
    #[serde(rename = "in")]
    In,
    #[serde(rename = "out")]
    Out,
}

impl From<MissingState> for MissingMode {
    fn from(value: MissingState) -> Self {
        match value {
            MissingState::In => MissingMode::In,
            MissingState::Out => MissingMode::Out,
        }
    }
}

/// One attribute's exported filter state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub and: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub or: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<MissingState>,
}

impl FilterState {
    /// Snapshot an attribute's current filter state. A missing-value filter
    /// exports as the `{missing}` form; otherwise the selection lists in
    /// insertion order.
    pub fn capture(attr: &FacetAttribute) -> Self {
        match attr.filter.missing() {
            MissingMode::In => Self {
                missing: Some(MissingState::In),
                ..Self::default()
            },
            MissingMode::Out => Self {
                missing: Some(MissingState::Out),
                ..Self::default()
            },
            MissingMode::NotFiltered => {
                let ids = |list: &[facetdb_core::CatIdx]| {
                    list.iter()
                        .map(|&c| attr.arena.get(c).id().to_string())
                        .collect()
                };
                Self {
                    and: ids(attr.filter.lists.and()),
                    or: ids(attr.filter.lists.or()),
                    not: ids(attr.filter.lists.not()),
                    missing: None,
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.and.is_empty() && self.or.is_empty() && self.not.is_empty() && self.missing.is_none()
    }
}
