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

//! Error types for FacetDB
//!
//! Three tiers, matching how callers are expected to react:
//!
//! 1. `SelectionRejected` - user-correctable; the requested transition was
//!    dropped and filter state is unchanged. Surface the reason to the user.
//! 2. `NotFound` / `InvalidArgument` - caller bugs or stale ids; the engine
//!    never lazily creates aggregates outside the ingestion entry points.
//! 3. Invariant violations (a category in two selection lists, a record with
//!    a missing cache slot) are programming errors and fail loudly through
//!    `debug_assert!`, not through this enum.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FacetError {
    /// A selection transition was refused. Non-fatal: filter state is left
    /// exactly as it was, and the reason is suitable for end-user display.
    #[error("selection rejected: {reason}")]
    SelectionRejected { reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl FacetError {
    /// Build a `SelectionRejected` from anything stringly.
    pub fn rejected(reason: impl Into<String>) -> Self {
        FacetError::SelectionRejected {
            reason: reason.into(),
        }
    }

    /// True if the error is the user-correctable kind.
    pub fn is_rejection(&self) -> bool {
        matches!(self, FacetError::SelectionRejected { .. })
    }
}

pub type FacetResult<T> = Result<T, FacetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_helper() {
        let err = FacetError::rejected("would empty the result set");
        assert!(err.is_rejection());
        assert_eq!(
            err.to_string(),
            "selection rejected: would empty the result set"
        );
    }

    #[test]
    fn test_not_found_display() {
        let err = FacetError::NotFound("category 'xyz'".to_string());
        assert!(!err.is_rejection());
        assert_eq!(err.to_string(), "not found: category 'xyz'");
    }
}
