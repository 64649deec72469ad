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

//! Measure Channels
//!
//! Every aggregate (category or set-pair) tracks the same fixed set of
//! measure slots:
//!
//! | Channel      | Populated from                                   |
//! |--------------|--------------------------------------------------|
//! | `Total`      | every record ever mapped to the aggregate        |
//! | `Active`     | records currently included by all filters        |
//! | `CompareA..E`| caller-supplied record subsets (side-by-side)    |
//!
//! A `MeasureSet` is a fixed inline array, no heap allocation per aggregate.
//! Each slot carries both a record count and a weight sum; unweighted
//! ingestion uses weight 1.0, so `sum == count` unless the caller weights
//! records.

/// Number of measure channels per aggregate.
pub const CHANNEL_COUNT: usize = 7;

/// A named measure slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Total,
    Active,
    CompareA,
    CompareB,
    CompareC,
    CompareD,
    CompareE,
}

impl Channel {
    /// All channels, in slot order.
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::Total,
        Channel::Active,
        Channel::CompareA,
        Channel::CompareB,
        Channel::CompareC,
        Channel::CompareD,
        Channel::CompareE,
    ];

    /// Slot index into a `MeasureSet`.
    pub fn index(self) -> usize {
        match self {
            Channel::Total => 0,
            Channel::Active => 1,
            Channel::CompareA => 2,
            Channel::CompareB => 3,
            Channel::CompareC => 4,
            Channel::CompareD => 5,
            Channel::CompareE => 6,
        }
    }

    /// True for the five side-by-side comparison slots.
    pub fn is_compare(self) -> bool {
        !matches!(self, Channel::Total | Channel::Active)
    }
}

/// Per-channel record counts and weight sums for one aggregate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasureSet {
    counts: [u32; CHANNEL_COUNT],
    sums: [f64; CHANNEL_COUNT],
}

impl MeasureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one record's contribution to a channel.
    pub fn add(&mut self, channel: Channel, weight: f64) {
        let i = channel.index();
        self.counts[i] += 1;
        self.sums[i] += weight;
    }

    /// Remove one record's contribution (differential refresh path).
    pub fn sub(&mut self, channel: Channel, weight: f64) {
        let i = channel.index();
        debug_assert!(self.counts[i] > 0, "measure underflow");
        self.counts[i] = self.counts[i].saturating_sub(1);
        self.sums[i] -= weight;
    }

    /// Zero a single channel (reset-then-replay).
    pub fn clear(&mut self, channel: Channel) {
        let i = channel.index();
        self.counts[i] = 0;
        self.sums[i] = 0.0;
    }

    /// Record count on a channel.
    pub fn count(&self, channel: Channel) -> u32 {
        self.counts[channel.index()]
    }

    /// Weight sum on a channel.
    pub fn sum(&self, channel: Channel) -> f64 {
        self.sums[channel.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_indices_are_distinct() {
        let mut seen = [false; CHANNEL_COUNT];
        for ch in Channel::ALL {
            assert!(!seen[ch.index()]);
            seen[ch.index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_compare_classification() {
        assert!(!Channel::Total.is_compare());
        assert!(!Channel::Active.is_compare());
        assert!(Channel::CompareA.is_compare());
        assert!(Channel::CompareE.is_compare());
    }

    #[test]
    fn test_add_sub_clear() {
        let mut m = MeasureSet::new();
        m.add(Channel::Active, 1.0);
        m.add(Channel::Active, 2.5);
        m.add(Channel::Total, 1.0);

        assert_eq!(m.count(Channel::Active), 2);
        assert!((m.sum(Channel::Active) - 3.5).abs() < f64::EPSILON);
        assert_eq!(m.count(Channel::Total), 1);

        m.sub(Channel::Active, 2.5);
        assert_eq!(m.count(Channel::Active), 1);
        assert!((m.sum(Channel::Active) - 1.0).abs() < f64::EPSILON);

        m.clear(Channel::Active);
        assert_eq!(m.count(Channel::Active), 0);
        assert_eq!(m.sum(Channel::Active), 0.0);
        // Other channels untouched by a single-channel clear.
        assert_eq!(m.count(Channel::Total), 1);
    }
}
