// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Partitioning policy shared by every node of a tree.

use crate::types::Scalar;

/// Default number of entries a node holds before it partitions.
pub const DEFAULT_MAX_ENTRIES: usize = 8;

/// Partitioning policy for a [`QuadTree`](crate::QuadTree).
///
/// ```rust
/// use understory_quadtree::Config;
///
/// let config = Config::<f64>::new(4).with_min_cell_area(0.25);
/// assert_eq!(config.max_entries, 4);
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config<T: Scalar> {
    /// Entries a node may hold in its own bucket before it partitions.
    ///
    /// Must be at least 1.
    pub max_entries: usize,
    /// A node only partitions while its area is strictly greater than this.
    ///
    /// Below the floor a node keeps every entry in its own bucket, which bounds
    /// the depth of the tree for clustered or coincident entries.
    pub min_cell_area: T::Acc,
}

impl<T: Scalar> Config<T> {
    /// Create a config with the given partition threshold and a unit area floor.
    pub fn new(max_entries: usize) -> Self {
        let one = T::widen(T::one());
        Self {
            max_entries,
            min_cell_area: one * one,
        }
    }

    /// Replace the minimum cell area.
    pub fn with_min_cell_area(mut self, min_cell_area: T::Acc) -> Self {
        self.min_cell_area = min_cell_area;
        self
    }

    /// Clamp values that would stall partitioning.
    pub(crate) fn sanitized(mut self) -> Self {
        if self.max_entries == 0 {
            tracing::warn!("quadtree max_entries of 0 clamped to 1");
            self.max_entries = 1;
        }
        self
    }
}

impl<T: Scalar> Default for Config<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}
