// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entry handles and the capabilities the tree consumes from indexed objects.

use crate::types::{Aabb2D, Scalar};

/// Generational handle for entries.
///
/// A key goes stale once its entry is removed; stale keys are ignored by every
/// operation, even after the slot has been reused by a newer entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(u32, u32);

impl Key {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Entry keys are intentionally 32-bit; higher bits are truncated by design."
    )]
    pub(crate) const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

/// Handle for an entry inserted with [`QuadTree::insert_movable`](crate::QuadTree::insert_movable).
///
/// Only movable entries can be relocated, so only this handle is accepted by
/// [`QuadTree::move_to`](crate::QuadTree::move_to) and friends. It converts
/// into a plain [`Key`] for removal and lookups.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MovableKey(pub(crate) Key);

impl MovableKey {
    /// The plain key of this entry.
    #[inline]
    pub const fn key(self) -> Key {
        self.0
    }
}

impl From<MovableKey> for Key {
    #[inline]
    fn from(key: MovableKey) -> Self {
        key.0
    }
}

/// Anything that can report an axis-aligned bounding box.
///
/// Implement this for payload types that know their own extent and insert them
/// with [`QuadTree::insert_item`](crate::QuadTree::insert_item).
pub trait Bounded<T> {
    /// Current bounding box of the object.
    fn bounds(&self) -> Aabb2D<T>;
}

impl<T: Copy> Bounded<T> for Aabb2D<T> {
    #[inline]
    fn bounds(&self) -> Self {
        *self
    }
}

/// Position and size of a movable entry.
///
/// The entry's bounding box is derived as `center ± size / 2`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Motion<T> {
    /// Center x.
    pub x: T,
    /// Center y.
    pub y: T,
    /// Width.
    pub width: T,
    /// Height.
    pub height: T,
}

impl<T: Scalar> Motion<T> {
    /// Create a motion record from a center and a size.
    #[inline]
    pub const fn new(x: T, y: T, width: T, height: T) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl<T: Scalar> Bounded<T> for Motion<T> {
    #[inline]
    fn bounds(&self) -> Aabb2D<T> {
        Aabb2D::from_center_size(self.x, self.y, self.width, self.height)
    }
}
