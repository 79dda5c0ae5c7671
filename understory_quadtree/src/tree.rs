// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public `QuadTree` API: entry storage, world growth, relocation and queries.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::config::Config;
use crate::item::{Bounded, Key, MovableKey, Motion};
use crate::node::{NodeIdx, NodeInfo, QuadNode, ROOT};
use crate::types::{Aabb2D, Scalar};

#[derive(Clone, Debug)]
pub(crate) struct Entry<T, P> {
    pub(crate) bounds: Aabb2D<T>,
    pub(crate) payload: P,
    // Node whose bucket currently holds this entry.
    pub(crate) node: NodeIdx,
    // Present only for movable entries.
    pub(crate) motion: Option<Motion<T>>,
}

/// A mutable region quadtree over axis-aligned boxes with user payloads.
///
/// Each node holds up to [`Config::max_entries`] entries in its own bucket
/// before splitting into four quadrants. Entries live in the deepest node whose
/// rectangle fully contains them; entries straddling a split line stay in the
/// parent. Partitioning is never undone automatically; see
/// [`QuadTree::compact`].
///
/// The world rectangle grows on demand: inserting or moving an entry outside
/// of it rebuilds the tree over a larger world (see [`QuadTree::insert`]).
///
/// ## Example
///
/// ```rust
/// use understory_quadtree::{Aabb2D, Motion, QuadTree};
///
/// let mut tree: QuadTree<f64, u32> = QuadTree::new(Aabb2D::new(0.0, 0.0, 100.0, 100.0), 4);
/// let wall = tree.insert(Aabb2D::new(10.0, 10.0, 20.0, 12.0), 1);
/// let ball = tree.insert_movable(Motion::new(5.0, 5.0, 2.0, 2.0), 2);
///
/// tree.move_to(ball, 95.0, 95.0);
/// let hits: Vec<_> = tree.query_rect(Aabb2D::new(90.0, 90.0, 100.0, 100.0)).collect();
/// assert_eq!(hits, [(ball.key(), 2)]);
///
/// assert_eq!(tree.remove(wall), Some(1));
/// assert_eq!(tree.len(), 1);
/// ```
pub struct QuadTree<T: Scalar, P: Copy + Debug> {
    pub(crate) config: Config<T>,
    /// node arena; the root is always at index 0
    pub(crate) nodes: Vec<QuadNode<T>>,
    /// entry slots
    pub(crate) entries: Vec<Option<Entry<T, P>>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    len: usize,
}

impl<T: Scalar, P: Copy + Debug> Debug for QuadTree<T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QuadTree")
            .field("world", &self.world())
            .field("config", &self.config)
            .field("entries", &self.len)
            .field("nodes", &self.nodes.len())
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl<T: Scalar, P: Copy + Debug> QuadTree<T, P> {
    /// Create an empty tree over `world` that partitions nodes holding more
    /// than `max_entries` entries.
    pub fn new(world: Aabb2D<T>, max_entries: usize) -> Self {
        Self::with_config(world, Config::new(max_entries))
    }

    /// Create an empty tree over `world` with an explicit [`Config`].
    ///
    /// An inverted `world` is normalized (its corners swapped per axis).
    pub fn with_config(world: Aabb2D<T>, config: Config<T>) -> Self {
        Self {
            config: config.sanitized(),
            nodes: alloc::vec![QuadNode::new(normalized(world), None, 0)],
            entries: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// The partitioning policy of this tree.
    pub fn config(&self) -> &Config<T> {
        &self.config
    }

    /// The current world rectangle (the root node's bounds).
    pub fn world(&self) -> Aabb2D<T> {
        self.node(ROOT).bounds
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest node (0 for an unpartitioned root).
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Reserve space for at least `n` additional entries.
    pub fn reserve(&mut self, n: usize) {
        self.entries.reserve(n);
        self.generations.reserve(n);
    }

    /// Insert a static entry. Returns a stable handle [`Key`].
    ///
    /// If the world does not contain `bounds`, it grows first: the union of the
    /// world and `bounds` is pushed outward by each corner's own distance to the
    /// origin (so a world straddling the origin doubles), and every entry is
    /// reinserted into the new root. Bounds that no world can contain (inverted
    /// or non-finite) are logged and kept in the root.
    pub fn insert(&mut self, bounds: Aabb2D<T>, payload: P) -> Key {
        self.grow_to_fit(&bounds);
        let key = self.alloc_entry(bounds, payload, None);
        self.insert_at(ROOT, key);
        key
    }

    /// Insert a static entry whose payload reports its own bounds.
    pub fn insert_item(&mut self, item: P) -> Key
    where
        P: Bounded<T>,
    {
        let bounds = item.bounds();
        self.insert(bounds, item)
    }

    /// Insert a movable entry centered at `motion` with the given size.
    pub fn insert_movable(&mut self, motion: Motion<T>, payload: P) -> MovableKey {
        let bounds = motion.bounds();
        self.grow_to_fit(&bounds);
        let key = self.alloc_entry(bounds, payload, Some(motion));
        self.insert_at(ROOT, key);
        MovableKey(key)
    }

    /// Move a movable entry's center. Returns `false` for a stale key.
    pub fn move_to(&mut self, key: MovableKey, x: T, y: T) -> bool {
        let Some(motion) = self.motion(key) else {
            return false;
        };
        self.relocate(key, Motion { x, y, ..motion })
    }

    /// Resize a movable entry around its center. Returns `false` for a stale key.
    pub fn set_size(&mut self, key: MovableKey, width: T, height: T) -> bool {
        let Some(motion) = self.motion(key) else {
            return false;
        };
        self.relocate(
            key,
            Motion {
                width,
                height,
                ..motion
            },
        )
    }

    /// Replace a movable entry's center and size, re-routing it in the tree.
    ///
    /// If its node still contains the new bounds, the entry moves down into a
    /// child when one now fits it. Otherwise it moves up to the nearest
    /// ancestor that contains it, and if not even the root does, the world
    /// grows as for [`QuadTree::insert`]. Returns `false` for a stale key.
    pub fn relocate(&mut self, key: MovableKey, motion: Motion<T>) -> bool {
        let key = key.key();
        let Some(entry) = self.live_entry_mut(key) else {
            return false;
        };
        let bounds = motion.bounds();
        entry.motion = Some(motion);
        entry.bounds = bounds;
        let node = entry.node;

        if self.node(node).bounds.contains(&bounds) {
            self.push_down(node, key, &bounds);
            return true;
        }
        let placed = if node == ROOT {
            self.detach(ROOT, key);
            false
        } else {
            self.push_up(node, key, &bounds)
        };
        if !placed {
            self.regrow_for(key, &bounds);
        }
        true
    }

    /// Current center and size of a movable entry.
    pub fn motion(&self, key: MovableKey) -> Option<Motion<T>> {
        self.live_entry(key.key())?.motion
    }

    /// Remove an entry, returning its payload. Stale keys are ignored.
    pub fn remove(&mut self, key: impl Into<Key>) -> Option<P> {
        let key = key.into();
        let node = self.live_entry(key)?.node;
        self.detach(node, key);
        let entry = self.entries[key.idx()]
            .take()
            .expect("quadtree invariant violated: live entry vanished");
        self.free_list.push(key.idx());
        self.len -= 1;
        Some(entry.payload)
    }

    /// Remove the first entry, in pre-order node traversal, for which `pred`
    /// returns `true`.
    pub fn remove_where<F>(&mut self, mut pred: F) -> Option<(Key, P)>
    where
        F: FnMut(&Aabb2D<T>, &P) -> bool,
    {
        let key = self.find_first(ROOT, &mut pred)?;
        self.remove(key).map(|payload| (key, payload))
    }

    /// Bounds and payload of a live entry.
    pub fn get(&self, key: impl Into<Key>) -> Option<(Aabb2D<T>, P)> {
        self.live_entry(key.into()).map(|e| (e.bounds, e.payload))
    }

    /// Bounds of a live entry.
    pub fn bounds_of(&self, key: impl Into<Key>) -> Option<Aabb2D<T>> {
        self.live_entry(key.into()).map(|e| e.bounds)
    }

    /// Payload of a live entry.
    pub fn payload(&self, key: impl Into<Key>) -> Option<P> {
        self.live_entry(key.into()).map(|e| e.payload)
    }

    /// Whether `key` refers to a live entry.
    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        self.live_entry(key.into()).is_some()
    }

    /// Iterate over all live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, Aabb2D<T>, P)> + '_ {
        self.entries.iter().enumerate().filter_map(|(idx, slot)| {
            slot.as_ref()
                .map(|e| (Key::new(idx, self.generations[idx]), e.bounds, e.payload))
        })
    }

    /// Visit entries whose bounds overlap `rect` (edges touching counts).
    pub fn visit_rect<F: FnMut(Key, P)>(&self, rect: Aabb2D<T>, mut f: F) {
        self.collect_rect(ROOT, &rect, &mut |key| f(key, self.entry(key).payload));
    }

    /// Query for entries whose bounds overlap `rect` (edges touching counts).
    pub fn query_rect(&self, rect: Aabb2D<T>) -> impl Iterator<Item = (Key, P)> + '_ {
        let mut out = Vec::new();
        self.visit_rect(rect, |key, payload| out.push((key, payload)));
        out.into_iter()
    }

    /// Visit entries whose bounds contain the point.
    pub fn visit_point<F: FnMut(Key, P)>(&self, x: T, y: T, mut f: F) {
        self.collect_point(ROOT, x, y, &mut |key| f(key, self.entry(key).payload));
    }

    /// Query for entries whose bounds contain the point.
    pub fn query_point(&self, x: T, y: T) -> impl Iterator<Item = (Key, P)> + '_ {
        let mut out = Vec::new();
        self.visit_point(x, y, |key, payload| out.push((key, payload)));
        out.into_iter()
    }

    /// Visit every node in pre-order (parent before its children, children in
    /// top-left, top-right, bottom-left, bottom-right order).
    ///
    /// Intended for diagnostics and debug rendering.
    pub fn visit_nodes<F: FnMut(&NodeInfo<T>)>(&self, mut f: F) {
        self.visit_node(ROOT, &mut f);
    }

    /// Rebuild the tree over `world`.
    ///
    /// Every entry is collected and reinserted into a fresh root. If `world`
    /// would leave an entry outside, it is grown by the same rule as
    /// [`QuadTree::insert`] until it covers every entry.
    pub fn resize(&mut self, world: Aabb2D<T>) {
        let mut target = normalized(world);
        for entry in self.entries.iter().flatten() {
            if !target.contains(&entry.bounds)
                && let Some(grown) = target.grown_to_fit(&entry.bounds)
            {
                target = grown;
            }
        }
        if target != world {
            tracing::debug!(requested = ?world, world = ?target, "resize target grown to fit entries");
        }
        self.rebuild(target);
    }

    /// Rebuild the tree over its current world, discarding partitions that
    /// no longer pay for themselves after heavy removal.
    pub fn compact(&mut self) {
        let before = self.nodes.len();
        self.rebuild(self.world());
        tracing::debug!(before, after = self.nodes.len(), "compacted quadtree");
    }

    /// Remove every entry, keeping the current world. Existing keys go stale.
    pub fn clear(&mut self) {
        for (idx, slot) in self.entries.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.free_list.push(idx);
            }
        }
        self.len = 0;
        let world = self.world();
        self.nodes.clear();
        self.nodes.push(QuadNode::new(world, None, 0));
    }

    fn alloc_entry(&mut self, bounds: Aabb2D<T>, payload: P, motion: Option<Motion<T>>) -> Key {
        let entry = Entry {
            bounds,
            payload,
            node: ROOT,
            motion,
        };
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.entries[idx] = Some(entry);
            (idx, generation)
        } else {
            let generation = 1_u32;
            self.entries.push(Some(entry));
            self.generations.push(generation);
            (self.entries.len() - 1, generation)
        };
        self.len += 1;
        Key::new(idx, generation)
    }

    /// Grow the world so that it contains `bounds`, if it does not already.
    fn grow_to_fit(&mut self, bounds: &Aabb2D<T>) {
        let world = self.world();
        if world.contains(bounds) {
            return;
        }
        if let Some(grown) = world.grown_to_fit(bounds) {
            tracing::debug!(?world, ?grown, entry = ?bounds, "growing quadtree world");
            self.rebuild(grown);
        }
    }

    /// Place a detached entry that no longer fits in the world.
    fn regrow_for(&mut self, key: Key, bounds: &Aabb2D<T>) {
        let world = self.world();
        match world.grown_to_fit(bounds) {
            Some(grown) => {
                tracing::debug!(?world, ?grown, entry = ?bounds, "growing quadtree world");
                // The rebuild reattaches every live entry, including `key`.
                self.rebuild(grown);
            }
            None => self.insert_at(ROOT, key),
        }
    }

    /// Drop every node and reinsert all live entries under a new root.
    fn rebuild(&mut self, world: Aabb2D<T>) {
        self.nodes.clear();
        self.nodes.push(QuadNode::new(world, None, 0));
        for idx in 0..self.entries.len() {
            if self.entries[idx].is_some() {
                self.insert_at(ROOT, Key::new(idx, self.generations[idx]));
            }
        }
    }

    fn live_entry(&self, key: Key) -> Option<&Entry<T, P>> {
        if self.generations.get(key.idx()) != Some(&key.generation()) {
            return None;
        }
        self.entries.get(key.idx())?.as_ref()
    }

    fn live_entry_mut(&mut self, key: Key) -> Option<&mut Entry<T, P>> {
        if self.generations.get(key.idx()) != Some(&key.generation()) {
            return None;
        }
        self.entries.get_mut(key.idx())?.as_mut()
    }

    /// Entry referenced from a node bucket.
    #[inline]
    pub(crate) fn entry(&self, key: Key) -> &Entry<T, P> {
        self.entries[key.idx()]
            .as_ref()
            .expect("quadtree invariant violated: bucket references a vacant entry")
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self, key: Key) -> &mut Entry<T, P> {
        self.entries[key.idx()]
            .as_mut()
            .expect("quadtree invariant violated: bucket references a vacant entry")
    }

    /// Check the structural invariants of the whole tree.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let mut seen = 0;
        for (i, node) in self.nodes.iter().enumerate() {
            let idx = NodeIdx::new(i);
            if let Some(children) = node.children {
                for child in children {
                    let c = self.node(child);
                    assert_eq!(c.parent, Some(idx), "child must point back to its parent");
                    assert!(
                        node.bounds.contains(&c.bounds),
                        "child rectangle escapes its parent"
                    );
                    assert_eq!(c.depth, node.depth + 1, "child depth is parent depth + 1");
                }
            }
            for &key in &node.bucket {
                let entry = self.live_entry(key).expect("bucket holds a stale key");
                assert_eq!(entry.node, idx, "entry records the node holding it");
                assert!(
                    idx == ROOT || node.bounds.contains(&entry.bounds),
                    "entry escapes the node holding it"
                );
                seen += 1;
            }
        }
        assert_eq!(seen, self.len, "every live entry is held by exactly one node");
        assert_eq!(
            self.entries.iter().flatten().count(),
            self.len,
            "live entry count matches len"
        );
    }
}

/// Swap inverted corners so the world is always a regular box.
fn normalized<T: Scalar>(world: Aabb2D<T>) -> Aabb2D<T> {
    if !world.is_inverted() {
        return world;
    }
    tracing::warn!(?world, "inverted quadtree world normalized");
    Aabb2D::new(
        T::min(world.min_x, world.max_x),
        T::min(world.min_y, world.max_y),
        T::max(world.min_x, world.max_x),
        T::max(world.min_y, world.max_y),
    )
}
