// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Partition cells: routing, partitioning, queries and entry migration.
//!
//! Nodes live in an arena owned by the [`QuadTree`]; children and parents are
//! referenced by index. The root is always the first node of the arena.

use core::cmp::Ordering;
use core::fmt::Debug;

use smallvec::SmallVec;

use crate::item::Key;
use crate::tree::QuadTree;
use crate::types::{Aabb2D, Scalar};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeIdx(usize);

impl NodeIdx {
    pub(crate) const fn new(i: usize) -> Self {
        Self(i)
    }

    pub(crate) const fn get(self) -> usize {
        self.0
    }
}

pub(crate) const ROOT: NodeIdx = NodeIdx::new(0);

/// One partition cell.
#[derive(Clone, Debug)]
pub(crate) struct QuadNode<T> {
    pub(crate) bounds: Aabb2D<T>,
    pub(crate) parent: Option<NodeIdx>,
    // Top-left, top-right, bottom-left, bottom-right.
    pub(crate) children: Option<[NodeIdx; 4]>,
    // Entries contained here but by no single child.
    pub(crate) bucket: SmallVec<[Key; 8]>,
    pub(crate) depth: usize,
}

impl<T> QuadNode<T> {
    pub(crate) fn new(bounds: Aabb2D<T>, parent: Option<NodeIdx>, depth: usize) -> Self {
        Self {
            bounds,
            parent,
            children: None,
            bucket: SmallVec::new(),
            depth,
        }
    }
}

/// Snapshot of a node handed to [`QuadTree::visit_nodes`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NodeInfo<T> {
    /// Rectangle covered by the node.
    pub bounds: Aabb2D<T>,
    /// Distance from the root (the root has depth 0).
    pub depth: usize,
    /// Number of entries held directly by the node.
    pub entries: usize,
    /// Whether the node has been split into four children.
    pub partitioned: bool,
}

impl<T: Scalar, P: Copy + Debug> QuadTree<T, P> {
    #[inline]
    pub(crate) fn node(&self, idx: NodeIdx) -> &QuadNode<T> {
        &self.nodes[idx.get()]
    }

    #[inline]
    fn node_mut(&mut self, idx: NodeIdx) -> &mut QuadNode<T> {
        &mut self.nodes[idx.get()]
    }

    /// First child (in quadrant order) that fully contains `bounds`.
    fn child_containing(&self, idx: NodeIdx, bounds: &Aabb2D<T>) -> Option<NodeIdx> {
        let children = self.node(idx).children?;
        children
            .into_iter()
            .find(|&child| self.node(child).bounds.contains(bounds))
    }

    /// Route `key` into the subtree rooted at `start`.
    ///
    /// The entry lands in the deepest node that fully contains it. If `start`
    /// itself does not contain it, the entry is kept in `start` and a warning
    /// is logged.
    pub(crate) fn insert_at(&mut self, start: NodeIdx, key: Key) {
        let bounds = self.entry(key).bounds;
        if !self.node(start).bounds.contains(&bounds) {
            tracing::warn!(
                ?bounds,
                node = ?self.node(start).bounds,
                "entry is not contained by its target node; keeping it there"
            );
            self.push_to_bucket(start, key);
            return;
        }
        let mut at = start;
        while let Some(child) = self.child_containing(at, &bounds) {
            at = child;
        }
        self.push_to_bucket(at, key);
    }

    fn push_to_bucket(&mut self, idx: NodeIdx, key: Key) {
        self.entry_mut(key).node = idx;
        let max_entries = self.config.max_entries;
        let node = self.node_mut(idx);
        node.bucket.push(key);
        if node.bucket.len() > max_entries && node.children.is_none() {
            self.partition(idx);
        }
    }

    /// Split a node into four quadrants and push its bucket down.
    ///
    /// Does nothing while the node's area is at or below the configured floor,
    /// or when the scalar can no longer subdivide it.
    pub(crate) fn partition(&mut self, idx: NodeIdx) {
        assert!(
            self.node(idx).children.is_none(),
            "quadtree invariant violated: partitioning an already partitioned node"
        );
        let bounds = self.node(idx).bounds;
        if bounds.area().partial_cmp(&self.config.min_cell_area) != Some(Ordering::Greater) {
            return;
        }
        let quadrants = bounds.quadrants();
        if quadrants.iter().any(|q| *q == bounds) {
            return;
        }

        let depth = self.node(idx).depth + 1;
        let first = self.nodes.len();
        for q in quadrants {
            self.nodes.push(QuadNode::new(q, Some(idx), depth));
        }
        self.node_mut(idx).children = Some([
            NodeIdx::new(first),
            NodeIdx::new(first + 1),
            NodeIdx::new(first + 2),
            NodeIdx::new(first + 3),
        ]);
        tracing::trace!(?bounds, depth, "partitioned quadtree node");

        let bucket = core::mem::take(&mut self.node_mut(idx).bucket);
        for key in bucket {
            let entry_bounds = self.entry(key).bounds;
            match self.child_containing(idx, &entry_bounds) {
                Some(child) => self.insert_at(child, key),
                None => self.node_mut(idx).bucket.push(key),
            }
        }
    }

    /// Remove `key` from the bucket of `idx`.
    pub(crate) fn detach(&mut self, idx: NodeIdx, key: Key) {
        let bucket = &mut self.node_mut(idx).bucket;
        let pos = bucket
            .iter()
            .position(|&k| k == key)
            .expect("quadtree invariant violated: entry missing from its node bucket");
        bucket.swap_remove(pos);
    }

    /// Move `key` into a child of `idx` if one now fully contains it.
    pub(crate) fn push_down(&mut self, idx: NodeIdx, key: Key, bounds: &Aabb2D<T>) {
        if let Some(child) = self.child_containing(idx, bounds) {
            self.detach(idx, key);
            self.insert_at(child, key);
        }
    }

    /// Move `key` out of `idx` to the nearest ancestor that contains it.
    ///
    /// Returns `false`, leaving the entry detached, when not even the root
    /// contains the new bounds; the caller must then grow the world.
    #[must_use]
    pub(crate) fn push_up(&mut self, idx: NodeIdx, key: Key, bounds: &Aabb2D<T>) -> bool {
        assert!(
            idx != ROOT,
            "quadtree invariant violated: push_up called on the root"
        );
        self.detach(idx, key);
        let mut at = self.node(idx).parent;
        while let Some(parent) = at {
            if self.node(parent).bounds.contains(bounds) {
                self.insert_at(parent, key);
                return true;
            }
            at = self.node(parent).parent;
        }
        false
    }

    /// Visit entries under `idx` whose bounds overlap `rect`.
    pub(crate) fn collect_rect<F: FnMut(Key)>(&self, idx: NodeIdx, rect: &Aabb2D<T>, f: &mut F) {
        let node = self.node(idx);
        for &key in &node.bucket {
            if self.entry(key).bounds.overlaps(rect) {
                f(key);
            }
        }
        let Some(children) = node.children else {
            return;
        };
        for child in children {
            let child_bounds = self.node(child).bounds;
            if child_bounds.contains_strictly(rect) {
                // Nothing in a sibling can reach a region that touches none of
                // this child's edges.
                self.collect_rect(child, rect, f);
                break;
            } else if rect.contains(&child_bounds) {
                self.collect_subtree(child, f);
            } else if child_bounds.overlaps(rect) {
                self.collect_rect(child, rect, f);
            }
        }
    }

    /// Visit every entry under `idx` without testing.
    pub(crate) fn collect_subtree<F: FnMut(Key)>(&self, idx: NodeIdx, f: &mut F) {
        let node = self.node(idx);
        for &key in &node.bucket {
            f(key);
        }
        if let Some(children) = node.children {
            for child in children {
                self.collect_subtree(child, f);
            }
        }
    }

    /// Visit entries under `idx` whose bounds contain the point.
    pub(crate) fn collect_point<F: FnMut(Key)>(&self, idx: NodeIdx, x: T, y: T, f: &mut F) {
        let node = self.node(idx);
        for &key in &node.bucket {
            if self.entry(key).bounds.contains_point(x, y) {
                f(key);
            }
        }
        if let Some(children) = node.children {
            // Points on a split line belong to every quadrant sharing it.
            for child in children {
                if self.node(child).bounds.contains_point(x, y) {
                    self.collect_point(child, x, y, f);
                }
            }
        }
    }

    /// Pre-order search for the first entry matching `pred`, bucket before children.
    pub(crate) fn find_first<F>(&self, idx: NodeIdx, pred: &mut F) -> Option<Key>
    where
        F: FnMut(&Aabb2D<T>, &P) -> bool,
    {
        let node = self.node(idx);
        for &key in &node.bucket {
            let entry = self.entry(key);
            if pred(&entry.bounds, &entry.payload) {
                return Some(key);
            }
        }
        node.children?
            .into_iter()
            .find_map(|child| self.find_first(child, &mut *pred))
    }

    /// Pre-order traversal over node snapshots.
    pub(crate) fn visit_node<F: FnMut(&NodeInfo<T>)>(&self, idx: NodeIdx, f: &mut F) {
        let node = self.node(idx);
        f(&NodeInfo {
            bounds: node.bounds,
            depth: node.depth,
            entries: node.bucket.len(),
            partitioned: node.children.is_some(),
        });
        if let Some(children) = node.children {
            for child in children {
                self.visit_node(child, f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn unit(x: f64, y: f64) -> Aabb2D<f64> {
        Aabb2D::from_xywh(x, y, 1.0, 1.0)
    }

    #[test]
    fn partition_pushes_contained_entries_down() {
        let mut tree: QuadTree<f64, u32> = QuadTree::new(Aabb2D::new(0.0, 0.0, 100.0, 100.0), 2);
        tree.insert(unit(10.0, 10.0), 1);
        tree.insert(unit(60.0, 10.0), 2);
        // Straddles the vertical split line.
        tree.insert(Aabb2D::new(45.0, 10.0, 55.0, 12.0), 3);

        let root = tree.node(ROOT);
        let children = root.children.expect("root should have partitioned");
        assert_eq!(root.bucket.len(), 1);
        assert_eq!(tree.node(children[0]).bucket.len(), 1);
        assert_eq!(tree.node(children[1]).bucket.len(), 1);
        tree.assert_invariants();
    }

    #[test]
    fn partition_respects_area_floor() {
        let config = crate::Config::new(1).with_min_cell_area(10_000.0);
        let mut tree: QuadTree<f64, u32> =
            QuadTree::with_config(Aabb2D::new(0.0, 0.0, 100.0, 100.0), config);
        for i in 0..5 {
            tree.insert(unit(f64::from(i) * 10.0, 5.0), i);
        }
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.node(ROOT).bucket.len(), 5);
    }

    #[test]
    fn coincident_integer_entries_stop_subdividing() {
        let config = crate::Config::new(1).with_min_cell_area(0);
        let mut tree: QuadTree<i64, u32> = QuadTree::with_config(Aabb2D::new(0, 0, 16, 16), config);
        for i in 0..4 {
            tree.insert(Aabb2D::new(3, 3, 3, 3), i);
        }
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.query_point(3, 3).count(), 4);
        tree.assert_invariants();
    }

    #[test]
    #[should_panic(expected = "already partitioned")]
    fn partitioning_twice_is_fatal() {
        let mut tree: QuadTree<f64, u32> = QuadTree::new(Aabb2D::new(0.0, 0.0, 100.0, 100.0), 1);
        tree.insert(unit(10.0, 10.0), 1);
        tree.insert(unit(60.0, 60.0), 2);
        tree.partition(ROOT);
    }

    #[test]
    #[should_panic(expected = "push_up called on the root")]
    fn push_up_on_root_is_fatal() {
        let mut tree: QuadTree<f64, u32> = QuadTree::new(Aabb2D::new(0.0, 0.0, 100.0, 100.0), 4);
        let k = tree.insert(unit(10.0, 10.0), 1);
        let _ = tree.push_up(ROOT, k, &unit(10.0, 10.0));
    }

    #[test]
    fn point_on_split_line_reaches_both_sides() {
        let mut tree: QuadTree<f64, u32> = QuadTree::new(Aabb2D::new(0.0, 0.0, 100.0, 100.0), 1);
        tree.insert(Aabb2D::new(40.0, 10.0, 50.0, 20.0), 1);
        tree.insert(Aabb2D::new(50.0, 10.0, 60.0, 20.0), 2);
        assert!(tree.node(ROOT).children.is_some());

        let mut hits: Vec<u32> = tree.query_point(50.0, 15.0).map(|(_, p)| p).collect();
        hits.sort_unstable();
        assert_eq!(hits, [1, 2]);

        // A zero-width region on the split line is not strictly inside either half.
        let mut hits: Vec<u32> = tree
            .query_rect(Aabb2D::new(50.0, 12.0, 50.0, 14.0))
            .map(|(_, p)| p)
            .collect();
        hits.sort_unstable();
        assert_eq!(hits, [1, 2]);
    }

    #[test]
    fn visit_nodes_is_pre_order() {
        let mut tree: QuadTree<f64, u32> = QuadTree::new(Aabb2D::new(0.0, 0.0, 100.0, 100.0), 1);
        tree.insert(unit(10.0, 10.0), 1);
        tree.insert(unit(60.0, 60.0), 2);

        let mut depths = Vec::new();
        tree.visit_nodes(|info| depths.push(info.depth));
        assert_eq!(depths, [0, 1, 1, 1, 1]);
    }
}
