// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Quadtree: a mutable region quadtree over 2D AABBs.
//!
//! Understory Quadtree indexes axis-aligned bounding boxes (AABBs) with small
//! `Copy` payloads for fast area and point queries in a changing 2D world, such
//! as broad-phase collision detection or picking in a scene.
//!
//! - Insert static entries, or movable entries described by a center and size.
//! - Move, resize and remove entries through stable generational handles.
//! - Query every entry overlapping a rectangle or containing a point.
//! - The world rectangle grows automatically when entries leave it.
//!
//! Each node keeps the entries that it fully contains but that straddle the
//! split lines of its children. Once a node holds more than
//! [`Config::max_entries`] entries it splits into four quadrants and pushes
//! down what fits. Splitting stops at [`Config::min_cell_area`], so clustered
//! or coincident entries never drive the tree arbitrarily deep.
//!
//! It is generic over the scalar type `T` (`f32`, `f64` or `i64`) and does not
//! depend on any geometry crate.
//!
//! # Example
//!
//! ```rust
//! use understory_quadtree::{Aabb2D, Motion, QuadTree};
//!
//! let mut tree: QuadTree<f64, &str> = QuadTree::new(Aabb2D::new(0.0, 0.0, 100.0, 100.0), 4);
//! tree.insert(Aabb2D::new(10.0, 10.0, 11.0, 11.0), "crate");
//! tree.insert(Aabb2D::new(30.0, 30.0, 31.0, 31.0), "barrel");
//! let player = tree.insert_movable(Motion::new(5.0, 5.0, 2.0, 2.0), "player");
//!
//! let near_origin: Vec<_> = tree
//!     .query_rect(Aabb2D::new(0.0, 0.0, 20.0, 20.0))
//!     .map(|(_, name)| name)
//!     .collect();
//! assert_eq!(near_origin.len(), 2);
//!
//! // Walking off the map grows the world instead of losing the entry.
//! tree.move_to(player, 150.0, 150.0);
//! assert!(tree.world().contains_point(150.0, 150.0));
//! let hits: Vec<_> = tree.query_point(150.0, 150.0).collect();
//! assert_eq!(hits, [(player.key(), "player")]);
//! ```
//!
//! Integer coordinates work the same way; the area floor is what keeps small
//! integer cells from splitting forever:
//!
//! ```rust
//! use understory_quadtree::{Aabb2D, Config, QuadTree};
//!
//! let config = Config::<i64>::new(2).with_min_cell_area(64);
//! let mut tree: QuadTree<i64, u32> = QuadTree::with_config(Aabb2D::new(0, 0, 64, 64), config);
//! for i in 0..10 {
//!     tree.insert(Aabb2D::new(i, i, i + 1, i + 1), i as u32);
//! }
//! assert_eq!(tree.query_point(3, 3).count(), 2);
//! tree.visit_nodes(|node| assert!(node.bounds.width() >= 8));
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events: `warn` for recoverable misuse (such as
//! an entry that no world can contain), `debug` for world growth, resize and
//! compaction, and `trace` for each partition. Without a subscriber these
//! compile to nothing observable.
//!
//! ### Float semantics
//!
//! NaN coordinates are never contained and never grow the world; entries with
//! them stay in the root and match no query.

#![no_std]

extern crate alloc;

mod config;
mod item;
mod node;
mod tree;
mod types;

pub use config::{Config, DEFAULT_MAX_ENTRIES};
pub use item::{Bounded, Key, MovableKey, Motion};
pub use node::NodeInfo;
pub use tree::QuadTree;
pub use types::{Aabb2D, Scalar, ScalarAcc};
