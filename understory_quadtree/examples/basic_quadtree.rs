// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Broad-phase collision candidates with a quadtree.
//!
//! Static walls are inserted once; a handful of balls move every tick and ask
//! the tree which walls and balls are near them. Balls drifting off the map
//! grow the world rather than getting lost.
//!
//! Run:
//! - `RUST_LOG=understory_quadtree=debug cargo run -p understory_quadtree --example basic_quadtree`

use tracing_subscriber::EnvFilter;
use understory_quadtree::{Aabb2D, Motion, MovableKey, QuadTree};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Body {
    Wall(u16),
    Ball(u16),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut tree: QuadTree<f64, Body> = QuadTree::new(Aabb2D::new(0.0, 0.0, 200.0, 200.0), 4);

    // A ring of walls along the map edges.
    for i in 0..20_u16 {
        let t = f64::from(i) * 10.0;
        tree.insert(Aabb2D::from_xywh(t, 0.0, 10.0, 2.0), Body::Wall(i));
        tree.insert(Aabb2D::from_xywh(t, 198.0, 10.0, 2.0), Body::Wall(100 + i));
    }

    let mut balls: Vec<(MovableKey, f64, f64)> = (0..8_u16)
        .map(|i| {
            let x = 20.0 + f64::from(i) * 20.0;
            let key = tree.insert_movable(Motion::new(x, 100.0, 6.0, 6.0), Body::Ball(i));
            let vy = if i % 2 == 0 { -9.0 } else { 11.0 };
            (key, f64::from(i) - 3.5, vy)
        })
        .collect();

    for tick in 0..30 {
        let mut contacts = 0;
        for (key, vx, vy) in &mut balls {
            let Some(motion) = tree.motion(*key) else {
                continue;
            };
            tree.move_to(*key, motion.x + *vx, motion.y + *vy);
            let Some(bounds) = tree.bounds_of(*key) else {
                continue;
            };
            for (other, body) in tree.query_rect(bounds) {
                if other == key.key() {
                    continue;
                }
                contacts += 1;
                if matches!(body, Body::Wall(_)) {
                    *vy = -*vy;
                }
            }
        }
        if tick % 10 == 0 {
            println!(
                "tick {tick:2}: {contacts} contacts, world {:?}, {} nodes, depth {}",
                tree.world(),
                tree.node_count(),
                tree.depth()
            );
        }
    }

    // Kick one ball far outside the map.
    let (runaway, ..) = balls[0];
    tree.move_to(runaway, -500.0, 750.0);
    println!("after runaway: world {:?}", tree.world());

    let mut per_depth = [0_usize; 16];
    tree.visit_nodes(|node| {
        if let Some(slot) = per_depth.get_mut(node.depth) {
            *slot += node.entries;
        }
    });
    println!("entries per depth: {per_depth:?}");

    let picked: Vec<Body> = tree.query_point(5.0, 1.0).map(|(_, body)| body).collect();
    println!("picked at (5, 1): {picked:?}");
}
