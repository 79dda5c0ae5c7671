// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quadtree queries and moves compared against a linear scan.

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_quadtree::{Aabb2D, Motion, MovableKey, QuadTree};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_random_rects(count: usize, extent: f64, size: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(count);
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    for _ in 0..count {
        let x0 = rng.next_f64() * (extent - size);
        let y0 = rng.next_f64() * (extent - size);
        out.push(Aabb2D::<f64>::from_xywh(x0, y0, size, size));
    }
    out
}

fn gen_clustered_rects(n_clusters: usize, per_cluster: usize, spread: f64) -> Vec<Aabb2D<f64>> {
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let mut centers = Vec::with_capacity(n_clusters);
    for _ in 0..n_clusters {
        centers.push((rng.next_f64() * 2000.0, rng.next_f64() * 2000.0));
    }
    for (cx, cy) in centers {
        for _ in 0..per_cluster {
            let dx = (rng.next_f64() - 0.5) * spread;
            let dy = (rng.next_f64() - 0.5) * spread;
            out.push(Aabb2D::<f64>::from_xywh(cx + dx, cy + dy, 12.0, 12.0));
        }
    }
    out
}

fn build_tree(rects: &[Aabb2D<f64>], max_entries: usize) -> QuadTree<f64, u32> {
    let mut tree = QuadTree::new(Aabb2D::new(0.0, 0.0, 2000.0, 2000.0), max_entries);
    tree.reserve(rects.len());
    for (i, r) in rects.iter().copied().enumerate() {
        let _ = tree.insert(r, i as u32);
    }
    tree
}

fn scan_rect(rects: &[Aabb2D<f64>], q: Aabb2D<f64>) -> usize {
    rects.iter().filter(|r| r.overlaps(&q)).count()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for &n in &[1_000usize, 10_000] {
        let rects = gen_random_rects(n, 2000.0, 8.0);
        group.throughput(Throughput::Elements(n as u64));
        for &max_entries in &[4usize, 8, 16] {
            group.bench_function(format!("random_n{n}_max{max_entries}"), |b| {
                b.iter(|| black_box(build_tree(&rects, max_entries).node_count()));
            });
        }
    }
    let rects = gen_clustered_rects(20, 500, 80.0);
    group.bench_function("clustered_10k", |b| {
        b.iter(|| black_box(build_tree(&rects, 8).node_count()));
    });
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_rect");
    for &n in &[1_000usize, 10_000] {
        let rects = gen_random_rects(n, 2000.0, 8.0);
        let tree = build_tree(&rects, 8);
        let mut rng = Rng::new(0xBADC_F00D_1234_5678);
        let queries: Vec<Aabb2D<f64>> = (0..64)
            .map(|_| {
                let x = rng.next_f64() * 1800.0;
                let y = rng.next_f64() * 1800.0;
                Aabb2D::from_xywh(x, y, 100.0, 100.0)
            })
            .collect();
        group.throughput(Throughput::Elements(queries.len() as u64));
        group.bench_function(format!("quadtree_n{n}"), |b| {
            b.iter(|| {
                let hits: usize = queries.iter().map(|&q| tree.query_rect(q).count()).sum();
                black_box(hits);
            });
        });
        group.bench_function(format!("scan_n{n}"), |b| {
            b.iter(|| {
                let hits: usize = queries.iter().map(|&q| scan_rect(&rects, q)).sum();
                black_box(hits);
            });
        });
    }
    group.finish();

    let mut group = c.benchmark_group("query_point");
    let rects = gen_random_rects(10_000, 2000.0, 8.0);
    let tree = build_tree(&rects, 8);
    group.bench_function("quadtree_n10000", |b| {
        let mut rng = Rng::new(0xFACE_FEED_CAFE_BABE);
        b.iter(|| {
            let x = rng.next_f64() * 2000.0;
            let y = rng.next_f64() * 2000.0;
            black_box(tree.query_point(x, y).count());
        });
    });
    group.finish();
}

fn bench_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("move");
    let n = 5_000usize;
    group.throughput(Throughput::Elements(n as u64));
    group.bench_function("jitter_n5000", |b| {
        b.iter_batched(
            || {
                let mut tree: QuadTree<f64, u32> =
                    QuadTree::new(Aabb2D::new(0.0, 0.0, 2000.0, 2000.0), 8);
                let mut rng = Rng::new(0x5EED_0000_0000_0001);
                let keys: Vec<MovableKey> = (0..n)
                    .map(|i| {
                        let m = Motion::new(
                            rng.next_f64() * 2000.0,
                            rng.next_f64() * 2000.0,
                            6.0,
                            6.0,
                        );
                        tree.insert_movable(m, i as u32)
                    })
                    .collect();
                (tree, keys, rng)
            },
            |(mut tree, keys, mut rng)| {
                for &k in &keys {
                    let Some(m) = tree.motion(k) else { continue };
                    let dx = (rng.next_f64() - 0.5) * 20.0;
                    let dy = (rng.next_f64() - 0.5) * 20.0;
                    tree.move_to(k, m.x + dx, m.y + dy);
                }
                black_box(tree.len());
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_query, bench_move);
criterion_main!(benches);
