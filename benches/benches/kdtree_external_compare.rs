// Copyright 2026 the Pointmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use pointmap_index::{Point, Point3, PointMapGeneric, Precision};

use rstar::RTree;

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

fn gen_uniform_points(count: usize, extent: f64) -> Vec<Point3> {
    let mut out = Vec::with_capacity(count);
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    for _ in 0..count {
        out.push(Point::xyz(
            rng.next_f64() * extent,
            rng.next_f64() * extent,
            rng.next_f64() * extent,
        ));
    }
    out
}

fn to_rstar_points(v: &[Point3]) -> Vec<[f64; 3]> {
    v.iter().map(|p| p.coords()).collect()
}

fn bench_kdtree_external_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("kdtree_external_compare");
    for &n in &[1024usize, 4096] {
        let points = gen_uniform_points(n, 2000.0);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_function(format!("pointmap_build_probe_n{}", n), |b| {
            b.iter_batched(
                || PointMapGeneric::<3, u32, _>::with_bucket_kd_tree(Precision::new(1e-9)),
                |mut map| {
                    for (i, p) in points.iter().copied().enumerate() {
                        let _ = map.put(p, i as u32);
                    }
                    let mut hits = 0usize;
                    for p in points.iter() {
                        if map.get(p).is_some() {
                            hits += 1;
                        }
                    }
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("rstar_build_probe_bulk_n{}", n), |b| {
            b.iter_batched(
                || to_rstar_points(&points),
                |pts| {
                    let probes = pts.clone();
                    let tree = RTree::bulk_load(pts);
                    let mut hits = 0usize;
                    for p in &probes {
                        if tree.locate_at_point(p).is_some() {
                            hits += 1;
                        }
                    }
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("rstar_nearest_n{}", n), |b| {
            b.iter_batched(
                || RTree::bulk_load(to_rstar_points(&points)),
                |tree| {
                    let mut acc = 0.0_f64;
                    for p in tree.iter().take(256) {
                        if let Some(q) = tree.nearest_neighbor(p) {
                            acc += q[0];
                        }
                    }
                    black_box(acc);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_kdtree_external_compare);
criterion_main!(benches);
