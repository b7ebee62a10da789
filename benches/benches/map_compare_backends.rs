// Copyright 2026 the Pointmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use pointmap_index::{Point, Point3, PointMap3, PointMapGeneric, Precision};

const EPS: f64 = 1e-9;

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

fn gen_sorted_points(count: usize, step: f64) -> Vec<Point3> {
    (0..count)
        .map(|i| {
            let f = i as f64 * step;
            Point::xyz(f, f * 0.5, f * 0.25)
        })
        .collect()
}

fn gen_clustered_points(n_clusters: usize, per_cluster: usize, spread: f64) -> Vec<Point3> {
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let mut centers = Vec::with_capacity(n_clusters);
    for _ in 0..n_clusters {
        centers.push((
            rng.next_f64() * 2000.0,
            rng.next_f64() * 2000.0,
            rng.next_f64() * 2000.0,
        ));
    }
    for (cx, cy, cz) in centers {
        for _ in 0..per_cluster {
            out.push(Point::xyz(
                cx + (rng.next_f64() - 0.5) * spread,
                cy + (rng.next_f64() - 0.5) * spread,
                cz + (rng.next_f64() - 0.5) * spread,
            ));
        }
    }
    out
}

/// Insert every point, then probe every point back. Shared workload so the
/// backend groups stay comparable.
macro_rules! bench_put_get {
    ($group:expr, $name:expr, $ctor:expr, $points:expr) => {
        $group.bench_function($name, |b| {
            b.iter_batched(
                $ctor,
                |mut map| {
                    for (i, p) in $points.iter().copied().enumerate() {
                        let _ = map.put(p, i as u32);
                    }
                    let mut hits = 0usize;
                    for p in $points.iter() {
                        if map.get(p).is_some() {
                            hits += 1;
                        }
                    }
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });
    };
}

fn bench_kd(c: &mut Criterion) {
    let mut group = c.benchmark_group("kd");
    for &n in &[1024usize, 4096] {
        let points = gen_uniform_points(n, 2000.0);
        group.throughput(Throughput::Elements(n as u64));
        bench_put_get!(
            group,
            format!("put_get_uniform_n{}", n),
            || PointMap3::<u32>::new(Precision::new(EPS)),
            points
        );
    }
    group.finish();
}

fn bench_rebuild_kd(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild_kd");
    for &n in &[1024usize, 4096] {
        let points = gen_uniform_points(n, 2000.0);
        group.throughput(Throughput::Elements(n as u64));
        bench_put_get!(
            group,
            format!("put_get_uniform_n{}", n),
            || PointMapGeneric::<3, u32, _>::with_rebuilding_kd_tree(Precision::new(EPS)),
            points
        );
    }
    // Sorted input is the plain kd-tree's worst case; the rebuilding tree
    // exists for exactly this shape.
    let points = gen_sorted_points(4096, 0.5);
    group.throughput(Throughput::Elements(points.len() as u64));
    bench_put_get!(
        group,
        "put_get_sorted",
        || PointMapGeneric::<3, u32, _>::with_rebuilding_kd_tree(Precision::new(EPS)),
        points
    );
    group.finish();
}

fn bench_bucket_kd(c: &mut Criterion) {
    let mut group = c.benchmark_group("bucket_kd");
    for &n in &[1024usize, 4096] {
        let points = gen_uniform_points(n, 2000.0);
        group.throughput(Throughput::Elements(n as u64));
        bench_put_get!(
            group,
            format!("put_get_uniform_n{}", n),
            || PointMapGeneric::<3, u32, _>::with_bucket_kd_tree(Precision::new(EPS)),
            points
        );
    }
    let points = gen_sorted_points(4096, 0.5);
    group.throughput(Throughput::Elements(points.len() as u64));
    bench_put_get!(
        group,
        "put_get_sorted",
        || PointMapGeneric::<3, u32, _>::with_bucket_kd_tree(Precision::new(EPS)),
        points
    );
    group.finish();
}

fn bench_octree(c: &mut Criterion) {
    let mut group = c.benchmark_group("octree");
    for &n in &[1024usize, 4096] {
        let points = gen_uniform_points(n, 2000.0);
        group.throughput(Throughput::Elements(n as u64));
        bench_put_get!(
            group,
            format!("put_get_uniform_n{}", n),
            || PointMapGeneric::<3, u32, _>::with_octree(Precision::new(EPS)),
            points
        );
    }
    group.finish();
}

fn bench_bucket_kd_clustered(c: &mut Criterion) {
    let mut group = c.benchmark_group("bucket_kd_clustered");
    let points = gen_clustered_points(16, 256, 32.0);
    group.throughput(Throughput::Elements(points.len() as u64));
    bench_put_get!(
        group,
        "put_get",
        || PointMapGeneric::<3, u32, _>::with_bucket_kd_tree(Precision::new(EPS)),
        points
    );
    group.finish();
}

fn bench_octree_clustered(c: &mut Criterion) {
    let mut group = c.benchmark_group("octree_clustered");
    let points = gen_clustered_points(16, 256, 32.0);
    group.throughput(Throughput::Elements(points.len() as u64));
    bench_put_get!(
        group,
        "put_get",
        || PointMapGeneric::<3, u32, _>::with_octree(Precision::new(EPS)),
        points
    );
    group.finish();
}

fn bench_remove_heavy_bucket_kd(c: &mut Criterion) {
    let mut group = c.benchmark_group("bucket_kd_remove_heavy");
    let points = gen_uniform_points(4096, 2000.0);
    group.throughput(Throughput::Elements(points.len() as u64));
    group.bench_function("remove_half_then_get", |b| {
        b.iter_batched(
            || {
                let mut map =
                    PointMapGeneric::<3, u32, _>::with_bucket_kd_tree(Precision::new(EPS));
                for (i, p) in points.iter().copied().enumerate() {
                    let _ = map.put(p, i as u32);
                }
                map
            },
            |mut map| {
                for p in points.iter().step_by(2) {
                    let _ = map.remove(p);
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
    group.finish();
}

criterion_group!(
    benches,
    bench_kd,
    bench_rebuild_kd,
    bench_bucket_kd,
    bench_octree,
    bench_bucket_kd_clustered,
    bench_octree_clustered,
    bench_remove_heavy_bucket_kd,
);
criterion_main!(benches);
