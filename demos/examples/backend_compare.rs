// Copyright 2026 the Pointmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend comparison.
//!
//! Feed the same workload to all four backends and print each tree's
//! structure dump, showing how insertion order and bucketing shape them.
//!
//! Run:
//! - `cargo run -p pointmap_demos --example backend_compare`

use pointmap_index::{Point, Point3, PointMap3, PointMapGeneric, Precision, Store};

fn workload() -> Vec<Point3> {
    // Ascending x: worst case for the plain kd-tree, routine for the rest.
    (0..12)
        .map(|i| {
            let f = f64::from(i);
            Point::xyz(f * 2.0, (f * 7.0) % 5.0, (f * 3.0) % 4.0)
        })
        .collect()
}

fn run<S: Store<3, u32>>(name: &str, map: &mut PointMapGeneric<3, u32, S>) {
    for (i, p) in workload().into_iter().enumerate() {
        map.put(p, i as u32).unwrap();
    }
    println!("== {name} ({} entries) ==", map.size());
    println!("{}", map.dump());
}

fn main() {
    let precision = Precision::new(1e-6);

    let mut kd: PointMap3<u32> = PointMap3::new(precision);
    run("plain kd-tree", &mut kd);

    let mut rebuild = PointMapGeneric::with_rebuilding_kd_tree(precision);
    run("rebuilding kd-tree", &mut rebuild);

    let mut bucket = PointMapGeneric::with_bucket_kd_tree_capacity(precision, 4);
    run("bucket kd-tree", &mut bucket);

    let mut octree = PointMapGeneric::with_octree(precision);
    run("octree", &mut octree);
}
