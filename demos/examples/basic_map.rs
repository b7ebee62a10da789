// Copyright 2026 the Pointmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point map basics.
//!
//! Insert a few points, collapse a near-duplicate, resolve a key, and walk
//! entries by distance.
//!
//! Run:
//! - `cargo run -p pointmap_demos --example basic_map`

use pointmap_index::{Point, PointMap3, Precision};

fn main() {
    let mut map: PointMap3<&str> = PointMap3::new(Precision::new(1e-6));

    map.put(Point::xyz(0.0, 0.0, 0.0), "origin").unwrap();
    map.put(Point::xyz(10.0, 0.0, 0.0), "east").unwrap();
    map.put(Point::xyz(0.0, 10.0, 0.0), "north").unwrap();

    // A key within tolerance of "origin" updates that entry in place.
    let old = map.put(Point::xyz(1e-9, -1e-9, 0.0), "origin v2").unwrap();
    println!("replaced: {old:?}");
    assert_eq!(old, Some("origin"));
    assert_eq!(map.size(), 3);

    // The stored coordinates are the ones inserted first.
    let stored = map.resolve_key(&Point::xyz(1e-9, 0.0, 0.0)).unwrap();
    println!("stored key: {:?}", stored.coords());
    assert_eq!(stored.coords(), [0.0, 0.0, 0.0]);

    // Entries ordered by distance from a query point.
    for (key, value) in map.iter_from(&Point::xyz(8.0, 1.0, 0.0)) {
        println!("{value:12} at {:?}", key.coords());
    }
    let (_, nearest) = map.nearest(&Point::xyz(8.0, 1.0, 0.0)).unwrap();
    assert_eq!(*nearest, "east");
}
