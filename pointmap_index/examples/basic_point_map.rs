// Copyright 2026 the Pointmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Pointmap Index: insert, tolerant update, and lookup.

use pointmap_index::{Point, PointMap3, Precision};

fn main() {
    let mut map: PointMap3<u32> = PointMap3::new(Precision::new(1e-6));
    map.put(Point::xyz(1.0, 2.0, 3.0), 1).unwrap();
    map.put(Point::xyz(4.0, 5.0, 6.0), 2).unwrap();

    // A near-duplicate key updates the existing entry
    let old = map.put(Point::xyz(1.0 + 1e-9, 2.0, 3.0), 3).unwrap();
    println!("replaced: {:?}, size: {}", old, map.size());

    // Look up with a slightly different key
    println!("value: {:?}", map.get(&Point::xyz(1.0, 2.0 - 1e-9, 3.0)));
}
