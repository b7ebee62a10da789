// Copyright 2026 the Pointmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointmap Index: a map from floating-point points to values with
//! tolerance-based key identity.
//!
//! Coordinates produced by geometric computation rarely match bit for bit;
//! two runs of the same intersection can disagree in the last few ulps. This
//! crate treats two keys as the same key when every coordinate pair differs
//! by at most an epsilon, so such near-duplicates collapse into one entry.
//!
//! - Insert, look up, and remove values keyed by `N`-dimensional points.
//! - Resolve a query point to the exact coordinates stored for it.
//! - Iterate entries by ascending distance from a query point.
//! - Backends are pluggable via the [`Store`] trait; four tree variants are
//!   provided.
//!
//! # Example
//!
//! ```rust
//! use pointmap_index::{PointMap3, Point, Precision};
//!
//! let mut map: PointMap3<u32> = PointMap3::new(Precision::new(1e-6));
//! map.put(Point::xyz(1.0, 2.0, 3.0), 1).unwrap();
//!
//! // A key within tolerance is the same key: this updates, not inserts.
//! let old = map.put(Point::xyz(1.0 + 1e-9, 2.0, 3.0), 2).unwrap();
//! assert_eq!(old, Some(1));
//! assert_eq!(map.size(), 1);
//!
//! // Lookups resolve to the coordinates stored first.
//! let stored = map.resolve_key(&Point::xyz(1.0 + 1e-9, 2.0, 3.0)).unwrap();
//! assert_eq!(stored.coords(), [1.0, 2.0, 3.0]);
//! ```
//!
//! Backends other than the default plain kd-tree are picked at construction:
//!
//! ```rust
//! use pointmap_index::{BucketKdTree, Point, PointMapGeneric, Precision};
//!
//! let mut map: PointMapGeneric<3, u32, BucketKdTree<3, u32>> =
//!     PointMapGeneric::with_bucket_kd_tree(Precision::new(1e-6));
//! map.put(Point::xyz(0.0, 0.0, 0.0), 7).unwrap();
//! assert_eq!(map.get(&Point::xyz(0.0, 0.0, 0.0)), Some(&7));
//! ```
//!
//! ## Choosing a backend
//!
//! - [`KdTree`] (default): one entry per node, no rebalancing. Smallest and
//!   simplest; degrades to a list under sorted insertion order.
//! - [`RebuildKdTree`]: plain kd-tree plus watermark-triggered full rebuilds.
//!   Immune to degenerate orders at the cost of occasional O(n log n) stalls.
//! - [`BucketKdTree`]: entries buffered in leaf buckets, splits on the widest
//!   axis, removals condensed lazily. The best all-round choice for mixed
//!   insert/remove workloads.
//! - [`Octree`]: 3D only; leaves split into eight children around the
//!   centroid of their points. Competitive on spatially clustered data.
//!
//! ### Float semantics
//!
//! Keys must be finite; [`PointMapGeneric::put`] rejects NaN and infinite
//! coordinates, and lookups with such keys miss. Tolerance equality is not
//! transitive, so the entry a key resolves to can depend on insertion order
//! when keys sit within epsilon of each other in a chain.

#![no_std]

extern crate alloc;

pub mod backends;
pub mod entry;
pub mod map;
pub mod point;
pub mod precision;
pub mod store;

pub use backends::bucket::{BucketKdTree, DEFAULT_BUCKET_CAPACITY};
pub use backends::kd::KdTree;
pub use backends::octree::{Octree, DEFAULT_LEAF_CAPACITY};
pub use backends::rebuild::RebuildKdTree;
pub use entry::PointEntry;
pub use map::{NonFinitePointError, PointMap, PointMap3, PointMapGeneric};
pub use point::{Point, Point3};
pub use precision::{Precision, DEFAULT_EPSILON};
pub use store::Store;
