// Copyright 2026 the Pointmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Map front-end: key validation and proximity queries over a [`Store`].

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::marker::PhantomData;

use crate::backends::bucket::BucketKdTree;
use crate::backends::kd::KdTree;
use crate::backends::octree::Octree;
use crate::backends::rebuild::RebuildKdTree;
use crate::point::Point;
use crate::precision::Precision;
use crate::store::Store;

/// Error returned by [`PointMapGeneric::put`] when a key coordinate is NaN
/// or infinite.
///
/// Non-finite coordinates have no usable ordering under the tolerance
/// comparator, so they are rejected at the boundary instead of corrupting
/// tree structure.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NonFinitePointError;

impl core::fmt::Display for NonFinitePointError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "point key has a non-finite coordinate")
    }
}

impl core::error::Error for NonFinitePointError {}

/// A map from `N`-dimensional points to values, with tolerance-based key
/// identity, generic over its tree backend.
///
/// Two keys are the same key when every coordinate pair compares equal under
/// the backend's [`Precision`]. Lookups and removals accept any key within
/// tolerance of the stored one; [`PointMapGeneric::resolve_key`] recovers the
/// coordinates actually stored.
pub struct PointMapGeneric<const N: usize, V, S: Store<N, V>> {
    store: S,
    marker: PhantomData<V>,
}

/// Map backed by the plain kd-tree.
pub type PointMap<const N: usize, V> = PointMapGeneric<N, V, KdTree<N, V>>;

/// Three-dimensional map backed by the plain kd-tree.
pub type PointMap3<V> = PointMap<3, V>;

impl<const N: usize, V> PointMapGeneric<N, V, KdTree<N, V>> {
    /// Create an empty map backed by a plain kd-tree.
    pub fn new(precision: Precision) -> Self {
        Self::from_store(KdTree::new(precision))
    }
}

impl<const N: usize, V> PointMapGeneric<N, V, RebuildKdTree<N, V>> {
    /// Create an empty map backed by the self-rebalancing kd-tree.
    pub fn with_rebuilding_kd_tree(precision: Precision) -> Self {
        Self::from_store(RebuildKdTree::new(precision))
    }
}

impl<const N: usize, V> PointMapGeneric<N, V, BucketKdTree<N, V>> {
    /// Create an empty map backed by the bucketed kd-tree.
    pub fn with_bucket_kd_tree(precision: Precision) -> Self {
        Self::from_store(BucketKdTree::new(precision))
    }

    /// Create an empty map backed by the bucketed kd-tree with an explicit
    /// bucket capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_bucket_kd_tree_capacity(precision: Precision, capacity: usize) -> Self {
        Self::from_store(BucketKdTree::with_capacity(precision, capacity))
    }
}

impl<V> PointMapGeneric<3, V, Octree<V>> {
    /// Create an empty 3D map backed by the centroid-split octree.
    pub fn with_octree(precision: Precision) -> Self {
        Self::from_store(Octree::new(precision))
    }
}

impl<const N: usize, V, S: Store<N, V>> PointMapGeneric<N, V, S> {
    /// Wrap an existing backend.
    pub const fn from_store(store: S) -> Self {
        Self {
            store,
            marker: PhantomData,
        }
    }

    /// Shared access to the backend.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Exclusive access to the backend.
    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Number of entries.
    pub fn size(&self) -> usize {
        self.store.len()
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Insert `value` under `key`, or update the entry whose key is within
    /// tolerance of `key`. Returns the previous value on update.
    ///
    /// Updating keeps the originally stored key; only the value changes.
    ///
    /// # Errors
    ///
    /// [`NonFinitePointError`] when any coordinate of `key` is NaN or
    /// infinite. The map is unchanged and `value` is dropped.
    pub fn put(&mut self, key: Point<N>, value: V) -> Result<Option<V>, NonFinitePointError> {
        if !key.is_finite() {
            return Err(NonFinitePointError);
        }
        Ok(self.store.insert(key, value))
    }

    /// The value stored under a key within tolerance of `key`.
    ///
    /// A non-finite `key` matches nothing.
    pub fn get(&self, key: &Point<N>) -> Option<&V> {
        if !key.is_finite() {
            return None;
        }
        self.store.get(key)
    }

    /// The stored key within tolerance of `key`, with its exact coordinates.
    pub fn resolve_key(&self, key: &Point<N>) -> Option<&Point<N>> {
        self.resolve_entry(key).map(|(k, _)| k)
    }

    /// The stored `(key, value)` pair within tolerance of `key`.
    pub fn resolve_entry(&self, key: &Point<N>) -> Option<(&Point<N>, &V)> {
        if !key.is_finite() {
            return None;
        }
        self.store.entry(key)
    }

    /// Remove the entry whose key is within tolerance of `key`, returning
    /// its value. A miss (including a non-finite `key`) returns `None` and
    /// leaves the map unchanged.
    pub fn remove(&mut self, key: &Point<N>) -> Option<V> {
        if !key.is_finite() {
            return None;
        }
        self.store.remove(key)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Iterate over all entries in backend-specific order.
    pub fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = (&'a Point<N>, &'a V)> + 'a> {
        self.store.iter()
    }

    /// Iterate over all entries ordered by ascending squared distance from
    /// `from`. Ties keep the backend's traversal order.
    pub fn iter_from<'a>(
        &'a self,
        from: &Point<N>,
    ) -> Box<dyn Iterator<Item = (&'a Point<N>, &'a V)> + 'a> {
        let from = *from;
        let mut out: Vec<(&'a Point<N>, &'a V)> = self.store.iter().collect();
        out.sort_by(|a, b| from.dist_sq(a.0).total_cmp(&from.dist_sq(b.0)));
        Box::new(out.into_iter())
    }

    /// The entry nearest to `from` by squared distance, if the map is
    /// non-empty.
    pub fn nearest<'a>(&'a self, from: &Point<N>) -> Option<(&'a Point<N>, &'a V)> {
        self.store
            .iter()
            .min_by(|a, b| from.dist_sq(a.0).total_cmp(&from.dist_sq(b.0)))
    }

    /// Indented listing of the backend's tree structure. Debugging aid, not
    /// a stable format.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.store.dump(&mut out);
        out
    }
}

impl<const N: usize, V, S: Store<N, V> + Default> Default for PointMapGeneric<N, V, S> {
    fn default() -> Self {
        Self::from_store(S::default())
    }
}

impl<const N: usize, V, S: Store<N, V> + core::fmt::Debug> core::fmt::Debug
    for PointMapGeneric<N, V, S>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PointMapGeneric")
            .field("store", &self.store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn put_rejects_non_finite_keys_without_mutation() {
        let mut map: PointMap3<u32> = PointMap::new(Precision::new(1e-6));
        map.put(Point::xyz(1.0, 2.0, 3.0), 1).expect("finite key");
        assert_eq!(
            map.put(Point::xyz(f64::NAN, 0.0, 0.0), 2),
            Err(NonFinitePointError)
        );
        assert_eq!(
            map.put(Point::xyz(0.0, f64::INFINITY, 0.0), 3),
            Err(NonFinitePointError)
        );
        assert_eq!(map.size(), 1);
    }

    #[test]
    fn non_finite_lookups_miss_quietly() {
        let mut map: PointMap3<u32> = PointMap::new(Precision::new(1e-6));
        map.put(Point::xyz(0.0, 0.0, 0.0), 1).expect("finite key");
        let nan = Point::xyz(f64::NAN, f64::NAN, f64::NAN);
        assert_eq!(map.get(&nan), None);
        assert_eq!(map.resolve_key(&nan), None);
        assert_eq!(map.remove(&nan), None);
        assert_eq!(map.size(), 1);
    }

    #[test]
    fn resolve_key_returns_stored_coordinates() {
        let mut map: PointMap3<&str> = PointMap::new(Precision::new(1e-6));
        let stored = Point::xyz(1.0, 2.0, 3.0);
        map.put(stored, "a").expect("finite key");
        let probe = Point::xyz(1.0 + 1e-9, 2.0, 3.0 - 1e-9);
        let resolved = map.resolve_key(&probe).expect("within tolerance");
        assert_eq!(resolved.coords(), stored.coords());
        // Updating through the probe keeps the original key.
        assert_eq!(map.put(probe, "b"), Ok(Some("a")));
        assert_eq!(
            map.resolve_key(&stored).expect("still present").coords(),
            stored.coords()
        );
    }

    #[test]
    fn iter_from_orders_by_distance() {
        let mut map: PointMap3<u32> = PointMap::new(Precision::new(1e-6));
        for (i, p) in [
            Point::xyz(5.0, 0.0, 0.0),
            Point::xyz(1.0, 0.0, 0.0),
            Point::xyz(3.0, 0.0, 0.0),
        ]
        .into_iter()
        .enumerate()
        {
            map.put(p, i as u32).expect("finite key");
        }
        let order: Vec<u32> = map
            .iter_from(&Point::xyz(0.0, 0.0, 0.0))
            .map(|(_, v)| *v)
            .collect();
        assert_eq!(order, [1, 2, 0]);
        assert_eq!(
            map.nearest(&Point::xyz(4.9, 0.0, 0.0)).map(|(_, v)| *v),
            Some(0)
        );
        let empty: PointMap3<u32> = PointMap::new(Precision::new(1e-6));
        assert!(empty.nearest(&Point::xyz(0.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn backend_constructors_share_the_front_end() {
        let mut bucket = PointMapGeneric::<3, u32, _>::with_bucket_kd_tree(Precision::new(1e-6));
        let mut octree = PointMapGeneric::<3, u32, _>::with_octree(Precision::new(1e-6));
        let mut rebuild =
            PointMapGeneric::<3, u32, _>::with_rebuilding_kd_tree(Precision::new(1e-6));
        for i in 0..20_u32 {
            let f = f64::from(i);
            let p = Point::xyz(f, -f, f * 0.5);
            assert_eq!(bucket.put(p, i).expect("finite"), None);
            assert_eq!(octree.put(p, i).expect("finite"), None);
            assert_eq!(rebuild.put(p, i).expect("finite"), None);
        }
        assert_eq!(bucket.size(), 20);
        assert_eq!(octree.size(), 20);
        assert_eq!(rebuild.size(), 20);
        assert_eq!(bucket.remove(&Point::xyz(7.0, -7.0, 3.5)), Some(7));
        assert_eq!(octree.remove(&Point::xyz(7.0, -7.0, 3.5)), Some(7));
        assert_eq!(rebuild.remove(&Point::xyz(7.0, -7.0, 3.5)), Some(7));
    }

    #[test]
    fn dump_is_non_empty_for_populated_maps() {
        let mut map: PointMap3<u32> = PointMap::new(Precision::new(1e-6));
        map.put(Point::xyz(1.0, 2.0, 3.0), 1).expect("finite key");
        assert!(!map.dump().is_empty());
    }
}
