// Copyright 2026 the Pointmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend trait implemented by every tree variant.

use alloc::boxed::Box;
use alloc::string::String;

use crate::point::Point;

/// Associative-store abstraction used by
/// [`PointMapGeneric`](crate::map::PointMapGeneric).
///
/// Backends may assume keys are finite tuples; the front-end validates them.
/// Key identity is the backend's tolerance relation, never bit equality, so
/// the key passed to `get`/`remove` and the key actually stored may differ
/// within tolerance.
pub trait Store<const N: usize, V> {
    /// Number of live entries. O(1).
    fn len(&self) -> usize;

    /// Whether the store holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or update. Returns the previous value when an equivalent key
    /// already existed.
    fn insert(&mut self, key: Point<N>, value: V) -> Option<V>;

    /// The stored `(key, value)` pair equivalent to `key`, if any.
    fn entry(&self, key: &Point<N>) -> Option<(&Point<N>, &V)>;

    /// The value mapped to a key equivalent to `key`, if any.
    fn get(&self, key: &Point<N>) -> Option<&V> {
        self.entry(key).map(|(_, v)| v)
    }

    /// Remove the entry equivalent to `key`, returning its value. A miss is
    /// not an error and leaves the store unchanged.
    fn remove(&mut self, key: &Point<N>) -> Option<V>;

    /// Remove every entry.
    fn clear(&mut self);

    /// Iterate over all live entries. Order is backend-specific.
    fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = (&'a Point<N>, &'a V)> + 'a>;

    /// Append a human-readable, indented listing of the tree structure to
    /// `out`. Debugging aid, not a stable format.
    fn dump(&self, out: &mut String);
}
