// Copyright 2026 the Pointmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Key/value entries stored by the tree backends.

use crate::point::Point;

/// A `(key, value)` pair. The key is immutable once created; the value can be
/// replaced in place when an equivalent key is inserted again.
#[derive(Clone, Debug)]
pub struct PointEntry<const N: usize, V> {
    key: Point<N>,
    value: V,
}

impl<const N: usize, V> PointEntry<N, V> {
    /// Create an entry.
    pub const fn new(key: Point<N>, value: V) -> Self {
        Self { key, value }
    }

    /// The entry's key.
    pub const fn key(&self) -> &Point<N> {
        &self.key
    }

    /// The entry's value.
    pub const fn value(&self) -> &V {
        &self.value
    }

    /// Mutable access to the value.
    pub const fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Replace the value, returning the previous one.
    pub fn replace_value(&mut self, value: V) -> V {
        core::mem::replace(&mut self.value, value)
    }

    /// Consume the entry, returning the value.
    pub fn into_value(self) -> V {
        self.value
    }

    /// Consume the entry, returning key and value.
    pub fn into_parts(self) -> (Point<N>, V) {
        (self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_returns_previous_value() {
        let mut e = PointEntry::new(Point::xyz(1.0, 2.0, 3.0), 7_u32);
        assert_eq!(e.replace_value(9), 7);
        assert_eq!(*e.value(), 9);
        assert_eq!(e.into_parts().1, 9);
    }
}
