// Copyright 2026 the Pointmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-dimension coordinate tuples used as map keys.

use crate::precision::Precision;

/// A point with `N` `f64` coordinates.
///
/// The derived `PartialEq` is bitwise and exists for tests and collections;
/// key identity inside the maps is always the tolerance relation
/// [`Point::eq_within`], never bit equality.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point<const N: usize>(pub [f64; N]);

/// A point in three dimensions.
pub type Point3 = Point<3>;

impl<const N: usize> Point<N> {
    /// Create a point from its coordinate array.
    pub const fn new(coords: [f64; N]) -> Self {
        Self(coords)
    }

    /// The coordinate array.
    pub const fn coords(&self) -> [f64; N] {
        self.0
    }

    /// Projection of the point onto the given axis.
    ///
    /// # Panics
    ///
    /// Panics if `axis >= N`.
    pub fn coord(&self, axis: usize) -> f64 {
        self.0[axis]
    }

    /// Whether every coordinate is finite (no NaN or infinity).
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }

    /// Whole-tuple tolerance equality: every axis compares equal under `precision`.
    pub fn eq_within(&self, other: &Self, precision: &Precision) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| precision.eq(*a, *b))
    }

    /// Squared Euclidean distance to `other`.
    pub fn dist_sq(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }

    /// Per-axis mean of a collection of points. `None` when the collection is empty.
    pub fn centroid<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut acc = [0.0; N];
        let mut count = 0_usize;
        for p in points {
            for (a, c) in acc.iter_mut().zip(p.0.iter()) {
                *a += c;
            }
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let div = count as f64;
        for a in &mut acc {
            *a /= div;
        }
        Some(Self(acc))
    }
}

impl Point<2> {
    /// Create a 2D point.
    pub const fn xy(x: f64, y: f64) -> Self {
        Self([x, y])
    }
}

impl Point<3> {
    /// Create a 3D point.
    pub const fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self([x, y, z])
    }
}

impl<const N: usize> From<[f64; N]> for Point<N> {
    fn from(coords: [f64; N]) -> Self {
        Self(coords)
    }
}
