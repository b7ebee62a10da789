// Copyright 2026 the Pointmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tolerance comparator used for every coordinate decision in the trees.

use core::cmp::Ordering;

/// Default epsilon used by [`Precision::default`].
pub const DEFAULT_EPSILON: f64 = 1e-10;

/// An epsilon-band comparator over `f64` scalars.
///
/// Two values compare [`Ordering::Equal`] when they differ by at most the
/// epsilon fixed at construction. The resulting relation is reflexive and
/// symmetric but not transitive: `a ~ b` and `b ~ c` do not imply `a ~ c`.
/// That hazard is inherent to tolerance comparison and is tolerated by the
/// tree backends rather than worked around.
///
/// Assumes no NaNs for compared values. Debug builds may assert.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Precision {
    eps: f64,
}

impl Precision {
    /// Create a comparator with the given epsilon.
    ///
    /// # Panics
    ///
    /// Panics if `eps` is negative or not finite.
    pub fn new(eps: f64) -> Self {
        assert!(
            eps.is_finite() && eps >= 0.0,
            "epsilon must be finite and non-negative"
        );
        Self { eps }
    }

    /// The epsilon this comparator was constructed with.
    pub const fn epsilon(&self) -> f64 {
        self.eps
    }

    /// Tri-state tolerant comparison of `a` against `b`.
    pub fn cmp(&self, a: f64, b: f64) -> Ordering {
        debug_assert!(!a.is_nan() && !b.is_nan(), "comparison inputs must not be NaN");
        if (a - b).abs() <= self.eps {
            Ordering::Equal
        } else if a < b {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }

    /// Whether `a` and `b` are equal within tolerance.
    pub fn eq(&self, a: f64, b: f64) -> bool {
        self.cmp(a, b) == Ordering::Equal
    }

    /// Whether `a` is strictly below the tolerance band around `b`.
    pub fn lt(&self, a: f64, b: f64) -> bool {
        self.cmp(a, b) == Ordering::Less
    }

    /// Whether `a` is below or within the tolerance band around `b`.
    pub fn le(&self, a: f64, b: f64) -> bool {
        self.cmp(a, b) != Ordering::Greater
    }

    /// Whether `a` is strictly above the tolerance band around `b`.
    pub fn gt(&self, a: f64, b: f64) -> bool {
        self.cmp(a, b) == Ordering::Greater
    }

    /// Whether `a` is above or within the tolerance band around `b`.
    pub fn ge(&self, a: f64, b: f64) -> bool {
        self.cmp(a, b) != Ordering::Less
    }

    /// Tolerant sign of `v`: `-1`, `0`, or `1`.
    pub fn signum(&self, v: f64) -> i32 {
        match self.cmp(v, 0.0) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::new(DEFAULT_EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges() {
        let p = Precision::new(1e-6);
        assert_eq!(p.cmp(1.0, 1.0), Ordering::Equal);
        assert_eq!(p.cmp(1.0, 1.0 + 1e-7), Ordering::Equal);
        assert_eq!(p.cmp(1.0, 1.0 + 1e-5), Ordering::Less);
        assert_eq!(p.cmp(1.0 + 1e-5, 1.0), Ordering::Greater);
    }

    #[test]
    fn helpers_agree_with_cmp() {
        let p = Precision::new(0.5);
        assert!(p.eq(1.0, 1.4));
        assert!(p.lt(1.0, 2.0));
        assert!(p.le(1.0, 1.4));
        assert!(p.gt(2.0, 1.0));
        assert!(p.ge(1.4, 1.0));
        assert_eq!(p.signum(0.4), 0);
        assert_eq!(p.signum(-0.6), -1);
        assert_eq!(p.signum(0.6), 1);
    }

    #[test]
    fn equality_is_not_transitive() {
        // The known hazard: a ~ b and b ~ c while a and c differ.
        let p = Precision::new(1.0);
        assert!(p.eq(0.0, 0.9));
        assert!(p.eq(0.9, 1.8));
        assert!(!p.eq(0.0, 1.8));
    }

    #[test]
    #[should_panic(expected = "epsilon must be finite and non-negative")]
    fn rejects_negative_epsilon() {
        let _ = Precision::new(-1.0);
    }
}
