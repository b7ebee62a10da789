// Copyright 2026 the Pointmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bucketed kd-tree backend: leaves buffer entries until a capacity-triggered
//! split, and removals condense the tree lazily.
//!
//! Internal cut nodes carry only a splitting dimension and value; all entries
//! live in leaf buckets. A bucket that grows past its capacity splits on the
//! widest axis of its bounding box at the median coordinate. Removals that
//! empty a bucket mark the ancestor chain "condense pending"; the marks are
//! collected by a deferred bottom-up pass instead of restructuring on every
//! single removal.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Write as _;

use crate::entry::PointEntry;
use crate::point::Point;
use crate::precision::Precision;
use crate::store::Store;

/// Default number of entries a bucket holds before it splits.
pub const DEFAULT_BUCKET_CAPACITY: usize = 10;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct NodeIdx(usize);

impl NodeIdx {
    const fn new(i: usize) -> Self {
        Self(i)
    }

    const fn get(self) -> usize {
        self.0
    }
}

enum Kind<const N: usize, V> {
    Bucket(Vec<PointEntry<N, V>>),
    Cut {
        dim: usize,
        value: f64,
        left: NodeIdx,
        right: NodeIdx,
    },
}

struct Node<const N: usize, V> {
    parent: Option<NodeIdx>,
    /// Set when a removal emptied a bucket somewhere in this subtree.
    pending: bool,
    kind: Kind<N, V>,
}

/// Bucketed kd-tree with lazy condensing.
///
/// The root is never absent: an empty tree is a single empty bucket. Entries
/// with a coordinate tolerance-equal to a cut value may live on either side
/// of the cut; strictly smaller coordinates are always on the left and
/// greater-or-equal ones on the right.
pub struct BucketKdTree<const N: usize, V> {
    precision: Precision,
    capacity: usize,
    root: NodeIdx,
    arena: Vec<Option<Node<N, V>>>,
    free: Vec<usize>,
    len: usize,
    /// Whether any condense marks are outstanding.
    dirty: bool,
}

impl<const N: usize, V> BucketKdTree<N, V> {
    /// Create an empty tree with [`DEFAULT_BUCKET_CAPACITY`].
    pub fn new(precision: Precision) -> Self {
        Self::with_capacity(precision, DEFAULT_BUCKET_CAPACITY)
    }

    /// Create an empty tree with an explicit bucket capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(precision: Precision, capacity: usize) -> Self {
        assert!(capacity > 0, "bucket capacity must be positive");
        let mut tree = Self {
            precision,
            capacity,
            root: NodeIdx::new(0),
            arena: Vec::new(),
            free: Vec::new(),
            len: 0,
            dirty: false,
        };
        tree.root = tree.alloc(Node {
            parent: None,
            pending: false,
            kind: Kind::Bucket(Vec::new()),
        });
        tree
    }

    /// The comparator fixed at construction.
    pub const fn precision(&self) -> &Precision {
        &self.precision
    }

    /// The bucket capacity fixed at construction.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    fn node(&self, idx: NodeIdx) -> &Node<N, V> {
        self.arena[idx.get()]
            .as_ref()
            .expect("node index must refer to a live node")
    }

    fn node_mut(&mut self, idx: NodeIdx) -> &mut Node<N, V> {
        self.arena[idx.get()]
            .as_mut()
            .expect("node index must refer to a live node")
    }

    fn alloc(&mut self, node: Node<N, V>) -> NodeIdx {
        if let Some(i) = self.free.pop() {
            self.arena[i] = Some(node);
            NodeIdx::new(i)
        } else {
            self.arena.push(Some(node));
            NodeIdx::new(self.arena.len() - 1)
        }
    }

    fn free_slot(&mut self, idx: NodeIdx) {
        self.arena[idx.get()] = None;
        self.free.push(idx.get());
    }

    fn bucket(&self, idx: NodeIdx) -> &Vec<PointEntry<N, V>> {
        match &self.node(idx).kind {
            Kind::Bucket(entries) => entries,
            Kind::Cut { .. } => panic!("expected a bucket node"),
        }
    }

    fn bucket_mut(&mut self, idx: NodeIdx) -> &mut Vec<PointEntry<N, V>> {
        match &mut self.node_mut(idx).kind {
            Kind::Bucket(entries) => entries,
            Kind::Cut { .. } => panic!("expected a bucket node"),
        }
    }

    /// Locate the bucket and position of the entry equivalent to `key` in the
    /// subtree at `idx`. On a tolerance tie against a cut value the right
    /// side is searched first (ties are canonically stored there).
    fn find_in(&self, idx: NodeIdx, key: &Point<N>) -> Option<(NodeIdx, usize)> {
        match &self.node(idx).kind {
            Kind::Bucket(entries) => entries
                .iter()
                .position(|e| e.key().eq_within(key, &self.precision))
                .map(|i| (idx, i)),
            Kind::Cut {
                dim, value, left, right,
            } => match self.precision.cmp(key.coord(*dim), *value) {
                Ordering::Less => self.find_in(*left, key),
                Ordering::Greater => self.find_in(*right, key),
                Ordering::Equal => self
                    .find_in(*right, key)
                    .or_else(|| self.find_in(*left, key)),
            },
        }
    }

    fn insert_into_bucket(&mut self, idx: NodeIdx, key: Point<N>, value: V) -> Option<V> {
        let precision = self.precision;
        let capacity = self.capacity;
        let entries = self.bucket_mut(idx);
        if let Some(e) = entries.iter_mut().find(|e| e.key().eq_within(&key, &precision)) {
            return Some(e.replace_value(value));
        }
        entries.push(PointEntry::new(key, value));
        self.len += 1;
        if self.bucket(idx).len() > capacity {
            self.split_bucket(idx);
        }
        None
    }

    /// Split an over-full bucket into a cut node with two bucket children.
    ///
    /// The splitting dimension is the widest axis of the entries' bounding
    /// box (ties break toward the lower axis index); the split value is the
    /// median coordinate on that axis, nudged up to the smallest strictly
    /// greater coordinate when the median coincides with the minimum so both
    /// sides end up non-empty. The partition itself is strict: coordinates
    /// `>=` the cut value go right.
    fn split_bucket(&mut self, idx: NodeIdx) {
        let entries = core::mem::take(self.bucket_mut(idx));

        let mut lo = [f64::INFINITY; N];
        let mut hi = [f64::NEG_INFINITY; N];
        for e in &entries {
            for axis in 0..N {
                let c = e.key().coord(axis);
                lo[axis] = lo[axis].min(c);
                hi[axis] = hi[axis].max(c);
            }
        }
        let mut dim = 0;
        let mut best = f64::NEG_INFINITY;
        for axis in 0..N {
            let spread = hi[axis] - lo[axis];
            if spread > best {
                best = spread;
                dim = axis;
            }
        }
        if !(best > 0.0) {
            // Zero spread on every axis: distinct keys chained together by
            // the tolerance band. Nothing separates them; leave the bucket
            // over capacity.
            *self.bucket_mut(idx) = entries;
            return;
        }

        let mut coords: Vec<f64> = entries.iter().map(|e| e.key().coord(dim)).collect();
        let mid = coords.len() / 2;
        coords.select_nth_unstable_by(mid, |a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let mut value = coords[mid];
        if !(lo[dim] < value) {
            value = coords
                .iter()
                .copied()
                .filter(|&c| c > lo[dim])
                .fold(f64::INFINITY, f64::min);
        }

        let mut left_entries = Vec::new();
        let mut right_entries = Vec::new();
        for e in entries {
            if e.key().coord(dim) < value {
                left_entries.push(e);
            } else {
                right_entries.push(e);
            }
        }
        debug_assert!(
            !left_entries.is_empty() && !right_entries.is_empty(),
            "split must populate both sides"
        );

        let left = self.alloc(Node {
            parent: Some(idx),
            pending: false,
            kind: Kind::Bucket(left_entries),
        });
        let right = self.alloc(Node {
            parent: Some(idx),
            pending: false,
            kind: Kind::Bucket(right_entries),
        });
        self.node_mut(idx).kind = Kind::Cut {
            dim,
            value,
            left,
            right,
        };
    }

    /// Mark `idx` and its ancestors as requiring a condense pass, stopping at
    /// the first node already marked (its chain to the root is marked too).
    fn mark_condense(&mut self, mut idx: NodeIdx) {
        loop {
            let n = self.node_mut(idx);
            if n.pending {
                break;
            }
            n.pending = true;
            match n.parent {
                Some(p) => idx = p,
                None => break,
            }
        }
        self.dirty = true;
    }

    /// Run the deferred condense pass over every marked subtree: a cut node
    /// with an empty bucket child is replaced by its other child, and two
    /// sibling buckets whose combined size fits a single bucket are merged,
    /// reducing height after heavy deletion. No-op when nothing is marked.
    pub fn condense(&mut self) {
        if !self.dirty {
            return;
        }
        let new_root = self.condense_node(self.root);
        self.root = new_root;
        self.node_mut(new_root).parent = None;
        self.dirty = false;
    }

    fn condense_node(&mut self, idx: NodeIdx) -> NodeIdx {
        if !self.node(idx).pending {
            return idx;
        }
        self.node_mut(idx).pending = false;
        let (dim, value, left, right) = match &self.node(idx).kind {
            Kind::Bucket(_) => return idx,
            Kind::Cut {
                dim, value, left, right,
            } => (*dim, *value, *left, *right),
        };
        let left = self.condense_node(left);
        let right = self.condense_node(right);
        self.node_mut(left).parent = Some(idx);
        self.node_mut(right).parent = Some(idx);
        self.node_mut(idx).kind = Kind::Cut {
            dim,
            value,
            left,
            right,
        };

        let left_empty = matches!(&self.node(left).kind, Kind::Bucket(e) if e.is_empty());
        let right_empty = matches!(&self.node(right).kind, Kind::Bucket(e) if e.is_empty());
        if left_empty && right_empty {
            self.free_slot(left);
            self.free_slot(right);
            self.node_mut(idx).kind = Kind::Bucket(Vec::new());
            return idx;
        }
        if left_empty {
            self.free_slot(left);
            self.free_slot(idx);
            return right;
        }
        if right_empty {
            self.free_slot(right);
            self.free_slot(idx);
            return left;
        }
        let merged_len = match (&self.node(left).kind, &self.node(right).kind) {
            (Kind::Bucket(l), Kind::Bucket(r)) => Some(l.len() + r.len()),
            _ => None,
        };
        if let Some(n) = merged_len
            && n <= self.capacity
        {
            let mut merged = core::mem::take(self.bucket_mut(left));
            merged.append(self.bucket_mut(right));
            self.free_slot(left);
            self.free_slot(right);
            self.node_mut(idx).kind = Kind::Bucket(merged);
        }
        idx
    }

    fn in_order(&self, idx: NodeIdx, out: &mut Vec<(NodeIdx, usize)>) {
        match &self.node(idx).kind {
            Kind::Bucket(entries) => {
                for i in 0..entries.len() {
                    out.push((idx, i));
                }
            }
            Kind::Cut { left, right, .. } => {
                self.in_order(*left, out);
                self.in_order(*right, out);
            }
        }
    }

    fn dump_node(&self, idx: NodeIdx, depth: usize, out: &mut String) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        let n = self.node(idx);
        let pending = if n.pending { " pending" } else { "" };
        match &n.kind {
            Kind::Bucket(entries) => {
                let _ = write!(out, "bucket[{}]{pending}:", entries.len());
                for e in entries {
                    let _ = write!(out, " {:?}", e.key().coords());
                }
                out.push('\n');
            }
            Kind::Cut {
                dim, value, left, right,
            } => {
                let _ = writeln!(out, "cut dim={dim} @ {value}{pending}");
                self.dump_node(*left, depth + 1, out);
                self.dump_node(*right, depth + 1, out);
            }
        }
    }

    #[cfg(test)]
    fn cut_count(&self) -> usize {
        self.arena
            .iter()
            .filter(|n| matches!(n, Some(Node { kind: Kind::Cut { .. }, .. })))
            .count()
    }

    #[cfg(test)]
    fn validate(&self) {
        fn rec<const N: usize, V>(
            tree: &BucketKdTree<N, V>,
            idx: NodeIdx,
            parent: Option<NodeIdx>,
        ) -> usize {
            let n = tree.node(idx);
            assert_eq!(n.parent, parent, "parent back-reference must match");
            match &n.kind {
                Kind::Bucket(entries) => entries.len(),
                Kind::Cut {
                    dim, value, left, right,
                } => {
                    for (child, is_left) in [(*left, true), (*right, false)] {
                        if let Kind::Bucket(entries) = &tree.node(child).kind {
                            for e in entries {
                                let c = e.key().coord(*dim);
                                if is_left {
                                    assert!(c < *value, "left entries sit strictly below the cut");
                                } else {
                                    assert!(c >= *value, "right entries sit at or above the cut");
                                }
                            }
                        }
                    }
                    rec(tree, *left, Some(idx)) + rec(tree, *right, Some(idx))
                }
            }
        }
        let counted = rec(self, self.root, None);
        assert_eq!(counted, self.len, "size counter must match traversal");
    }
}

impl<const N: usize, V> Default for BucketKdTree<N, V> {
    fn default() -> Self {
        Self::new(Precision::default())
    }
}

impl<const N: usize, V> Store<N, V> for BucketKdTree<N, V> {
    fn len(&self) -> usize {
        self.len
    }

    fn insert(&mut self, key: Point<N>, value: V) -> Option<V> {
        let mut idx = self.root;
        loop {
            let step = match &self.node(idx).kind {
                Kind::Bucket(_) => None,
                Kind::Cut {
                    dim, value: s, left, right,
                } => {
                    let q = key.coord(*dim);
                    match self.precision.cmp(q, *s) {
                        Ordering::Less => Some((*left, None)),
                        Ordering::Greater => Some((*right, None)),
                        Ordering::Equal => {
                            // Tolerance tie: an equivalent key may already
                            // live on either side. Probe the non-canonical
                            // side first, then descend the strict side.
                            if q >= *s {
                                Some((*right, Some(*left)))
                            } else {
                                Some((*left, Some(*right)))
                            }
                        }
                    }
                }
            };
            match step {
                None => return self.insert_into_bucket(idx, key, value),
                Some((canonical, probe)) => {
                    if let Some(p) = probe
                        && let Some((b, i)) = self.find_in(p, &key)
                    {
                        return Some(self.bucket_mut(b)[i].replace_value(value));
                    }
                    idx = canonical;
                }
            }
        }
    }

    fn entry(&self, key: &Point<N>) -> Option<(&Point<N>, &V)> {
        let (b, i) = self.find_in(self.root, key)?;
        let e = &self.bucket(b)[i];
        Some((e.key(), e.value()))
    }

    fn remove(&mut self, key: &Point<N>) -> Option<V> {
        // Collect the marks left behind by earlier removals before touching
        // the structure again.
        self.condense();
        let (b, i) = self.find_in(self.root, key)?;
        let entry = self.bucket_mut(b).remove(i);
        self.len -= 1;
        if self.bucket(b).is_empty() && b != self.root {
            self.mark_condense(b);
        }
        Some(entry.into_value())
    }

    fn clear(&mut self) {
        self.arena.clear();
        self.free.clear();
        self.len = 0;
        self.dirty = false;
        self.root = self.alloc(Node {
            parent: None,
            pending: false,
            kind: Kind::Bucket(Vec::new()),
        });
    }

    fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = (&'a Point<N>, &'a V)> + 'a> {
        let mut order = Vec::with_capacity(self.len);
        self.in_order(self.root, &mut order);
        Box::new(order.into_iter().map(|(b, i)| {
            let e = &self.bucket(b)[i];
            (e.key(), e.value())
        }))
    }

    fn dump(&self, out: &mut String) {
        self.dump_node(self.root, 0, out);
    }
}

impl<const N: usize, V> core::fmt::Debug for BucketKdTree<N, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BucketKdTree")
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("arena_nodes", &self.arena.len())
            .field("free", &self.free.len())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}
