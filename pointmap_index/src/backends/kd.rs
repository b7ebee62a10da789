// Copyright 2026 the Pointmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Plain recursive kd-tree backend: one entry per node, no rebalancing.
//!
//! The splitting dimension cycles with depth and the node's own coordinate is
//! the split value. Tolerance ties on a split coordinate are canonically
//! placed on the right/plus side; find and insert both honor that convention
//! (see [`Store::insert`] for the two-phase tie protocol).

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Write as _;

use crate::entry::PointEntry;
use crate::point::Point;
use crate::precision::Precision;
use crate::store::Store;

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

#[derive(Copy, Clone)]
enum Side {
    Left,
    Right,
}

struct Node<const N: usize, V> {
    entry: PointEntry<N, V>,
    dim: usize,
    parent: Option<NodeIdx>,
    left: Option<NodeIdx>,
    right: Option<NodeIdx>,
}

/// Unbalanced kd-tree over arena-allocated nodes.
///
/// Simple and allocation-light, but degenerate insertion orders (for example
/// ascending coordinates) degrade it to a linked list; callers expecting such
/// input should prefer [`RebuildKdTree`](crate::backends::rebuild::RebuildKdTree)
/// or [`BucketKdTree`](crate::backends::bucket::BucketKdTree).
pub struct KdTree<const N: usize, V> {
    precision: Precision,
    root: Option<NodeIdx>,
    arena: Vec<Option<Node<N, V>>>,
    free: Vec<usize>,
    len: usize,
}

impl<const N: usize, V> KdTree<N, V> {
    /// Create an empty tree using the given comparator.
    pub fn new(precision: Precision) -> Self {
        Self {
            precision,
            root: None,
            arena: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// The comparator fixed at construction.
    pub const fn precision(&self) -> &Precision {
        &self.precision
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

    fn attach(&mut self, parent: NodeIdx, side: Side, key: Point<N>, value: V) {
        let dim = (self.node(parent).dim + 1) % N;
        let idx = self.alloc(Node {
            entry: PointEntry::new(key, value),
            dim,
            parent: Some(parent),
            left: None,
            right: None,
        });
        let p = self.node_mut(parent);
        match side {
            Side::Left => p.left = Some(idx),
            Side::Right => p.right = Some(idx),
        }
        self.len += 1;
    }

    /// Locate the node holding a key equivalent to `key` within the subtree
    /// at `idx`. On a tolerance tie the right side is searched first, because
    /// insertion places coordinate-tied points there.
    fn find_in(&self, idx: NodeIdx, key: &Point<N>) -> Option<NodeIdx> {
        let n = self.node(idx);
        let q = key.coord(n.dim);
        let s = n.entry.key().coord(n.dim);
        match self.precision.cmp(q, s) {
            Ordering::Less => n.left.and_then(|l| self.find_in(l, key)),
            Ordering::Greater => n.right.and_then(|r| self.find_in(r, key)),
            Ordering::Equal => {
                if n.entry.key().eq_within(key, &self.precision) {
                    return Some(idx);
                }
                if let Some(r) = n.right
                    && let Some(found) = self.find_in(r, key)
                {
                    return Some(found);
                }
                n.left.and_then(|l| self.find_in(l, key))
            }
        }
    }

    fn find(&self, key: &Point<N>) -> Option<NodeIdx> {
        self.root.and_then(|r| self.find_in(r, key))
    }

    /// Index of the entry with the minimum coordinate along `dim` in the
    /// subtree at `idx`, by strict ordering. When the node's own discriminator
    /// is `dim`, only the left subtree can hold a strictly smaller coordinate.
    fn min_in(&self, idx: NodeIdx, dim: usize) -> NodeIdx {
        let n = self.node(idx);
        let mut best = idx;
        let mut best_c = n.entry.key().coord(dim);
        if let Some(l) = n.left {
            let c = self.min_in(l, dim);
            let cc = self.node(c).entry.key().coord(dim);
            if cc < best_c {
                best = c;
                best_c = cc;
            }
        }
        if n.dim != dim
            && let Some(r) = n.right
        {
            let c = self.min_in(r, dim);
            let cc = self.node(c).entry.key().coord(dim);
            if cc < best_c {
                best = c;
            }
        }
        best
    }

    /// Remove the entry stored at `idx`, restructuring so every remaining
    /// node keeps a populated entry. Standard kd deletion: pull the minimum
    /// along the node's own dimension out of the right subtree; lacking a
    /// right subtree, take the left minimum and promote the left subtree to
    /// the right, which keeps the ties-go-right invariant intact.
    fn delete_at(&mut self, idx: NodeIdx) -> PointEntry<N, V> {
        let dim = self.node(idx).dim;
        if let Some(right) = self.node(idx).right {
            let m = self.min_in(right, dim);
            let repl = self.delete_at(m);
            core::mem::replace(&mut self.node_mut(idx).entry, repl)
        } else if let Some(left) = self.node(idx).left {
            let m = self.min_in(left, dim);
            let repl = self.delete_at(m);
            let n = self.node_mut(idx);
            let out = core::mem::replace(&mut n.entry, repl);
            n.right = n.left.take();
            out
        } else {
            match self.node(idx).parent {
                Some(p) => {
                    let pn = self.node_mut(p);
                    if pn.left == Some(idx) {
                        pn.left = None;
                    } else {
                        debug_assert_eq!(pn.right, Some(idx), "node must be a child of its parent");
                        pn.right = None;
                    }
                }
                None => self.root = None,
            }
            let node = self.arena[idx.get()]
                .take()
                .expect("deleted node must be live");
            self.free.push(idx.get());
            node.entry
        }
    }

    fn in_order(&self, idx: NodeIdx, out: &mut Vec<NodeIdx>) {
        let n = self.node(idx);
        if let Some(l) = n.left {
            self.in_order(l, out);
        }
        out.push(idx);
        if let Some(r) = n.right {
            self.in_order(r, out);
        }
    }

    /// Flatten the tree into its entries (in-order) and reset it to empty.
    pub(crate) fn drain_entries(&mut self) -> Vec<PointEntry<N, V>> {
        let mut order = Vec::with_capacity(self.len);
        if let Some(r) = self.root {
            self.in_order(r, &mut order);
        }
        let mut arena = core::mem::take(&mut self.arena);
        let out = order
            .iter()
            .map(|i| {
                arena[i.get()]
                    .take()
                    .expect("in-order traversal visits live nodes")
                    .entry
            })
            .collect();
        self.root = None;
        self.free.clear();
        self.len = 0;
        out
    }

    /// Build a balanced tree from entries by recursive median partition.
    /// Dimensions cycle with depth; the median is found with quickselect,
    /// not a full sort.
    pub(crate) fn from_balanced(precision: Precision, entries: Vec<PointEntry<N, V>>) -> Self {
        let mut tree = Self::new(precision);
        tree.len = entries.len();
        tree.root = tree.build_subtree(entries, 0, None);
        tree
    }

    fn build_subtree(
        &mut self,
        mut entries: Vec<PointEntry<N, V>>,
        depth: usize,
        parent: Option<NodeIdx>,
    ) -> Option<NodeIdx> {
        if entries.is_empty() {
            return None;
        }
        let dim = depth % N;
        let mid = entries.len() / 2;
        entries.select_nth_unstable_by(mid, |a, b| {
            a.key()
                .coord(dim)
                .partial_cmp(&b.key().coord(dim))
                .unwrap_or(Ordering::Equal)
        });
        let right = entries.split_off(mid + 1);
        let median = entries.pop().expect("median element exists");
        let idx = self.alloc(Node {
            entry: median,
            dim,
            parent,
            left: None,
            right: None,
        });
        let l = self.build_subtree(entries, depth + 1, Some(idx));
        let r = self.build_subtree(right, depth + 1, Some(idx));
        let n = self.node_mut(idx);
        n.left = l;
        n.right = r;
        Some(idx)
    }

    /// Height of the tree in nodes; 0 when empty.
    pub(crate) fn depth(&self) -> usize {
        fn rec<const N: usize, V>(tree: &KdTree<N, V>, idx: NodeIdx) -> usize {
            let n = tree.node(idx);
            let l = n.left.map_or(0, |l| rec(tree, l));
            let r = n.right.map_or(0, |r| rec(tree, r));
            1 + l.max(r)
        }
        self.root.map_or(0, |r| rec(self, r))
    }

    fn dump_node(&self, idx: NodeIdx, depth: usize, out: &mut String) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        let n = self.node(idx);
        let _ = writeln!(out, "node dim={} key={:?}", n.dim, n.entry.key().coords());
        if let Some(l) = n.left {
            self.dump_node(l, depth + 1, out);
        }
        if let Some(r) = n.right {
            self.dump_node(r, depth + 1, out);
        }
    }

    #[cfg(test)]
    fn validate(&self) {
        fn rec<const N: usize, V>(
            tree: &KdTree<N, V>,
            idx: NodeIdx,
            parent: Option<NodeIdx>,
        ) -> usize {
            let n = tree.node(idx);
            assert_eq!(n.parent, parent, "parent back-reference must match");
            let s = n.entry.key().coord(n.dim);
            let mut count = 1;
            if let Some(l) = n.left {
                let d = tree.node(l).dim;
                assert_eq!(d, (n.dim + 1) % N, "child dimension must cycle");
                assert!(
                    tree.node(l).entry.key().coord(n.dim) <= s,
                    "left subtree must not exceed the split coordinate"
                );
                count += rec(tree, l, Some(idx));
            }
            if let Some(r) = n.right {
                count += rec(tree, r, Some(idx));
            }
            count
        }
        let counted = self.root.map_or(0, |r| rec(self, r, None));
        assert_eq!(counted, self.len, "size counter must match traversal");
    }
}

impl<const N: usize, V> Default for KdTree<N, V> {
    fn default() -> Self {
        Self::new(Precision::default())
    }
}

impl<const N: usize, V> Store<N, V> for KdTree<N, V> {
    fn len(&self) -> usize {
        self.len
    }

    fn insert(&mut self, key: Point<N>, value: V) -> Option<V> {
        let Some(root) = self.root else {
            let idx = self.alloc(Node {
                entry: PointEntry::new(key, value),
                dim: 0,
                parent: None,
                left: None,
                right: None,
            });
            self.root = Some(idx);
            self.len = 1;
            return None;
        };
        let mut idx = root;
        loop {
            let n = self.node(idx);
            let dim = n.dim;
            let s = n.entry.key().coord(dim);
            let q = key.coord(dim);
            match self.precision.cmp(q, s) {
                Ordering::Less => match self.node(idx).left {
                    Some(l) => idx = l,
                    None => {
                        self.attach(idx, Side::Left, key, value);
                        return None;
                    }
                },
                Ordering::Greater => match self.node(idx).right {
                    Some(r) => idx = r,
                    None => {
                        self.attach(idx, Side::Right, key, value);
                        return None;
                    }
                },
                Ordering::Equal => {
                    if self.node(idx).entry.key().eq_within(&key, &self.precision) {
                        return Some(self.node_mut(idx).entry.replace_value(value));
                    }
                    // Tolerance tie on this axis only. An equivalent key may
                    // already live on either side, so probe the non-canonical
                    // side before descending the canonical (strict) one.
                    let canonical_right = q >= s;
                    let n = self.node(idx);
                    let probe = if canonical_right { n.left } else { n.right };
                    if let Some(p) = probe
                        && let Some(found) = self.find_in(p, &key)
                    {
                        return Some(self.node_mut(found).entry.replace_value(value));
                    }
                    let n = self.node(idx);
                    let (next, side) = if canonical_right {
                        (n.right, Side::Right)
                    } else {
                        (n.left, Side::Left)
                    };
                    match next {
                        Some(c) => idx = c,
                        None => {
                            self.attach(idx, side, key, value);
                            return None;
                        }
                    }
                }
            }
        }
    }

    fn entry(&self, key: &Point<N>) -> Option<(&Point<N>, &V)> {
        self.find(key).map(|idx| {
            let e = &self.node(idx).entry;
            (e.key(), e.value())
        })
    }

    fn remove(&mut self, key: &Point<N>) -> Option<V> {
        let idx = self.find(key)?;
        let entry = self.delete_at(idx);
        self.len -= 1;
        Some(entry.into_value())
    }

    fn clear(&mut self) {
        self.root = None;
        self.arena.clear();
        self.free.clear();
        self.len = 0;
    }

    fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = (&'a Point<N>, &'a V)> + 'a> {
        let mut order = Vec::with_capacity(self.len);
        if let Some(r) = self.root {
            self.in_order(r, &mut order);
        }
        Box::new(order.into_iter().map(|i| {
            let e = &self.node(i).entry;
            (e.key(), e.value())
        }))
    }

    fn dump(&self, out: &mut String) {
        match self.root {
            None => out.push_str("(empty)\n"),
            Some(r) => self.dump_node(r, 0, out),
        }
    }
}

impl<const N: usize, V> core::fmt::Debug for KdTree<N, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KdTree")
            .field("len", &self.len)
            .field("arena_nodes", &self.arena.len())
            .field("free", &self.free.len())
            .field("has_root", &self.root.is_some())
            .finish_non_exhaustive()
    }
}
