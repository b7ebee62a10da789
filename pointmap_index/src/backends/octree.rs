// Copyright 2026 the Pointmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Variable-split octree backend (3D only).
//!
//! Leaves buffer entries up to a capacity; an over-full leaf splits into 8
//! children around the centroid of its buffered points. The centroid is
//! computed once at split time and frozen, so it tracks the data actually
//! seen instead of a fixed midpoint. Children are addressed by a 3-bit
//! octant code, one bit per axis; tolerance-tied axes widen a lookup to
//! every child on either side of the tie via a candidate mask.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use bitflags::bitflags;
use core::cmp::Ordering;
use core::fmt::Write as _;

use crate::entry::PointEntry;
use crate::point::Point3;
use crate::precision::Precision;
use crate::store::Store;

/// Default number of entries a leaf holds before it splits.
pub const DEFAULT_LEAF_CAPACITY: usize = 10;

bitflags! {
    /// Candidate-children mask: bit `i` selects the child with octant code `i`.
    ///
    /// The axis constants are the fixed lookup table mapping an axis/side
    /// pair to the set of octants on that side.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    struct OctantMask: u8 {
        /// Octants with the x bit low (x <= center).
        const X_LO = 0b0101_0101;
        /// Octants with the x bit high (x > center).
        const X_HI = 0b1010_1010;
        /// Octants with the y bit low.
        const Y_LO = 0b0011_0011;
        /// Octants with the y bit high.
        const Y_HI = 0b1100_1100;
        /// Octants with the z bit low.
        const Z_LO = 0b0000_1111;
        /// Octants with the z bit high.
        const Z_HI = 0b1111_0000;
        /// Every octant.
        const ALL = 0xFF;
    }
}

const AXIS_LO: [OctantMask; 3] = [OctantMask::X_LO, OctantMask::Y_LO, OctantMask::Z_LO];
const AXIS_HI: [OctantMask; 3] = [OctantMask::X_HI, OctantMask::Y_HI, OctantMask::Z_HI];

impl OctantMask {
    /// Children compatible with a per-axis tolerant comparison against the
    /// split point. A tied axis keeps both sides.
    fn candidates(cmp: [Ordering; 3]) -> Self {
        let mut mask = Self::ALL;
        for axis in 0..3 {
            match cmp[axis] {
                Ordering::Less => mask &= AXIS_LO[axis],
                Ordering::Greater => mask &= AXIS_HI[axis],
                Ordering::Equal => {}
            }
        }
        mask
    }

    fn has(self, code: usize) -> bool {
        self.bits() & (1_u8 << code) != 0
    }
}

/// Child slot for an axis/side triple (`true` = strictly above the center).
const fn octant_code(x_hi: bool, y_hi: bool, z_hi: bool) -> usize {
    match (x_hi, y_hi, z_hi) {
        (false, false, false) => 0,
        (true, false, false) => 1,
        (false, true, false) => 2,
        (true, true, false) => 3,
        (false, false, true) => 4,
        (true, false, true) => 5,
        (false, true, true) => 6,
        (true, true, true) => 7,
    }
}

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

enum Kind<V> {
    Leaf(Vec<PointEntry<3, V>>),
    Branch {
        center: Point3,
        children: [NodeIdx; 8],
    },
}

struct Node<V> {
    kind: Kind<V>,
}

/// Centroid-split octree.
pub struct Octree<V> {
    precision: Precision,
    capacity: usize,
    root: NodeIdx,
    arena: Vec<Option<Node<V>>>,
    free: Vec<usize>,
    len: usize,
}

impl<V> Octree<V> {
    /// Create an empty octree with [`DEFAULT_LEAF_CAPACITY`].
    pub fn new(precision: Precision) -> Self {
        Self::with_capacity(precision, DEFAULT_LEAF_CAPACITY)
    }

    /// Create an empty octree with an explicit leaf capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(precision: Precision, capacity: usize) -> Self {
        assert!(capacity > 0, "leaf capacity must be positive");
        let mut tree = Self {
            precision,
            capacity,
            root: NodeIdx::new(0),
            arena: Vec::new(),
            free: Vec::new(),
            len: 0,
        };
        tree.root = tree.alloc(Node {
            kind: Kind::Leaf(Vec::new()),
        });
        tree
    }

    /// The comparator fixed at construction.
    pub const fn precision(&self) -> &Precision {
        &self.precision
    }

    fn node(&self, idx: NodeIdx) -> &Node<V> {
        self.arena[idx.get()]
            .as_ref()
            .expect("node index must refer to a live node")
    }

    fn node_mut(&mut self, idx: NodeIdx) -> &mut Node<V> {
        self.arena[idx.get()]
            .as_mut()
            .expect("node index must refer to a live node")
    }

    fn alloc(&mut self, node: Node<V>) -> NodeIdx {
        if let Some(i) = self.free.pop() {
            self.arena[i] = Some(node);
            NodeIdx::new(i)
        } else {
            self.arena.push(Some(node));
            NodeIdx::new(self.arena.len() - 1)
        }
    }

    fn leaf_mut(&mut self, idx: NodeIdx) -> &mut Vec<PointEntry<3, V>> {
        match &mut self.node_mut(idx).kind {
            Kind::Leaf(entries) => entries,
            Kind::Branch { .. } => panic!("expected a leaf node"),
        }
    }

    fn tolerant_cmp(&self, key: &Point3, center: &Point3) -> [Ordering; 3] {
        core::array::from_fn(|axis| self.precision.cmp(key.coord(axis), center.coord(axis)))
    }

    fn strict_code(key: &Point3, center: &Point3) -> usize {
        octant_code(
            key.coord(0) > center.coord(0),
            key.coord(1) > center.coord(1),
            key.coord(2) > center.coord(2),
        )
    }

    /// Locate the leaf and position of the entry equivalent to `key`. The
    /// strict child is searched first; tolerance-tied axes then widen the
    /// search to every other candidate child.
    fn find_in(&self, idx: NodeIdx, key: &Point3) -> Option<(NodeIdx, usize)> {
        match &self.node(idx).kind {
            Kind::Leaf(entries) => entries
                .iter()
                .position(|e| e.key().eq_within(key, &self.precision))
                .map(|i| (idx, i)),
            Kind::Branch { center, children } => {
                let mask = OctantMask::candidates(self.tolerant_cmp(key, center));
                let canonical = Self::strict_code(key, center);
                debug_assert!(mask.has(canonical), "strict octant must be a candidate");
                if let Some(found) = self.find_in(children[canonical], key) {
                    return Some(found);
                }
                for code in 0..8 {
                    if code != canonical
                        && mask.has(code)
                        && let Some(found) = self.find_in(children[code], key)
                    {
                        return Some(found);
                    }
                }
                None
            }
        }
    }

    fn insert_into_leaf(&mut self, idx: NodeIdx, key: Point3, value: V) -> Option<V> {
        let precision = self.precision;
        let capacity = self.capacity;
        let entries = self.leaf_mut(idx);
        if let Some(e) = entries.iter_mut().find(|e| e.key().eq_within(&key, &precision)) {
            return Some(e.replace_value(value));
        }
        entries.push(PointEntry::new(key, value));
        let over_capacity = entries.len() > capacity;
        self.len += 1;
        if over_capacity {
            self.split_leaf(idx);
        }
        None
    }

    /// Replace an over-full leaf with a branch around the centroid of its
    /// buffered points and redistribute the entries by strict octant code.
    fn split_leaf(&mut self, idx: NodeIdx) {
        let entries = core::mem::take(self.leaf_mut(idx));

        let mut lo = [f64::INFINITY; 3];
        let mut hi = [f64::NEG_INFINITY; 3];
        for e in &entries {
            for axis in 0..3 {
                let c = e.key().coord(axis);
                lo[axis] = lo[axis].min(c);
                hi[axis] = hi[axis].max(c);
            }
        }
        let spread = (0..3).map(|a| hi[a] - lo[a]).fold(0.0, f64::max);
        if !(spread > 0.0) {
            // Zero spread: the points cannot be separated; leave the leaf
            // over capacity.
            *self.leaf_mut(idx) = entries;
            return;
        }

        let center = Point3::centroid(entries.iter().map(|e| *e.key()))
            .expect("split leaf is non-empty");
        let mut children = [NodeIdx::new(0); 8];
        for child in &mut children {
            *child = self.alloc(Node {
                kind: Kind::Leaf(Vec::new()),
            });
        }
        for e in entries {
            let code = Self::strict_code(e.key(), &center);
            self.leaf_mut(children[code]).push(e);
        }
        self.node_mut(idx).kind = Kind::Branch { center, children };
    }

    fn in_order(&self, idx: NodeIdx, out: &mut Vec<(NodeIdx, usize)>) {
        match &self.node(idx).kind {
            Kind::Leaf(entries) => {
                for i in 0..entries.len() {
                    out.push((idx, i));
                }
            }
            Kind::Branch { children, .. } => {
                for child in children {
                    self.in_order(*child, out);
                }
            }
        }
    }

    fn dump_node(&self, idx: NodeIdx, depth: usize, out: &mut String) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        match &self.node(idx).kind {
            Kind::Leaf(entries) => {
                let _ = write!(out, "leaf[{}]:", entries.len());
                for e in entries {
                    let _ = write!(out, " {:?}", e.key().coords());
                }
                out.push('\n');
            }
            Kind::Branch { center, children } => {
                let _ = writeln!(out, "branch @ {:?}", center.coords());
                for child in children {
                    self.dump_node(*child, depth + 1, out);
                }
            }
        }
    }

    #[cfg(test)]
    fn branch_count(&self) -> usize {
        self.arena
            .iter()
            .filter(|n| matches!(n, Some(Node { kind: Kind::Branch { .. } })))
            .count()
    }
}

impl<V> Default for Octree<V> {
    fn default() -> Self {
        Self::new(Precision::default())
    }
}

impl<V> Store<3, V> for Octree<V> {
    fn len(&self) -> usize {
        self.len
    }

    fn insert(&mut self, key: Point3, value: V) -> Option<V> {
        let mut idx = self.root;
        loop {
            let step = match &self.node(idx).kind {
                Kind::Leaf(_) => None,
                Kind::Branch { center, children } => {
                    let cmp = self.tolerant_cmp(&key, center);
                    let canonical = Self::strict_code(&key, center);
                    let mask = OctantMask::candidates(cmp);
                    Some((children[canonical], *children, mask, canonical))
                }
            };
            match step {
                None => return self.insert_into_leaf(idx, key, value),
                Some((next, children, mask, canonical)) => {
                    // A tied axis means an equivalent key could already live
                    // in a sibling octant; probe those before descending the
                    // strict one.
                    for code in 0..8 {
                        if code != canonical
                            && mask.has(code)
                            && let Some((leaf, i)) = self.find_in(children[code], &key)
                        {
                            return Some(self.leaf_mut(leaf)[i].replace_value(value));
                        }
                    }
                    idx = next;
                }
            }
        }
    }

    fn entry(&self, key: &Point3) -> Option<(&Point3, &V)> {
        let (leaf, i) = self.find_in(self.root, key)?;
        let e = match &self.node(leaf).kind {
            Kind::Leaf(entries) => &entries[i],
            Kind::Branch { .. } => panic!("find_in must return leaf positions"),
        };
        Some((e.key(), e.value()))
    }

    fn remove(&mut self, key: &Point3) -> Option<V> {
        let (leaf, i) = self.find_in(self.root, key)?;
        let entry = self.leaf_mut(leaf).remove(i);
        self.len -= 1;
        Some(entry.into_value())
    }

    fn clear(&mut self) {
        self.arena.clear();
        self.free.clear();
        self.len = 0;
        self.root = self.alloc(Node {
            kind: Kind::Leaf(Vec::new()),
        });
    }

    fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = (&'a Point3, &'a V)> + 'a> {
        let mut order = Vec::with_capacity(self.len);
        self.in_order(self.root, &mut order);
        Box::new(order.into_iter().map(|(leaf, i)| {
            let e = match &self.node(leaf).kind {
                Kind::Leaf(entries) => &entries[i],
                Kind::Branch { .. } => panic!("in-order traversal yields leaf positions"),
            };
            (e.key(), e.value())
        }))
    }

    fn dump(&self, out: &mut String) {
        self.dump_node(self.root, 0, out);
    }
}

impl<V> core::fmt::Debug for Octree<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Octree")
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("arena_nodes", &self.arena.len())
            .field("free", &self.free.len())
            .finish_non_exhaustive()
    }
}
