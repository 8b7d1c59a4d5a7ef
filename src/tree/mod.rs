//! N-dimensional spatial partition tree for Barnes-Hut queries
//!
//! A quadtree in 2D, an octree in 3D, and the 2^D-ary generalisation for any
//! other dimension. The tree is built from a snapshot of positions, annotated
//! bottom-up with a [`Delegate`] aggregate, queried, and dropped.
//!
//! # Layout
//!
//! - Nodes live in a single arena `Vec` and refer to each other by index. An
//!   internal node stores the index of the first of its `2^D` children, which
//!   are always allocated together and contiguously.
//! - A leaf stores the head of a chain of point indices. The chain links
//!   through a side table indexed by point, so points at identical positions
//!   share a leaf without further subdivision.
//! - The tree borrows the position slice it was built from. It cannot outlive
//!   the positions, and dropping it frees the arena and the chain table.
//!
//! # Example
//!
//! ```rust
//! use forcegraph::tree::{MassCentroid, SpatialTree};
//! use forcegraph::vector::Vector2;
//!
//! let points = vec![Vector2::new([0.0, 0.0]), Vector2::new([10.0, 0.0])];
//! let tree = SpatialTree::build(&points, |_, p| MassCentroid::point(-30.0, *p));
//!
//! let mut hits = 0;
//! tree.barnes_hut(&points[0], Some(0), 0.9, |_| hits += 1);
//! assert_eq!(hits, 1);
//! ```

mod bounding_box;
mod delegate;

use std::ops::Range;

pub use bounding_box::BoundingBox;
pub use delegate::{Delegate, MassCentroid};

use crate::vector::Vector;

/// Margin added around the covering box of the points
pub const BOX_MARGIN: f64 = 1e-5;

/// Depth at which leaves stop subdividing and chain their points instead.
///
/// Positions closer together than the midpoint resolution of f64 would
/// otherwise subdivide forever.
pub const MAX_DEPTH: usize = 96;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Leaf { head: Option<usize> },
    Internal { first_child: usize },
}

/// A node of the spatial tree, either a leaf or an internal node
#[derive(Debug, Clone)]
pub struct TreeNode<const D: usize, A> {
    bounds: BoundingBox<D>,
    kind: Kind,
    depth: usize,
    count: usize,
    /// Aggregate over every point in this subtree
    pub delegate: A,
}

impl<const D: usize, A> TreeNode<D, A> {
    fn leaf(bounds: BoundingBox<D>, depth: usize, delegate: A) -> Self {
        Self {
            bounds,
            kind: Kind::Leaf { head: None },
            depth,
            count: 0,
            delegate,
        }
    }

    pub fn bounding_box(&self) -> &BoundingBox<D> {
        &self.bounds
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, Kind::Leaf { .. })
    }

    pub fn is_internal(&self) -> bool {
        matches!(self.kind, Kind::Internal { .. })
    }

    /// Number of points in this subtree
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Distance from the root (the root is at depth 0)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Arena indices of the children, if this is an internal node
    pub fn children(&self) -> Option<Range<usize>> {
        match self.kind {
            Kind::Internal { first_child } => Some(first_child..first_child + (1 << D)),
            Kind::Leaf { .. } => None,
        }
    }

    fn head(&self) -> Option<usize> {
        match self.kind {
            Kind::Leaf { head } => head,
            Kind::Internal { .. } => None,
        }
    }
}

/// What a Barnes-Hut query hands to its combine callback
#[derive(Debug)]
pub enum Interaction<'t, const D: usize, A> {
    /// A distant subtree standing in as a single pseudo-point
    Cluster {
        delegate: &'t A,
        centroid: Vector<D>,
    },
    /// An individual point from a leaf that was reached
    Point {
        index: usize,
        position: &'t Vector<D>,
    },
}

/// Iterator over the point indices chained in one leaf
pub struct Colocated<'t> {
    next: &'t [Option<usize>],
    current: Option<usize>,
}

impl Iterator for Colocated<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let index = self.current?;
        self.current = self.next[index];
        Some(index)
    }
}

/// Spatial partition tree over a borrowed position snapshot
pub struct SpatialTree<'p, const D: usize, A> {
    points: &'p [Vector<D>],
    nodes: Vec<TreeNode<D, A>>,
    next: Vec<Option<usize>>,
}

impl<'p, const D: usize, A> SpatialTree<'p, D, A> {
    /// Children per internal node
    pub const FANOUT: usize = 1 << D;

    /// Number of points the tree was built over
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of allocated tree nodes (0 for an empty tree)
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> Option<&TreeNode<D, A>> {
        self.nodes.first()
    }

    pub fn node(&self, index: usize) -> Option<&TreeNode<D, A>> {
        self.nodes.get(index)
    }

    /// Point indices held directly by `node` (empty for internal nodes)
    pub fn colocated(&self, node: &TreeNode<D, A>) -> Colocated<'_> {
        Colocated {
            next: &self.next,
            current: node.head(),
        }
    }

    /// Collected form of [`SpatialTree::colocated`]
    pub fn contained_indices(&self, node: &TreeNode<D, A>) -> Vec<usize> {
        self.colocated(node).collect()
    }

    /// The leaf whose box a position descends into, if the tree is non-empty
    /// and the position lies inside the root box
    pub fn leaf_at(&self, position: &Vector<D>) -> Option<&TreeNode<D, A>> {
        let mut node = self.root()?;
        if !node.bounds.contains(position) {
            return None;
        }
        while let Kind::Internal { first_child } = node.kind {
            node = &self.nodes[first_child + node.bounds.orthant(position)];
        }
        Some(node)
    }

    /// Pre-order traversal. `visitor` returns whether to descend into the
    /// node's children.
    pub fn visit(&self, mut visitor: impl FnMut(&TreeNode<D, A>) -> bool) {
        if self.nodes.is_empty() {
            return;
        }
        let mut stack = vec![0];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if visitor(node) {
                if let Some(children) = node.children() {
                    stack.extend(children.rev());
                }
            }
        }
    }

    /// Pre-order traversal that may update each node's delegate
    pub fn visit_mut(&mut self, mut visitor: impl FnMut(&mut TreeNode<D, A>) -> bool) {
        if self.nodes.is_empty() {
            return;
        }
        let mut stack = vec![0];
        while let Some(index) = stack.pop() {
            let node = &mut self.nodes[index];
            if visitor(node) {
                if let Some(children) = node.children() {
                    stack.extend(children.rev());
                }
            }
        }
    }
}

impl<'p, const D: usize, A: Delegate<D>> SpatialTree<'p, D, A> {
    /// Build a tree over `points`.
    ///
    /// `point_delegate` produces the aggregate for a single point from its
    /// index and position; internal aggregates are folds of their children.
    /// An empty slice yields an empty tree on which every query is a no-op.
    pub fn build(
        points: &'p [Vector<D>],
        mut point_delegate: impl FnMut(usize, &Vector<D>) -> A,
    ) -> Self {
        let mut tree = Self {
            points,
            nodes: Vec::new(),
            next: vec![None; points.len()],
        };
        let Some(bounds) = BoundingBox::covering(points) else {
            return tree;
        };

        tree.nodes
            .push(TreeNode::leaf(bounds.padded(BOX_MARGIN), 0, A::empty()));
        for index in 0..points.len() {
            tree.insert(index);
        }
        tree.accumulate(&mut point_delegate);
        tree
    }

    fn insert(&mut self, index: usize) {
        let position = self.points[index];
        let mut current = 0;
        loop {
            let node = &self.nodes[current];
            match node.kind {
                Kind::Internal { first_child } => {
                    current = first_child + node.bounds.orthant(&position);
                }
                Kind::Leaf { head: None } => {
                    self.nodes[current].kind = Kind::Leaf { head: Some(index) };
                    return;
                }
                Kind::Leaf { head: Some(head) } => {
                    if self.points[head] == position || node.depth >= MAX_DEPTH {
                        self.next[index] = Some(head);
                        self.nodes[current].kind = Kind::Leaf { head: Some(index) };
                        return;
                    }
                    self.subdivide(current, head);
                }
            }
        }
    }

    fn subdivide(&mut self, node: usize, head: usize) {
        let bounds = self.nodes[node].bounds;
        let depth = self.nodes[node].depth + 1;
        let first_child = self.nodes.len();
        self.nodes.extend(
            (0..Self::FANOUT)
                .map(|orthant| TreeNode::leaf(bounds.child(orthant), depth, A::empty())),
        );
        // every point chained behind `head` shares its position, so the
        // whole chain moves into one child
        let resident = first_child + bounds.orthant(&self.points[head]);
        self.nodes[resident].kind = Kind::Leaf { head: Some(head) };
        self.nodes[node].kind = Kind::Internal { first_child };
    }

    /// Children are always allocated after their parent, so a reverse sweep
    /// over the arena visits every child before its parent.
    fn accumulate(&mut self, point_delegate: &mut impl FnMut(usize, &Vector<D>) -> A) {
        for index in (0..self.nodes.len()).rev() {
            let (head, tail) = self.nodes.split_at_mut(index + 1);
            let node = &mut head[index];
            let mut delegate = A::empty();
            let mut count = 0;
            match node.kind {
                Kind::Leaf { head: chain } => {
                    let members = Colocated {
                        next: &self.next,
                        current: chain,
                    };
                    for point in members {
                        delegate.combine(&point_delegate(point, &self.points[point]));
                        count += 1;
                    }
                }
                Kind::Internal { first_child } => {
                    let offset = first_child - index - 1;
                    for child in &tail[offset..offset + Self::FANOUT] {
                        delegate.combine(&child.delegate);
                        count += child.count;
                    }
                }
            }
            node.delegate = delegate;
            node.count = count;
        }
    }

    /// Barnes-Hut traversal around `position`.
    ///
    /// An internal node whose longest side `s` and centroid distance `d`
    /// satisfy `s / d < theta` is reported once as an
    /// [`Interaction::Cluster`]; otherwise its non-empty children are
    /// searched. Leaves report each of their points individually, skipping
    /// `exclude`. A `theta` of 0 never approximates and visits every point.
    pub fn barnes_hut(
        &self,
        position: &Vector<D>,
        exclude: Option<usize>,
        theta: f64,
        mut combine: impl FnMut(Interaction<'_, D, A>),
    ) {
        if self.nodes.is_empty() {
            return;
        }
        let mut stack = vec![0];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if node.count == 0 {
                continue;
            }
            match node.kind {
                Kind::Leaf { head } => {
                    let members = Colocated {
                        next: &self.next,
                        current: head,
                    };
                    for point in members.filter(|&p| Some(p) != exclude) {
                        combine(Interaction::Point {
                            index: point,
                            position: &self.points[point],
                        });
                    }
                }
                Kind::Internal { first_child } => {
                    let centroid = node.delegate.centroid();
                    // compared without dividing so d == 0 never approximates
                    if node.bounds.size() < theta * position.distance(&centroid) {
                        combine(Interaction::Cluster {
                            delegate: &node.delegate,
                            centroid,
                        });
                    } else {
                        stack.extend(
                            (first_child..first_child + Self::FANOUT)
                                .rev()
                                .filter(|&c| self.nodes[c].count > 0),
                        );
                    }
                }
            }
        }
    }
}
