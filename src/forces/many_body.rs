//! Many-body force with Barnes-Hut approximation
//!
//! Every node feels every other node with a strength that falls off with the
//! inverse of the distance. Distant groups of nodes are replaced by their
//! strength-weighted centroid using a [`SpatialTree`] rebuilt on each tick,
//! giving O(n log n) per tick instead of O(n²).

use super::{DEFAULT_CHARGE, DEFAULT_DISTANCE_MIN, DEFAULT_THETA, Descriptor, ForceLike};
use crate::error::SimulationResult;
use crate::lcg::Lcg;
use crate::tree::{Interaction, MassCentroid, SpatialTree};
use crate::vector::Vector;

/// Repulsion (negative strength) or attraction (positive strength) between
/// all pairs of nodes
#[derive(Debug, Clone)]
pub struct ManyBodyForce<const D: usize> {
    strength: Descriptor<f64>,
    theta: f64,
    distance_min: f64,
    distance_max: f64,
    strengths: Vec<f64>,
}

impl<const D: usize> Default for ManyBodyForce<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize> ManyBodyForce<D> {
    pub fn new() -> Self {
        Self {
            strength: Descriptor::Constant(DEFAULT_CHARGE),
            theta: DEFAULT_THETA,
            distance_min: DEFAULT_DISTANCE_MIN,
            distance_max: f64::INFINITY,
            strengths: Vec::new(),
        }
    }

    /// Set the per-node strength (negative = repulsion)
    pub fn with_strength(mut self, strength: impl Into<Descriptor<f64>>) -> Self {
        self.strength = strength.into();
        self
    }

    /// Set the Barnes-Hut accuracy threshold (0 = exact)
    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta.max(0.0);
        self
    }

    /// Distances below this are softened to avoid huge forces between close nodes
    pub fn with_distance_min(mut self, distance_min: f64) -> Self {
        self.distance_min = distance_min.max(0.0);
        self
    }

    /// Pairs farther apart than this do not interact
    pub fn with_distance_max(mut self, distance_max: f64) -> Self {
        self.distance_max = distance_max;
        self
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Resolved per-node strengths (empty until attached)
    pub fn strengths(&self) -> &[f64] {
        &self.strengths
    }

    /// Velocity change for the node at `index` from every other node.
    ///
    /// `tree` must have been built over `positions` with this force's strengths.
    fn velocity_delta(
        &self,
        tree: &SpatialTree<'_, D, MassCentroid<D>>,
        positions: &[Vector<D>],
        index: usize,
        alpha: f64,
        rng: &mut Lcg,
    ) -> Vector<D> {
        let position = positions[index];
        let distance_min2 = self.distance_min * self.distance_min;
        let distance_max2 = self.distance_max * self.distance_max;
        let mut delta = Vector::ZERO;

        tree.barnes_hut(&position, Some(index), self.theta, |hit| {
            let (other, strength) = match hit {
                Interaction::Cluster { delegate, centroid } => (centroid, delegate.strength),
                Interaction::Point {
                    index: other_index,
                    position: other_position,
                } => (*other_position, self.strengths[other_index]),
            };
            let offset = (other - position).jiggled(rng);
            let mut l = offset.length_squared();
            if l >= distance_max2 {
                return;
            }
            if l < distance_min2 {
                l = (distance_min2 * l).sqrt();
            }
            delta += offset * (strength * alpha / l);
        });

        delta
    }
}

impl<const D: usize> ForceLike<D> for ManyBodyForce<D> {
    fn attach(&mut self, node_count: usize) -> SimulationResult<()> {
        self.strengths = self.strength.resolve(node_count);
        Ok(())
    }

    fn apply(
        &self,
        positions: &[Vector<D>],
        velocities: &mut [Vector<D>],
        alpha: f64,
        rng: &mut Lcg,
    ) {
        debug_assert_eq!(self.strengths.len(), positions.len());
        let tree = SpatialTree::build(positions, |i, p| MassCentroid::point(self.strengths[i], *p));

        for (index, velocity) in velocities.iter_mut().enumerate() {
            *velocity += self.velocity_delta(&tree, positions, index, alpha, rng);
        }
    }
}
