//! Radial force
//!
//! Pulls each node toward a circle (a sphere in 3D) of a per-node radius
//! around a center point. O(n).

use super::{DEFAULT_POSITION_STRENGTH, Descriptor, ForceLike};
use crate::error::SimulationResult;
use crate::lcg::Lcg;
use crate::vector::Vector;

#[derive(Debug, Clone)]
pub struct RadialForce<const D: usize> {
    center: Vector<D>,
    radius: Descriptor<f64>,
    strength: Descriptor<f64>,
    radii: Vec<f64>,
    strengths: Vec<f64>,
}

impl<const D: usize> RadialForce<D> {
    pub fn new(center: Vector<D>, radius: impl Into<Descriptor<f64>>) -> Self {
        Self {
            center,
            radius: radius.into(),
            strength: Descriptor::Constant(DEFAULT_POSITION_STRENGTH),
            radii: Vec::new(),
            strengths: Vec::new(),
        }
    }

    pub fn with_strength(mut self, strength: impl Into<Descriptor<f64>>) -> Self {
        self.strength = strength.into();
        self
    }

    /// Resolved per-node radii (empty until attached)
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }
}

impl<const D: usize> ForceLike<D> for RadialForce<D> {
    fn attach(&mut self, node_count: usize) -> SimulationResult<()> {
        self.radii = self.radius.resolve(node_count);
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
        let per_node = self.radii.iter().zip(&self.strengths);
        for ((position, velocity), (radius, strength)) in
            positions.iter().zip(velocities.iter_mut()).zip(per_node)
        {
            // a node sitting on the center gets a tiny arbitrary direction
            let offset = (*position - self.center).jiggled(rng);
            let r = offset.length();
            let k = (radius - r) * strength * alpha / r;
            *velocity += offset * k;
        }
    }
}
