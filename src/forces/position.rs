//! Single-axis position force
//!
//! Pulls one coordinate of every node toward a per-node target value while
//! leaving the other coordinates alone. With axis 0 this is d3's `forceX`,
//! with axis 1 `forceY`.

use super::{DEFAULT_POSITION_STRENGTH, Descriptor, ForceLike};
use crate::error::{SimulationError, SimulationResult};
use crate::lcg::Lcg;
use crate::vector::Vector;

#[derive(Debug, Clone)]
pub struct PositionForce {
    axis: usize,
    target: Descriptor<f64>,
    strength: Descriptor<f64>,
    targets: Vec<f64>,
    strengths: Vec<f64>,
}

impl PositionForce {
    pub fn new(axis: usize, target: impl Into<Descriptor<f64>>) -> Self {
        Self {
            axis,
            target: target.into(),
            strength: Descriptor::Constant(DEFAULT_POSITION_STRENGTH),
            targets: Vec::new(),
            strengths: Vec::new(),
        }
    }

    pub fn with_strength(mut self, strength: impl Into<Descriptor<f64>>) -> Self {
        self.strength = strength.into();
        self
    }

    pub fn axis(&self) -> usize {
        self.axis
    }
}

impl<const D: usize> ForceLike<D> for PositionForce {
    fn attach(&mut self, node_count: usize) -> SimulationResult<()> {
        if self.axis >= D {
            return Err(SimulationError::InvalidAxis {
                axis: self.axis,
                dimensions: D,
            });
        }
        self.targets = self.target.resolve(node_count);
        self.strengths = self.strength.resolve(node_count);
        Ok(())
    }

    fn apply(
        &self,
        positions: &[Vector<D>],
        velocities: &mut [Vector<D>],
        alpha: f64,
        _rng: &mut Lcg,
    ) {
        let axis = self.axis;
        let per_node = self.targets.iter().zip(&self.strengths);
        for ((position, velocity), (target, strength)) in
            positions.iter().zip(velocities.iter_mut()).zip(per_node)
        {
            velocity[axis] += (target - position[axis]) * strength * alpha;
        }
    }
}
