//! Centering force

use super::ForceLike;
use crate::error::SimulationResult;
use crate::lcg::Lcg;
use crate::vector::Vector;

/// Moves the centroid of all nodes toward a target point.
///
/// Every node receives the same velocity change, so relative positions are
/// unaffected. O(n).
#[derive(Debug, Clone)]
pub struct CenterForce<const D: usize> {
    center: Vector<D>,
    strength: f64,
}

impl<const D: usize> CenterForce<D> {
    pub fn new(center: Vector<D>) -> Self {
        Self {
            center,
            strength: 1.0,
        }
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    pub fn center(&self) -> Vector<D> {
        self.center
    }
}

impl<const D: usize> ForceLike<D> for CenterForce<D> {
    fn attach(&mut self, _node_count: usize) -> SimulationResult<()> {
        Ok(())
    }

    fn apply(
        &self,
        positions: &[Vector<D>],
        velocities: &mut [Vector<D>],
        alpha: f64,
        _rng: &mut Lcg,
    ) {
        if positions.is_empty() {
            return;
        }
        let sum = positions.iter().fold(Vector::ZERO, |acc, p| acc + *p);
        let centroid = sum / positions.len() as f64;
        let shift = (self.center - centroid) * (self.strength * alpha);
        for velocity in velocities.iter_mut() {
            *velocity += shift;
        }
    }
}
