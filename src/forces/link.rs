//! Link (spring) force between connected nodes
//!
//! Each link pulls its endpoints toward a rest length. The correction is split
//! between the two endpoints by degree, so a hub moves less than a leaf
//! attached to it. O(edges) per iteration.

use std::fmt;
use std::sync::Arc;

use super::{DEFAULT_LINK_DISTANCE, ForceLike};
use crate::error::{SimulationError, SimulationResult};
use crate::lcg::Lcg;
use crate::vector::Vector;

/// A link between two nodes, by dense node index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId {
    pub source: usize,
    pub target: usize,
}

impl EdgeId {
    pub fn new(source: usize, target: usize) -> Self {
        Self { source, target }
    }
}

/// Degree table for the links of one force
#[derive(Debug, Clone, Default)]
pub struct LinkLookup {
    degrees: Vec<usize>,
}

impl LinkLookup {
    pub fn new(node_count: usize, links: &[EdgeId]) -> SimulationResult<Self> {
        let mut degrees = vec![0; node_count];
        for (link, edge) in links.iter().enumerate() {
            for index in [edge.source, edge.target] {
                let degree = degrees
                    .get_mut(index)
                    .ok_or(SimulationError::LinkOutOfRange {
                        link,
                        index,
                        node_count,
                    })?;
                *degree += 1;
            }
        }
        Ok(Self { degrees })
    }

    /// Number of link endpoints touching `node`
    pub fn degree(&self, node: usize) -> usize {
        self.degrees.get(node).copied().unwrap_or(0)
    }
}

type LinkFn = Arc<dyn Fn(EdgeId, &LinkLookup) -> f64 + Send + Sync>;

/// A per-link parameter
#[derive(Clone)]
pub enum LinkDescriptor {
    Constant(f64),
    Varied(LinkFn),
}

impl LinkDescriptor {
    pub fn varied(f: impl Fn(EdgeId, &LinkLookup) -> f64 + Send + Sync + 'static) -> Self {
        Self::Varied(Arc::new(f))
    }

    fn resolve(&self, links: &[EdgeId], lookup: &LinkLookup) -> Vec<f64> {
        match self {
            Self::Constant(value) => vec![*value; links.len()],
            Self::Varied(f) => links.iter().map(|&edge| f(edge, lookup)).collect(),
        }
    }
}

impl From<f64> for LinkDescriptor {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

impl fmt::Debug for LinkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Varied(_) => f.write_str("Varied(..)"),
        }
    }
}

/// Spring stiffness of each link
#[derive(Clone)]
pub enum Stiffness {
    Constant(f64),
    Varied(LinkFn),
    /// `k(edge) / min(degree(source), degree(target))`
    WeightedByDegree(LinkFn),
}

impl Stiffness {
    pub fn varied(f: impl Fn(EdgeId, &LinkLookup) -> f64 + Send + Sync + 'static) -> Self {
        Self::Varied(Arc::new(f))
    }

    /// Constant `k` divided by the smaller endpoint degree
    pub fn weighted_by_degree(k: f64) -> Self {
        Self::WeightedByDegree(Arc::new(move |_, _| k))
    }

    fn resolve(&self, links: &[EdgeId], lookup: &LinkLookup) -> Vec<f64> {
        match self {
            Self::Constant(value) => vec![*value; links.len()],
            Self::Varied(f) => links.iter().map(|&edge| f(edge, lookup)).collect(),
            Self::WeightedByDegree(k) => links
                .iter()
                .map(|&edge| {
                    let degree = lookup.degree(edge.source).min(lookup.degree(edge.target));
                    k(edge, lookup) / degree.max(1) as f64
                })
                .collect(),
        }
    }
}

impl Default for Stiffness {
    fn default() -> Self {
        Self::weighted_by_degree(1.0)
    }
}

impl From<f64> for Stiffness {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

impl fmt::Debug for Stiffness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Varied(_) => f.write_str("Varied(..)"),
            Self::WeightedByDegree(_) => f.write_str("WeightedByDegree(..)"),
        }
    }
}

/// Spring force along a fixed set of links
#[derive(Debug, Clone)]
pub struct LinkForce {
    links: Vec<EdgeId>,
    rest_length: LinkDescriptor,
    stiffness: Stiffness,
    iterations: usize,
    lookup: LinkLookup,
    lengths: Vec<f64>,
    stiffnesses: Vec<f64>,
    bias: Vec<f64>,
}

impl LinkForce {
    pub fn new(links: Vec<EdgeId>) -> Self {
        Self {
            links,
            rest_length: LinkDescriptor::Constant(DEFAULT_LINK_DISTANCE),
            stiffness: Stiffness::default(),
            iterations: 1,
            lookup: LinkLookup::default(),
            lengths: Vec::new(),
            stiffnesses: Vec::new(),
            bias: Vec::new(),
        }
    }

    pub fn with_rest_length(mut self, rest_length: impl Into<LinkDescriptor>) -> Self {
        self.rest_length = rest_length.into();
        self
    }

    pub fn with_stiffness(mut self, stiffness: impl Into<Stiffness>) -> Self {
        self.stiffness = stiffness.into();
        self
    }

    /// Number of relaxation passes per tick
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    pub fn links(&self) -> &[EdgeId] {
        &self.links
    }

    /// Degrees computed at the last attach
    pub fn lookup(&self) -> &LinkLookup {
        &self.lookup
    }

    /// Resolved rest lengths (empty until attached)
    pub fn rest_lengths(&self) -> &[f64] {
        &self.lengths
    }

    /// Resolved stiffnesses (empty until attached)
    pub fn stiffnesses(&self) -> &[f64] {
        &self.stiffnesses
    }
}

impl<const D: usize> ForceLike<D> for LinkForce {
    fn attach(&mut self, node_count: usize) -> SimulationResult<()> {
        let lookup = LinkLookup::new(node_count, &self.links)?;
        self.lengths = self.rest_length.resolve(&self.links, &lookup);
        self.stiffnesses = self.stiffness.resolve(&self.links, &lookup);
        self.bias = self
            .links
            .iter()
            .map(|edge| {
                let source = lookup.degree(edge.source) as f64;
                let target = lookup.degree(edge.target) as f64;
                source / (source + target)
            })
            .collect();
        self.lookup = lookup;
        Ok(())
    }

    fn apply(
        &self,
        positions: &[Vector<D>],
        velocities: &mut [Vector<D>],
        alpha: f64,
        rng: &mut Lcg,
    ) {
        for _ in 0..self.iterations {
            for (k, edge) in self.links.iter().enumerate() {
                let (s, t) = (edge.source, edge.target);
                // predicted positions, so later links see earlier corrections
                let offset =
                    (positions[t] + velocities[t] - positions[s] - velocities[s]).jiggled(rng);
                let length = offset.length();
                let scale = (length - self.lengths[k]) / length * alpha * self.stiffnesses[k];
                let correction = offset * scale;
                velocities[t] -= correction * self.bias[k];
                velocities[s] += correction * (1.0 - self.bias[k]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vector2;

    fn attached(mut force: LinkForce, n: usize) -> LinkForce {
        ForceLike::<2>::attach(&mut force, n).unwrap();
        force
    }

    #[test]
    fn stretched_link_pulls_endpoints_together() {
        let force = attached(
            LinkForce::new(vec![EdgeId::new(0, 1)])
                .with_rest_length(10.0)
                .with_stiffness(1.0),
            2,
        );
        let positions = vec![Vector2::new([0.0, 0.0]), Vector2::new([20.0, 0.0])];
        let mut velocities = vec![Vector2::ZERO; 2];

        force.apply(&positions, &mut velocities, 1.0, &mut Lcg::default());

        // displacement 10, split evenly between equal-degree endpoints
        assert!((velocities[0][0] - 5.0).abs() < 1e-9);
        assert!((velocities[1][0] + 5.0).abs() < 1e-9);
    }

    #[test]
    fn compressed_link_pushes_endpoints_apart() {
        let force = attached(
            LinkForce::new(vec![EdgeId::new(0, 1)])
                .with_rest_length(2.0)
                .with_stiffness(1.0),
            2,
        );
        let positions = vec![Vector2::new([0.0, 0.0]), Vector2::new([1.0, 0.0])];
        let mut velocities = vec![Vector2::ZERO; 2];

        force.apply(&positions, &mut velocities, 1.0, &mut Lcg::default());

        assert!((velocities[0][0] + 0.5).abs() < 1e-9);
        assert!((velocities[1][0] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn degree_bias_moves_leaf_more_than_hub() {
        // star: node 0 is the hub
        let links = vec![EdgeId::new(0, 1), EdgeId::new(0, 2), EdgeId::new(0, 3)];
        let force = attached(LinkForce::new(links).with_rest_length(1.0).with_stiffness(1.0), 4);
        let positions = vec![
            Vector2::new([0.0, 0.0]),
            Vector2::new([5.0, 0.0]),
            Vector2::new([-5.0, 0.0]),
            Vector2::new([0.0, 5.0]),
        ];
        let mut velocities = vec![Vector2::ZERO; 4];

        force.apply(&positions, &mut velocities, 1.0, &mut Lcg::default());

        // hub degree 3, leaf degree 1 -> leaf takes 3/4 of the correction
        assert!((velocities[1][0] + 3.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_by_degree_divides_by_smaller_degree() {
        let links = vec![EdgeId::new(0, 1), EdgeId::new(1, 2), EdgeId::new(1, 3)];
        let force = attached(LinkForce::new(links), 4);

        // node 1 has degree 3, the others degree 1
        assert_eq!(force.stiffnesses(), &[1.0, 1.0, 1.0]);

        let links = vec![
            EdgeId::new(0, 1),
            EdgeId::new(1, 2),
            EdgeId::new(2, 0),
            EdgeId::new(0, 3),
        ];
        let force = attached(
            LinkForce::new(links).with_stiffness(Stiffness::weighted_by_degree(2.0)),
            4,
        );
        assert_eq!(force.stiffnesses(), &[1.0, 1.0, 1.0, 2.0]);
    }

    #[test]
    fn varied_rest_length_sees_degrees() {
        let links = vec![EdgeId::new(0, 1), EdgeId::new(0, 2)];
        let force = attached(
            LinkForce::new(links).with_rest_length(LinkDescriptor::varied(|edge, lookup| {
                10.0 * (lookup.degree(edge.source) + lookup.degree(edge.target)) as f64
            })),
            3,
        );
        assert_eq!(force.rest_lengths(), &[30.0, 30.0]);
    }

    #[test]
    fn out_of_range_link_is_rejected() {
        let mut force = LinkForce::new(vec![EdgeId::new(0, 5)]);
        let err = ForceLike::<2>::attach(&mut force, 2).unwrap_err();
        assert_eq!(
            err,
            SimulationError::LinkOutOfRange {
                link: 0,
                index: 5,
                node_count: 2
            }
        );
    }

    #[test]
    fn no_links_is_noop() {
        let force = attached(LinkForce::new(vec![]), 3);
        let positions = vec![Vector2::new([1.0, 2.0]); 3];
        let mut velocities = vec![Vector2::ZERO; 3];
        force.apply(&positions, &mut velocities, 1.0, &mut Lcg::default());
        assert_eq!(velocities, vec![Vector2::ZERO; 3]);
    }
}
