//! Forces acting on the simulation's nodes
//!
//! Every force reads node positions and adds to node velocities; none of
//! them move a node directly. The simulation applies its forces in the order
//! they were registered, once per tick, before integrating positions.
//!
//! # Forces
//!
//! - **Many-Body**: inverse-square repulsion (or attraction) between all
//!   nodes, approximated with a Barnes-Hut tree rebuilt every tick
//! - **Center**: translates the centroid of all nodes toward a target point
//! - **Link**: spring forces between connected nodes
//! - **Radial**: pulls nodes toward a circle (sphere) around a center
//! - **Position**: pulls one coordinate of each node toward a target value
//!
//! Per-node parameters are given as [`Descriptor`]s and resolved to plain
//! arrays exactly once, when the force is attached to a simulation.

mod center;
mod link;
mod many_body;
mod position;
mod radial;

use std::fmt;
use std::sync::Arc;

pub use center::CenterForce;
pub use link::{EdgeId, LinkDescriptor, LinkForce, LinkLookup, Stiffness};
pub use many_body::ManyBodyForce;
pub use position::PositionForce;
pub use radial::RadialForce;

use crate::error::SimulationResult;
use crate::lcg::Lcg;
use crate::vector::Vector;

/// Default many-body strength (negative = repulsion, matches D3.js)
pub const DEFAULT_CHARGE: f64 = -30.0;

/// Default Barnes-Hut theta approximation threshold (0 = exact)
pub const DEFAULT_THETA: f64 = 0.9;

/// Default minimum distance for many-body force calculations (avoids singularity)
pub const DEFAULT_DISTANCE_MIN: f64 = 1.0;

/// Default link rest length
pub const DEFAULT_LINK_DISTANCE: f64 = 30.0;

/// Default strength of the radial and position forces
pub const DEFAULT_POSITION_STRENGTH: f64 = 0.1;

/// A per-node parameter: one value for every node, or a function of the
/// node's dense index.
///
/// Varied descriptors are evaluated once per node at attach time and never
/// again.
pub enum Descriptor<T> {
    Constant(T),
    Varied(Arc<dyn Fn(usize) -> T + Send + Sync>),
}

impl<T: Clone> Descriptor<T> {
    pub fn varied(f: impl Fn(usize) -> T + Send + Sync + 'static) -> Self {
        Self::Varied(Arc::new(f))
    }

    /// Evaluate the descriptor for nodes `0..count`
    pub fn resolve(&self, count: usize) -> Vec<T> {
        match self {
            Self::Constant(value) => vec![value.clone(); count],
            Self::Varied(f) => (0..count).map(|i| f(i)).collect(),
        }
    }
}

impl<T: Clone> Clone for Descriptor<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Constant(value) => Self::Constant(value.clone()),
            Self::Varied(f) => Self::Varied(Arc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Descriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Varied(_) => f.write_str("Varied(..)"),
        }
    }
}

impl From<f64> for Descriptor<f64> {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

/// Common interface of all forces
pub trait ForceLike<const D: usize> {
    /// Resolve per-node parameters for a simulation with `node_count` nodes.
    ///
    /// Called once when the force is registered with a simulation.
    fn attach(&mut self, node_count: usize) -> SimulationResult<()>;

    /// Add this force's contribution for one tick to `velocities`
    fn apply(
        &self,
        positions: &[Vector<D>],
        velocities: &mut [Vector<D>],
        alpha: f64,
        rng: &mut Lcg,
    );
}

/// The closed set of forces a simulation can hold
#[derive(Debug, Clone)]
pub enum Force<const D: usize> {
    ManyBody(ManyBodyForce<D>),
    Center(CenterForce<D>),
    Link(LinkForce),
    Radial(RadialForce<D>),
    Position(PositionForce),
}

impl<const D: usize> Force<D> {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Force::ManyBody(_) => "many_body",
            Force::Center(_) => "center",
            Force::Link(_) => "link",
            Force::Radial(_) => "radial",
            Force::Position(_) => "position",
        }
    }
}

impl<const D: usize> ForceLike<D> for Force<D> {
    fn attach(&mut self, node_count: usize) -> SimulationResult<()> {
        match self {
            Force::ManyBody(f) => ForceLike::<D>::attach(f, node_count),
            Force::Center(f) => ForceLike::<D>::attach(f, node_count),
            Force::Link(f) => ForceLike::<D>::attach(f, node_count),
            Force::Radial(f) => ForceLike::<D>::attach(f, node_count),
            Force::Position(f) => ForceLike::<D>::attach(f, node_count),
        }
    }

    fn apply(
        &self,
        positions: &[Vector<D>],
        velocities: &mut [Vector<D>],
        alpha: f64,
        rng: &mut Lcg,
    ) {
        match self {
            Force::ManyBody(f) => ForceLike::<D>::apply(f, positions, velocities, alpha, rng),
            Force::Center(f) => ForceLike::<D>::apply(f, positions, velocities, alpha, rng),
            Force::Link(f) => ForceLike::<D>::apply(f, positions, velocities, alpha, rng),
            Force::Radial(f) => ForceLike::<D>::apply(f, positions, velocities, alpha, rng),
            Force::Position(f) => ForceLike::<D>::apply(f, positions, velocities, alpha, rng),
        }
    }
}

impl<const D: usize> From<ManyBodyForce<D>> for Force<D> {
    fn from(force: ManyBodyForce<D>) -> Self {
        Force::ManyBody(force)
    }
}

impl<const D: usize> From<CenterForce<D>> for Force<D> {
    fn from(force: CenterForce<D>) -> Self {
        Force::Center(force)
    }
}

impl<const D: usize> From<LinkForce> for Force<D> {
    fn from(force: LinkForce) -> Self {
        Force::Link(force)
    }
}

impl<const D: usize> From<RadialForce<D>> for Force<D> {
    fn from(force: RadialForce<D>) -> Self {
        Force::Radial(force)
    }
}

impl<const D: usize> From<PositionForce> for Force<D> {
    fn from(force: PositionForce) -> Self {
        Force::Position(force)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn constant_descriptor_fills_every_node() {
        let d = Descriptor::Constant(2.5);
        assert_eq!(d.resolve(3), vec![2.5, 2.5, 2.5]);
        assert!(d.resolve(0).is_empty());
    }

    #[test]
    fn varied_descriptor_sees_indices() {
        let d = Descriptor::varied(|i| i as f64 * 10.0);
        assert_eq!(d.resolve(3), vec![0.0, 10.0, 20.0]);
    }

    #[test]
    fn varied_descriptor_runs_once_per_node_on_attach() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut force: Force<2> = RadialForce::new(Vector::ZERO, 10.0)
            .with_strength(Descriptor::varied(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                0.5
            }))
            .into();

        force.attach(4).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        let positions = vec![Vector::new([1.0, 0.0]); 4];
        let mut velocities = vec![Vector::ZERO; 4];
        let mut rng = Lcg::default();
        for _ in 0..5 {
            force.apply(&positions, &mut velocities, 1.0, &mut rng);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn descriptor_debug_hides_closure() {
        let d: Descriptor<f64> = Descriptor::varied(|_| 1.0);
        assert_eq!(format!("{d:?}"), "Varied(..)");
        assert_eq!(format!("{:?}", Descriptor::Constant(1.5)), "Constant(1.5)");
    }

    #[test]
    fn force_names() {
        let forces: Vec<Force<2>> = vec![
            ManyBodyForce::new().into(),
            CenterForce::new(Vector::ZERO).into(),
            LinkForce::new(vec![]).into(),
            RadialForce::new(Vector::ZERO, 1.0).into(),
            PositionForce::new(0, 0.0).into(),
        ];
        let names: Vec<_> = forces.iter().map(Force::name).collect();
        assert_eq!(names, ["many_body", "center", "link", "radial", "position"]);
    }
}
