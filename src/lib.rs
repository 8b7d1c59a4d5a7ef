//! forcegraph - Force-directed graph layout with an N-dimensional Barnes-Hut tree.
//!
//! The engine simulates repulsion, springs, centering, radial and axis forces
//! on a set of nodes until the layout settles. Positions live in a
//! const-generic [`Vector`], so the same code lays out graphs in 2D, 3D or
//! any other dimension.
//!
//! ```
//! use forcegraph::forces::{CenterForce, LinkForce, ManyBodyForce};
//! use forcegraph::simulation::{resolve_edges, SimulationBuilder};
//! use forcegraph::vector::Vector;
//!
//! let ids = vec!["a", "b", "c"];
//! let links = resolve_edges(&ids, [(&"a", &"b"), (&"b", &"c")]).unwrap();
//!
//! let mut sim = SimulationBuilder::new()
//!     .build::<_, 2>(ids)
//!     .unwrap()
//!     .with_force(ManyBodyForce::new())
//!     .unwrap()
//!     .with_force(LinkForce::new(links))
//!     .unwrap()
//!     .with_force(CenterForce::new(Vector::ZERO))
//!     .unwrap();
//!
//! while !sim.is_settled() {
//!     sim.tick(1);
//! }
//! assert!(sim.kinetic_state(&"b").is_some());
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod forces;
pub mod graph_types;
pub mod io;
pub mod layout;
pub mod lcg;
pub mod simulation;
pub mod tree;
pub mod vector;

pub use error::{SimulationError, SimulationResult};
pub use simulation::{KineticState, Simulation, SimulationBuilder};
pub use vector::{Vector, Vector2, Vector3};
