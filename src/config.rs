//! Layout configuration
//!
//! A [`LayoutConfig`] names the annealing parameters and the forces to
//! register, in order. It is read from YAML or JSON:
//!
//! ```yaml
//! simulation:
//!   velocity_decay: 0.6
//!   max_ticks: 500
//! forces:
//!   - type: many_body
//!     strength: -20
//!   - type: center
//!   - type: link
//!     distance: 35
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimulationResult;
use crate::forces::{
    CenterForce, DEFAULT_CHARGE, DEFAULT_DISTANCE_MIN, DEFAULT_LINK_DISTANCE,
    DEFAULT_POSITION_STRENGTH, DEFAULT_THETA, EdgeId, Force, LinkForce, ManyBodyForce,
    PositionForce, RadialForce, Stiffness,
};
use crate::graph_types::to_vector;
use crate::io::{ConfigResult, read_document};
use crate::lcg::DEFAULT_SEED;
use crate::simulation::{
    DEFAULT_ALPHA, DEFAULT_ALPHA_MIN, DEFAULT_VELOCITY_DECAY, SimulationBuilder,
};
use crate::vector::Vector;

fn default_charge() -> f64 {
    DEFAULT_CHARGE
}

fn default_theta() -> f64 {
    DEFAULT_THETA
}

fn default_distance_min() -> f64 {
    DEFAULT_DISTANCE_MIN
}

fn default_link_distance() -> f64 {
    DEFAULT_LINK_DISTANCE
}

fn default_position_strength() -> f64 {
    DEFAULT_POSITION_STRENGTH
}

fn default_one() -> f64 {
    1.0
}

fn default_iterations() -> usize {
    1
}

/// Annealing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub alpha: f64,
    pub alpha_min: f64,
    /// Derived from `alpha_min` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha_decay: Option<f64>,
    pub alpha_target: f64,
    pub velocity_decay: f64,
    pub seed: u32,
    /// Upper bound on ticks for a headless run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ticks: Option<usize>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            alpha_min: DEFAULT_ALPHA_MIN,
            alpha_decay: None,
            alpha_target: 0.0,
            velocity_decay: DEFAULT_VELOCITY_DECAY,
            seed: DEFAULT_SEED,
            max_ticks: None,
        }
    }
}

impl SimulationParams {
    pub fn builder(&self) -> SimulationBuilder {
        let builder = SimulationBuilder::new()
            .alpha(self.alpha)
            .alpha_min(self.alpha_min)
            .alpha_target(self.alpha_target)
            .velocity_decay(self.velocity_decay)
            .seed(self.seed);
        match self.alpha_decay {
            Some(decay) => builder.alpha_decay(decay),
            None => builder,
        }
    }
}

/// One force to register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ForceConfig {
    ManyBody {
        #[serde(default = "default_charge")]
        strength: f64,
        #[serde(default = "default_theta")]
        theta: f64,
        #[serde(default = "default_distance_min")]
        distance_min: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        distance_max: Option<f64>,
    },
    Center {
        /// Origin when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        center: Option<Vec<f64>>,
        #[serde(default = "default_one")]
        strength: f64,
    },
    Link {
        #[serde(default = "default_link_distance")]
        distance: f64,
        /// Weighted by degree when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        strength: Option<f64>,
        #[serde(default = "default_iterations")]
        iterations: usize,
    },
    Radial {
        radius: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        center: Option<Vec<f64>>,
        #[serde(default = "default_position_strength")]
        strength: f64,
    },
    Position {
        axis: usize,
        #[serde(default)]
        target: f64,
        #[serde(default = "default_position_strength")]
        strength: f64,
    },
}

fn point<const D: usize>(components: &Option<Vec<f64>>) -> SimulationResult<Vector<D>> {
    match components {
        Some(components) => to_vector(components),
        None => Ok(Vector::ZERO),
    }
}

impl ForceConfig {
    /// Build the force; link forces use `links`, the others ignore it
    pub fn build<const D: usize>(&self, links: &[EdgeId]) -> SimulationResult<Force<D>> {
        Ok(match self {
            ForceConfig::ManyBody {
                strength,
                theta,
                distance_min,
                distance_max,
            } => {
                let force = ManyBodyForce::<D>::new()
                    .with_strength(*strength)
                    .with_theta(*theta)
                    .with_distance_min(*distance_min);
                let force = match distance_max {
                    Some(max) => force.with_distance_max(*max),
                    None => force,
                };
                force.into()
            }
            ForceConfig::Center { center, strength } => {
                CenterForce::<D>::new(point(center)?).with_strength(*strength).into()
            }
            ForceConfig::Link {
                distance,
                strength,
                iterations,
            } => {
                let stiffness = match strength {
                    Some(k) => Stiffness::Constant(*k),
                    None => Stiffness::default(),
                };
                LinkForce::new(links.to_vec())
                    .with_rest_length(*distance)
                    .with_stiffness(stiffness)
                    .with_iterations(*iterations)
                    .into()
            }
            ForceConfig::Radial {
                radius,
                center,
                strength,
            } => RadialForce::<D>::new(point(center)?, *radius)
                .with_strength(*strength)
                .into(),
            ForceConfig::Position {
                axis,
                target,
                strength,
            } => PositionForce::new(*axis, *target)
                .with_strength(*strength)
                .into(),
        })
    }
}

/// Everything needed to run a layout besides the graph itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub simulation: SimulationParams,
    pub forces: Vec<ForceConfig>,
}

impl Default for LayoutConfig {
    /// Repulsion, degree-weighted links and centering
    fn default() -> Self {
        Self {
            simulation: SimulationParams::default(),
            forces: vec![
                ForceConfig::ManyBody {
                    strength: DEFAULT_CHARGE,
                    theta: DEFAULT_THETA,
                    distance_min: DEFAULT_DISTANCE_MIN,
                    distance_max: None,
                },
                ForceConfig::Link {
                    distance: DEFAULT_LINK_DISTANCE,
                    strength: None,
                    iterations: 1,
                },
                ForceConfig::Center {
                    center: None,
                    strength: 1.0,
                },
            ],
        }
    }
}

impl LayoutConfig {
    /// Load from a `.yaml`, `.yml` or `.json` file
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        read_document(path)
    }

    /// Build every configured force, in order
    pub fn build_forces<const D: usize>(
        &self,
        links: &[EdgeId],
    ) -> SimulationResult<Vec<Force<D>>> {
        self.forces.iter().map(|f| f.build(links)).collect()
    }
}
