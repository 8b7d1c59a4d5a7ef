//! Graph input and layout output documents
//!
//! The input follows the common `{nodes, links}` shape used by d3 examples
//! such as the Les Misérables co-occurrence graph. Node `group` and `label`
//! and link `value` are carried along for renderers and never affect the
//! layout.

use serde::{Deserialize, Serialize};

use crate::error::{SimulationError, SimulationResult};
use crate::simulation::Simulation;
use crate::vector::Vector;

/// A node in the input graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique identifier, referenced by links
    pub id: String,

    /// Group or community the node belongs to; passed through, not used by
    /// the layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<u32>,

    /// Human-readable label; passed through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Starting position; one component per dimension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec<f64>>,

    /// Pin the node at its starting position
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fixed: bool,
}

impl GraphNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            group: None,
            label: None,
            position: None,
            fixed: false,
        }
    }
}

/// A link between two nodes, by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,

    /// Link weight (co-occurrence count in the miserables data); passed
    /// through, link stiffness comes from the layout config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl GraphLink {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            value: None,
        }
    }
}

/// Complete input graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub links: Vec<GraphLink>,
}

impl GraphData {
    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.nodes.iter().map(|n| &n.id)
    }

    /// Link endpoints as id pairs
    pub fn edges(&self) -> impl Iterator<Item = (&String, &String)> {
        self.links.iter().map(|l| (&l.source, &l.target))
    }
}

/// Final state of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLayout {
    pub id: String,
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fixed: bool,
}

/// Result of running a layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutOutput {
    pub dimensions: usize,
    /// Number of ticks that were run
    pub ticks: usize,
    /// Alpha after the last tick
    pub alpha: f64,
    pub nodes: Vec<NodeLayout>,
}

impl LayoutOutput {
    /// Snapshot the current state of `simulation`
    pub fn from_simulation<const D: usize>(
        simulation: &Simulation<String, D>,
        ticks: usize,
    ) -> Self {
        let nodes = simulation
            .ids()
            .iter()
            .zip(simulation.kinetics().iter())
            .map(|(id, state)| NodeLayout {
                id: id.clone(),
                position: state.position.as_array().to_vec(),
                velocity: state.velocity.as_array().to_vec(),
                fixed: state.is_fixed(),
            })
            .collect();

        Self {
            dimensions: D,
            ticks,
            alpha: simulation.alpha(),
            nodes,
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Convert a dimension-agnostic component list into a vector
pub(crate) fn to_vector<const D: usize>(components: &[f64]) -> SimulationResult<Vector<D>> {
    let array: [f64; D] =
        components
            .try_into()
            .map_err(|_| SimulationError::DimensionMismatch {
                expected: D,
                found: components.len(),
            })?;
    Ok(Vector::new(array))
}
