//! Error types for building and reseeding simulations
//!
//! Steady-state ticking never fails. Errors are only reported while a
//! simulation, its forces, or its links are being set up.

use thiserror::Error;

/// Errors that can occur while constructing or reviving a simulation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// A link refers to a node id that is not part of the simulation
    #[error("unknown node id {0} referenced by a link")]
    UnknownNode(String),

    /// The same external id was given for more than one node
    #[error("duplicate node id {0}")]
    DuplicateNode(String),

    /// A link endpoint is not a valid dense node index
    #[error("link {link} refers to node {index}, but the simulation has {node_count} nodes")]
    LinkOutOfRange {
        link: usize,
        index: usize,
        node_count: usize,
    },

    /// A position force targets an axis the simulation does not have
    #[error("axis {axis} is out of range for a {dimensions}-dimensional simulation")]
    InvalidAxis { axis: usize, dimensions: usize },

    /// A vector-valued parameter has the wrong number of components
    #[error("expected {expected} components, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// Result type for simulation setup
pub type SimulationResult<T> = Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SimulationError::UnknownNode("\"z\"".to_string());
        insta::assert_snapshot!(err.to_string(), @r#"unknown node id "z" referenced by a link"#);

        let err = SimulationError::InvalidAxis {
            axis: 2,
            dimensions: 2,
        };
        insta::assert_snapshot!(err.to_string(), @"axis 2 is out of range for a 2-dimensional simulation");

        let err = SimulationError::LinkOutOfRange {
            link: 0,
            index: 7,
            node_count: 3,
        };
        insta::assert_snapshot!(err.to_string(), @"link 0 refers to node 7, but the simulation has 3 nodes");
    }
}
