//! Error types for the automation engine
//!
//! Validation findings are not errors: they are returned as data in a
//! [`ValidationResult`](crate::validation::ValidationResult). The variants
//! here describe operations that could not be carried out at all.

use thiserror::Error;

use crate::types::NodeId;

/// Result type alias using AutomationError
pub type Result<T> = std::result::Result<T, AutomationError>;

/// Why a `connect` call was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidEdgeReason {
    /// One of the endpoints does not exist in the graph
    DanglingEndpoint { node_id: NodeId },
    /// Source and target are the same node
    SelfLoop { node_id: NodeId },
    /// An edge with the same source, port and target already exists
    Duplicate,
    /// The source node kind has no output port with this name
    UnknownPort { port: Option<String> },
    /// A branching port (condition/loop) is already connected
    PortOccupied { port: String },
    /// Triggers are entry points and never accept incoming edges
    TriggerTarget { node_id: NodeId },
}

impl std::fmt::Display for InvalidEdgeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DanglingEndpoint { node_id } => {
                write!(f, "node '{}' does not exist", node_id)
            }
            Self::SelfLoop { node_id } => {
                write!(f, "node '{}' cannot connect to itself", node_id)
            }
            Self::Duplicate => write!(f, "an identical edge already exists"),
            Self::UnknownPort { port: Some(port) } => {
                write!(f, "source node has no output port '{}'", port)
            }
            Self::UnknownPort { port: None } => {
                write!(f, "source node requires a named output port")
            }
            Self::PortOccupied { port } => {
                write!(f, "output port '{}' is already connected", port)
            }
            Self::TriggerTarget { node_id } => {
                write!(f, "trigger node '{}' cannot have incoming connections", node_id)
            }
        }
    }
}

/// Errors that can occur in the automation engine
#[derive(Debug, Error)]
pub enum AutomationError {
    /// A node id referenced by an operation does not exist
    #[error("Node not found: {node_id}")]
    NodeNotFound { node_id: NodeId },

    /// An edge could not be created
    #[error("Invalid edge: {0}")]
    InvalidEdge(InvalidEdgeReason),

    /// A serialized graph could not be imported
    #[error("Import failed: {0}")]
    Import(String),

    /// A graph with blocking validation errors was handed to a save path
    #[error("Workflow is invalid: {}", errors.join("; "))]
    InvalidWorkflow { errors: Vec<String> },

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AutomationError {
    /// Create a not-found error for a node id
    pub fn not_found(node_id: impl Into<NodeId>) -> Self {
        Self::NodeNotFound {
            node_id: node_id.into(),
        }
    }

    /// Create an import error with a message
    pub fn import(msg: impl Into<String>) -> Self {
        Self::Import(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_edge_display() {
        let err = AutomationError::InvalidEdge(InvalidEdgeReason::PortOccupied {
            port: "true".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Invalid edge: output port 'true' is already connected"
        );
    }

    #[test]
    fn test_invalid_workflow_joins_errors() {
        let err = AutomationError::InvalidWorkflow {
            errors: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "Workflow is invalid: a; b");
    }
}
