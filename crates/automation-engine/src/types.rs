//! Core types for automation graphs
//!
//! These types define the structure of automation graphs: typed nodes,
//! the directed edges between their ports, and node positions on the
//! editor canvas.

use serde::{Deserialize, Serialize};

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// Kind-specific configuration payload of a node
///
/// Always a JSON object; the shape each kind expects is described by its
/// [`NodeContract`](crate::contracts::NodeContract).
pub type NodeConfig = serde_json::Map<String, serde_json::Value>;

/// Named output ports
pub mod ports {
    /// Condition branch taken when the rules match
    pub const TRUE: &str = "true";
    /// Condition branch taken when the rules do not match
    pub const FALSE: &str = "false";
    /// Switch fallthrough branch
    pub const DEFAULT: &str = "default";
    /// Loop port followed once per iteration
    pub const LOOP_BODY: &str = "loop-body";
    /// Loop port followed after the last iteration
    pub const LOOP_EXIT: &str = "loop-exit";
}

/// The kind of a node. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Entry point of the workflow. Exactly one per graph.
    Trigger,
    /// Performs a CRM side effect (message, tag, task, ...)
    Action,
    /// Branches on a list of field rules
    Condition,
    /// Pauses the run for a fixed duration
    Delay,
    /// Repeats its body a bounded number of times
    Loop,
}

impl NodeKind {
    /// All kinds, in palette order
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Trigger,
        NodeKind::Action,
        NodeKind::Condition,
        NodeKind::Delay,
        NodeKind::Loop,
    ];

    /// Get the named output ports for this kind.
    ///
    /// An empty slice means the node has a single unnamed output.
    pub fn output_ports(&self) -> &'static [&'static str] {
        match self {
            NodeKind::Trigger | NodeKind::Action | NodeKind::Delay => &[],
            NodeKind::Condition => &[ports::TRUE, ports::FALSE, ports::DEFAULT],
            NodeKind::Loop => &[ports::LOOP_BODY, ports::LOOP_EXIT],
        }
    }

    /// Whether edges out of this kind are keyed by a named port
    pub fn is_branching(&self) -> bool {
        !self.output_ports().is_empty()
    }

    /// Check whether `port` is a valid output port for this kind
    pub fn accepts_port(&self, port: Option<&str>) -> bool {
        match port {
            None => !self.is_branching(),
            Some(name) => self.output_ports().contains(&name),
        }
    }

    /// Lower-case name as used in the serialized form and in messages
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Trigger => "trigger",
            NodeKind::Action => "action",
            NodeKind::Condition => "condition",
            NodeKind::Delay => "delay",
            NodeKind::Loop => "loop",
        }
    }

    /// Get a human-readable label for this kind
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Trigger => "Trigger",
            NodeKind::Action => "Action",
            NodeKind::Condition => "Condition",
            NodeKind::Delay => "Delay",
            NodeKind::Loop => "Loop",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position on the editor canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Return this position shifted by `(dx, dy)`
    pub fn offset(self, (dx, dy): (f64, f64)) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Replace NaN or infinite coordinates with `0.0`.
    ///
    /// JSON has no encoding for them, so a graph holding one could not be
    /// exported and imported again.
    pub fn finite_or_zero(self) -> Self {
        let clamp = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self {
            x: clamp(self.x),
            y: clamp(self.y),
        }
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A node instance in an automation graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationNode {
    /// Unique identifier for this node instance
    pub id: NodeId,
    /// Node kind; never changes after creation
    pub kind: NodeKind,
    /// Position in the editor
    pub position: Position,
    /// Kind-specific configuration
    pub config: NodeConfig,
}

impl AutomationNode {
    /// Create a node with an empty configuration
    pub fn new(id: impl Into<String>, kind: NodeKind, position: impl Into<Position>) -> Self {
        Self {
            id: id.into(),
            kind,
            position: position.into(),
            config: NodeConfig::new(),
        }
    }

    /// Create a node with the given configuration
    pub fn with_config(
        id: impl Into<String>,
        kind: NodeKind,
        position: impl Into<Position>,
        config: NodeConfig,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            position: position.into(),
            config,
        }
    }

    /// The configured subtype (`config.type`), if it is a string
    pub fn subtype(&self) -> Option<&str> {
        self.config.get("type").and_then(|v| v.as_str())
    }
}

/// A directed edge from a node's output port to another node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationEdge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Source node ID
    pub source_node_id: NodeId,
    /// Source port ("true", "loop-body", ...); absent for single-output kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_port: Option<String>,
    /// Target node ID
    pub target_node_id: NodeId,
}

impl AutomationEdge {
    /// Create a new edge
    pub fn new(
        id: impl Into<String>,
        source_node_id: impl Into<String>,
        source_port: Option<&str>,
        target_node_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_node_id: source_node_id.into(),
            source_port: source_port.map(str::to_string),
            target_node_id: target_node_id.into(),
        }
    }

    /// Whether this edge connects the same source, port and target
    pub fn same_connection(&self, source: &str, port: Option<&str>, target: &str) -> bool {
        self.source_node_id == source
            && self.source_port.as_deref() == port
            && self.target_node_id == target
    }

    /// Whether this edge touches `node_id` at either end
    pub fn references(&self, node_id: &str) -> bool {
        self.source_node_id == node_id || self.target_node_id == node_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_ports_per_kind() {
        assert!(NodeKind::Action.accepts_port(None));
        assert!(!NodeKind::Action.accepts_port(Some("true")));
        assert!(NodeKind::Condition.accepts_port(Some("false")));
        assert!(!NodeKind::Condition.accepts_port(None));
        assert!(NodeKind::Loop.accepts_port(Some("loop-exit")));
        assert!(!NodeKind::Loop.accepts_port(Some("true")));
    }

    #[test]
    fn test_edge_serializes_camel_case() {
        let edge = AutomationEdge::new("e1", "a", None, "b");
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "e1", "sourceNodeId": "a", "targetNodeId": "b"})
        );

        let branched = AutomationEdge::new("e2", "c", Some("true"), "d");
        let json = serde_json::to_string(&branched).unwrap();
        assert!(json.contains("\"sourcePort\":\"true\""));
    }

    #[test]
    fn test_position_finite_or_zero() {
        let position = Position::new(f64::NAN, f64::NEG_INFINITY).finite_or_zero();
        assert_eq!(position, Position::new(0.0, 0.0));
        assert!(position.is_finite());

        let kept = Position::new(12.5, -3.0);
        assert_eq!(kept.finite_or_zero(), kept);
        assert!(!Position::new(f64::INFINITY, 0.0).is_finite());
    }

    #[test]
    fn test_node_requires_config() {
        let missing = r#"{"id": "a", "kind": "action", "position": {"x": 0, "y": 0}}"#;
        assert!(serde_json::from_str::<AutomationNode>(missing).is_err());

        let present = r#"{"id": "a", "kind": "action", "position": {"x": 0, "y": 0}, "config": {}}"#;
        let node: AutomationNode = serde_json::from_str(present).unwrap();
        assert!(node.config.is_empty());
    }

    #[test]
    fn test_node_kind_serde() {
        let json = serde_json::to_string(&NodeKind::Loop).unwrap();
        assert_eq!(json, "\"loop\"");
        let kind: NodeKind = serde_json::from_str("\"condition\"").unwrap();
        assert_eq!(kind, NodeKind::Condition);
    }
}
