//! Fluent builder for automation graphs
//!
//! Provides a compact API for constructing graphs programmatically, e.g. for
//! seeding templates or in tests. The builder does not validate; it only
//! produces a [`SerializedGraph`] (or a structurally checked graph via
//! [`GraphBuilder::build_graph`]).

use serde_json::Value;

use crate::contracts::ContractRegistry;
use crate::error::Result;
use crate::graph::{AutomationGraph, SerializedGraph};
use crate::types::{AutomationEdge, AutomationNode, NodeKind, Position};

/// Fluent builder for constructing automation graphs
///
/// # Example
///
/// ```ignore
/// let graph = GraphBuilder::new()
///     .trigger("new-lead", "lead_created")
///     .action("tag", "add_tag")
///     .with_config(serde_json::json!({"tag": "inbound"}))
///     .edge("new-lead", None, "tag")
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    nodes: Vec<AutomationNode>,
    edges: Vec<AutomationEdge>,
    metadata: serde_json::Map<String, Value>,
    edge_counter: usize,
}

impl GraphBuilder {
    /// Create a new graph builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with the kind's default configuration.
    ///
    /// Nodes are stacked vertically until positioned with [`Self::at`].
    pub fn node(mut self, id: impl Into<String>, kind: NodeKind, subtype: Option<&str>) -> Self {
        let config = ContractRegistry::with_builtin().default_config(kind, subtype);
        let position = Position::new(0.0, self.nodes.len() as f64 * 100.0);
        self.nodes
            .push(AutomationNode::with_config(id, kind, position, config));
        self
    }

    /// Add a trigger node
    pub fn trigger(self, id: impl Into<String>, trigger_type: &str) -> Self {
        self.node(id, NodeKind::Trigger, Some(trigger_type))
    }

    /// Add an action node
    pub fn action(self, id: impl Into<String>, action_type: &str) -> Self {
        self.node(id, NodeKind::Action, Some(action_type))
    }

    /// Add an `if` condition node with no rules
    pub fn condition(self, id: impl Into<String>) -> Self {
        self.node(id, NodeKind::Condition, Some("if"))
    }

    /// Add a delay node
    pub fn delay(self, id: impl Into<String>, delay_ms: u64) -> Self {
        self.node(id, NodeKind::Delay, None)
            .with_config(serde_json::json!({ "delay": delay_ms }))
    }

    /// Add a `times` loop node
    pub fn loop_node(self, id: impl Into<String>, max_iterations: u64) -> Self {
        self.node(id, NodeKind::Loop, Some("times"))
            .with_config(serde_json::json!({ "max_iterations": max_iterations }))
    }

    /// Merge config fields into the most recently added node
    ///
    /// Must be called immediately after adding a node. Non-object values
    /// are ignored.
    pub fn with_config(mut self, partial: Value) -> Self {
        if let (Some(node), Value::Object(fields)) = (self.nodes.last_mut(), partial) {
            node.config.extend(fields);
        }
        self
    }

    /// Append a rule to the most recently added condition node
    pub fn with_rule(mut self, field: &str, operator: &str, value: Value) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            let rules = node
                .config
                .entry("conditions")
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(rules) = rules {
                rules.push(serde_json::json!({
                    "field": field,
                    "operator": operator,
                    "value": value,
                }));
            }
        }
        self
    }

    /// Position the most recently added node
    pub fn at(mut self, x: f64, y: f64) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.position = Position::new(x, y);
        }
        self
    }

    /// Add an edge (auto-generates edge ID)
    pub fn edge(
        mut self,
        source: impl Into<String>,
        source_port: Option<&str>,
        target: impl Into<String>,
    ) -> Self {
        self.edge_counter += 1;
        let id = format!("edge-{}", self.edge_counter);
        self.edges
            .push(AutomationEdge::new(id, source, source_port, target));
        self
    }

    /// Add an edge with an explicit ID
    pub fn edge_with_id(
        mut self,
        edge_id: impl Into<String>,
        source: impl Into<String>,
        source_port: Option<&str>,
        target: impl Into<String>,
    ) -> Self {
        self.edges
            .push(AutomationEdge::new(edge_id, source, source_port, target));
        self
    }

    /// Set a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Build the serialized form without any checks
    pub fn build(self) -> SerializedGraph {
        SerializedGraph {
            nodes: self.nodes,
            edges: self.edges,
            metadata: self.metadata,
        }
    }

    /// Build a graph, checking only structural integrity
    pub fn build_graph(self) -> Result<AutomationGraph> {
        AutomationGraph::from_serialized(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_basic() {
        let graph = GraphBuilder::new()
            .trigger("t", "manual")
            .action("a", "add_tag")
            .with_config(json!({"tag": "contacted"}))
            .at(10.0, 20.0)
            .edge("t", None, "a")
            .with_metadata("name", json!("Tag new leads"))
            .build();

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.nodes[1].config.get("tag"), Some(&json!("contacted")));
        assert_eq!(graph.nodes[1].position, Position::new(10.0, 20.0));
        assert_eq!(graph.metadata.get("name"), Some(&json!("Tag new leads")));
    }

    #[test]
    fn test_builder_auto_edge_ids() {
        let graph = GraphBuilder::new()
            .trigger("t", "manual")
            .delay("d", 60_000)
            .action("a", "wait")
            .edge("t", None, "d")
            .edge("d", None, "a")
            .build();

        assert_eq!(graph.edges[0].id, "edge-1");
        assert_eq!(graph.edges[1].id, "edge-2");
        assert_eq!(graph.nodes[1].config.get("delay"), Some(&json!(60_000)));
    }

    #[test]
    fn test_builder_rules() {
        let graph = GraphBuilder::new()
            .condition("c")
            .with_rule("lead.status", "equals", json!("new"))
            .with_rule("lead.score", "greater_than", json!(40))
            .build();

        let rules = graph.nodes[0].config["conditions"].as_array().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1]["operator"], json!("greater_than"));
    }

    #[test]
    fn test_build_graph_checks_structure() {
        let result = GraphBuilder::new()
            .trigger("t", "manual")
            .edge("t", None, "missing")
            .build_graph();
        assert!(result.is_err());
    }
}
