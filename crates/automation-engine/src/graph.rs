//! Automation graph storage and pure queries
//!
//! The graph keeps nodes and edges in insertion order. Mutation is
//! crate-private: outside callers edit a graph through a
//! [`BuilderSession`](crate::session::BuilderSession).

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{AutomationError, Result};
use crate::types::{AutomationEdge, AutomationNode, NodeId, NodeKind};

/// Portable snapshot of a graph, as exchanged with persistence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedGraph {
    /// Nodes in insertion order
    pub nodes: Vec<AutomationNode>,
    /// Edges in insertion order
    pub edges: Vec<AutomationEdge>,
    /// Free-form caller data (name, description, owner, ...)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl SerializedGraph {
    /// Parse a serialized graph from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AutomationError::import(e.to_string()))
    }

    /// Render as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A complete automation graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutomationGraph {
    nodes: Vec<AutomationNode>,
    edges: Vec<AutomationEdge>,
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl AutomationGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a serialized snapshot, checking structure.
    ///
    /// Fails on duplicate node ids, duplicate edge ids, non-finite node
    /// positions and edges whose endpoints are not in the node set.
    pub fn from_serialized(serialized: SerializedGraph) -> Result<Self> {
        let mut node_ids: HashSet<&str> = HashSet::new();
        for node in &serialized.nodes {
            if node.id.is_empty() {
                return Err(AutomationError::import("node with empty id"));
            }
            if !node.position.is_finite() {
                return Err(AutomationError::import(format!(
                    "node '{}' has a non-finite position",
                    node.id
                )));
            }
            if !node_ids.insert(node.id.as_str()) {
                return Err(AutomationError::import(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
        }

        let mut edge_ids: HashSet<&str> = HashSet::new();
        for edge in &serialized.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(AutomationError::import(format!(
                    "duplicate edge id '{}'",
                    edge.id
                )));
            }
            for endpoint in [&edge.source_node_id, &edge.target_node_id] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(AutomationError::import(format!(
                        "edge '{}' references unknown node '{}'",
                        edge.id, endpoint
                    )));
                }
            }
        }

        Ok(Self {
            nodes: serialized.nodes,
            edges: serialized.edges,
            metadata: serialized.metadata,
        })
    }

    /// Produce a portable snapshot of this graph
    pub fn to_serialized(&self) -> SerializedGraph {
        SerializedGraph {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            metadata: self.metadata.clone(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Find a node by ID
    pub fn get_node(&self, id: &str) -> Result<&AutomationNode> {
        self.nodes
            .iter()
            .find(|n| n.id == id)
            .ok_or_else(|| AutomationError::not_found(id))
    }

    /// Check whether a node exists
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Find an edge by ID
    pub fn find_edge(&self, id: &str) -> Option<&AutomationEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> &[AutomationNode] {
        &self.nodes
    }

    /// All edges in insertion order
    pub fn edges(&self) -> &[AutomationEdge] {
        &self.edges
    }

    /// Caller-owned metadata
    pub fn metadata(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.metadata
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Nodes of the given kind, in insertion order
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &AutomationNode> + '_ {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    /// Get edges going out of a node, optionally restricted to one port
    pub fn outgoing_edges(&self, node_id: &str, port: Option<&str>) -> Vec<&AutomationEdge> {
        self.edges
            .iter()
            .filter(|e| e.source_node_id == node_id)
            .filter(|e| port.is_none() || e.source_port.as_deref() == port)
            .collect()
    }

    /// Get edges coming into a node
    pub fn incoming_edges(&self, node_id: &str) -> Vec<&AutomationEdge> {
        self.edges
            .iter()
            .filter(|e| e.target_node_id == node_id)
            .collect()
    }

    /// Breadth-first set of nodes reachable from `node_id`, including itself
    pub fn reachable_from(&self, node_id: &str) -> Result<HashSet<NodeId>> {
        self.get_node(node_id)?;

        let adjacency = self.adjacency();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        visited.insert(node_id.to_string());
        queue.push_back(node_id);

        while let Some(current) = queue.pop_front() {
            for &next in adjacency.get(current).into_iter().flatten() {
                if visited.insert(next.to_string()) {
                    queue.push_back(next);
                }
            }
        }

        Ok(visited)
    }

    /// Map from node id to its direct successors, in edge order
    pub(crate) fn adjacency(&self) -> HashMap<&str, Vec<&str>> {
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in &self.edges {
            adjacency
                .entry(edge.source_node_id.as_str())
                .or_default()
                .push(edge.target_node_id.as_str());
        }
        adjacency
    }

    // =========================================================================
    // Crate-private mutation
    // =========================================================================

    pub(crate) fn get_node_mut(&mut self, id: &str) -> Result<&mut AutomationNode> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AutomationError::not_found(id))
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [AutomationNode] {
        &mut self.nodes
    }

    pub(crate) fn push_node(&mut self, node: AutomationNode) {
        self.nodes.push(node);
    }

    pub(crate) fn push_edge(&mut self, edge: AutomationEdge) {
        self.edges.push(edge);
    }

    /// Remove a node and every edge touching it.
    ///
    /// Returns the removed node and the ids of the removed edges.
    pub(crate) fn remove_node(&mut self, id: &str) -> Option<(AutomationNode, Vec<String>)> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(index);

        let mut removed_edges = Vec::new();
        self.edges.retain(|e| {
            if e.references(id) {
                removed_edges.push(e.id.clone());
                false
            } else {
                true
            }
        });

        Some((node, removed_edges))
    }

    pub(crate) fn remove_edge(&mut self, id: &str) -> Option<AutomationEdge> {
        let index = self.edges.iter().position(|e| e.id == id)?;
        Some(self.edges.remove(index))
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut serde_json::Map<String, serde_json::Value> {
        &mut self.metadata
    }
}

impl TryFrom<SerializedGraph> for AutomationGraph {
    type Error = AutomationError;

    fn try_from(serialized: SerializedGraph) -> Result<Self> {
        Self::from_serialized(serialized)
    }
}
