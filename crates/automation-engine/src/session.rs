//! Builder session: the single mutable entry point for editing a graph
//!
//! A session owns one [`AutomationGraph`] and re-validates it after every
//! mutation. Operations that cannot be carried out at all return an
//! [`AutomationError`]; a graph that is merely incomplete or invalid is
//! reported through the cached [`ValidationResult`] instead, so an editor can
//! pass through invalid states freely.
//!
//! Sessions are single-writer and synchronous. Two editors working on the
//! same workflow each hydrate their own session from the same snapshot.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::contracts::ContractRegistry;
use crate::error::{AutomationError, InvalidEdgeReason, Result};
use crate::events::{EventSink, NullEventSink, SessionEvent};
use crate::graph::{AutomationGraph, SerializedGraph};
use crate::layout;
use crate::types::{AutomationEdge, AutomationNode, NodeConfig, NodeKind, Position};
use crate::validation::{validate_graph, ValidationResult};

/// Lifecycle of a session.
///
/// Saving is the caller's business, so there is no `Saved` state; a
/// discarded session is consumed by [`BuilderSession::discard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing has been added or imported yet
    Empty,
    /// The graph has been edited or loaded
    Editing,
}

/// Mutable editing session over one automation graph
pub struct BuilderSession {
    graph: AutomationGraph,
    registry: ContractRegistry,
    config: SessionConfig,
    validation: ValidationResult,
    events: Arc<dyn EventSink>,
    state: SessionState,
    dirty: bool,
}

impl BuilderSession {
    /// Create a session over an empty graph
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Create a session over an empty graph with the given configuration
    pub fn with_config(config: SessionConfig) -> Self {
        let graph = AutomationGraph::new();
        let registry = ContractRegistry::with_builtin();
        let validation = validate_graph(&graph, &registry);
        Self {
            graph,
            registry,
            config,
            validation,
            events: Arc::new(NullEventSink),
            state: SessionState::Empty,
            dirty: false,
        }
    }

    /// Hydrate a session from a persisted snapshot.
    ///
    /// The session starts in `Editing` with no unsaved changes.
    pub fn from_serialized(serialized: SerializedGraph, config: SessionConfig) -> Result<Self> {
        let mut session = Self::with_config(config);
        session.graph = AutomationGraph::from_serialized(serialized)?;
        session.state = SessionState::Editing;
        session.refresh_validation();
        Ok(session)
    }

    /// Route change notifications to `sink`
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    /// Replace the contract registry and re-validate
    pub fn with_registry(mut self, registry: ContractRegistry) -> Self {
        self.registry = registry;
        self.refresh_validation();
        self
    }

    // =========================================================================
    // Read access
    // =========================================================================

    /// The current graph
    pub fn graph(&self) -> &AutomationGraph {
        &self.graph
    }

    /// The latest cached validation result
    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the graph changed since it was loaded or last marked saved
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Record that the caller persisted the current graph
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    // =========================================================================
    // Node operations
    // =========================================================================

    /// Add a node with the kind's default configuration.
    ///
    /// Non-finite coordinates are stored as `0.0`.
    pub fn add_node(
        &mut self,
        kind: NodeKind,
        position: impl Into<Position>,
        subtype: Option<&str>,
    ) -> AutomationNode {
        let config = self.registry.default_config(kind, subtype);
        let position: Position = position.into();
        let position = position.finite_or_zero();
        let node = AutomationNode::with_config(fresh_id("node"), kind, position, config);
        log::debug!("Adding {} node {}", kind, node.id);

        self.graph.push_node(node.clone());
        self.after_mutation(SessionEvent::NodeAdded {
            node_id: node.id.clone(),
            kind,
        });
        node
    }

    /// Remove a node and every edge referencing it.
    ///
    /// Removing a node that does not exist is a no-op.
    pub fn remove_node(&mut self, node_id: &str) {
        let Some((node, removed_edges)) = self.graph.remove_node(node_id) else {
            log::debug!("remove_node: node {} already absent", node_id);
            return;
        };
        log::debug!(
            "Removed node {} and {} edge(s)",
            node.id,
            removed_edges.len()
        );
        self.after_mutation(SessionEvent::NodeRemoved {
            node_id: node.id,
            removed_edges,
        });
    }

    /// Move a node on the canvas; non-finite coordinates become `0.0`
    pub fn move_node(&mut self, node_id: &str, position: impl Into<Position>) -> Result<()> {
        let position: Position = position.into();
        let node = self.graph.get_node_mut(node_id)?;
        node.position = position.finite_or_zero();
        self.after_mutation(SessionEvent::NodeMoved {
            node_id: node_id.to_string(),
        });
        Ok(())
    }

    /// Shallow-merge `partial` into a node's configuration.
    ///
    /// Top-level keys in `partial` replace existing keys wholesale; nested
    /// objects are not merged.
    pub fn update_node_config(&mut self, node_id: &str, partial: NodeConfig) -> Result<()> {
        let node = self.graph.get_node_mut(node_id)?;
        let fields: Vec<String> = partial.keys().cloned().collect();
        node.config.extend(partial);
        log::debug!("Updated config of node {}: {:?}", node_id, fields);

        self.after_mutation(SessionEvent::ConfigUpdated {
            node_id: node_id.to_string(),
            fields,
        });
        Ok(())
    }

    /// Copy a node's kind and configuration into a new, unconnected node
    pub fn duplicate_node(&mut self, node_id: &str) -> Result<AutomationNode> {
        let original = self.graph.get_node(node_id)?;
        let copy = AutomationNode::with_config(
            fresh_id("node"),
            original.kind,
            original
                .position
                .offset(self.config.duplicate_offset)
                .finite_or_zero(),
            original.config.clone(),
        );
        log::debug!("Duplicated node {} as {}", node_id, copy.id);

        self.graph.push_node(copy.clone());
        self.after_mutation(SessionEvent::NodeAdded {
            node_id: copy.id.clone(),
            kind: copy.kind,
        });
        Ok(copy)
    }

    // =========================================================================
    // Edge operations
    // =========================================================================

    /// Connect `source` (through `source_port`) to `target`
    pub fn connect(
        &mut self,
        source: &str,
        source_port: Option<&str>,
        target: &str,
    ) -> Result<AutomationEdge> {
        let invalid = AutomationError::InvalidEdge;

        let source_node = self.graph.get_node(source).map_err(|_| {
            invalid(InvalidEdgeReason::DanglingEndpoint {
                node_id: source.to_string(),
            })
        })?;
        let target_node = self.graph.get_node(target).map_err(|_| {
            invalid(InvalidEdgeReason::DanglingEndpoint {
                node_id: target.to_string(),
            })
        })?;

        if source == target {
            return Err(invalid(InvalidEdgeReason::SelfLoop {
                node_id: source.to_string(),
            }));
        }
        if target_node.kind == NodeKind::Trigger {
            return Err(invalid(InvalidEdgeReason::TriggerTarget {
                node_id: target.to_string(),
            }));
        }
        if !source_node.kind.accepts_port(source_port) {
            return Err(invalid(InvalidEdgeReason::UnknownPort {
                port: source_port.map(str::to_string),
            }));
        }
        if self
            .graph
            .edges()
            .iter()
            .any(|e| e.same_connection(source, source_port, target))
        {
            return Err(invalid(InvalidEdgeReason::Duplicate));
        }
        if let Some(port) = source_port {
            if !self.graph.outgoing_edges(source, Some(port)).is_empty() {
                return Err(invalid(InvalidEdgeReason::PortOccupied {
                    port: port.to_string(),
                }));
            }
        }

        let edge = AutomationEdge::new(fresh_id("edge"), source, source_port, target);
        log::debug!(
            "Connecting {}:{} -> {} as {}",
            source,
            source_port.unwrap_or("out"),
            target,
            edge.id
        );

        self.graph.push_edge(edge.clone());
        self.after_mutation(SessionEvent::EdgeAdded {
            edge_id: edge.id.clone(),
        });
        Ok(edge)
    }

    /// Remove an edge. Removing an edge that does not exist is a no-op.
    pub fn disconnect(&mut self, edge_id: &str) {
        if self.graph.remove_edge(edge_id).is_none() {
            log::debug!("disconnect: edge {} already absent", edge_id);
            return;
        }
        self.after_mutation(SessionEvent::EdgeRemoved {
            edge_id: edge_id.to_string(),
        });
    }

    // =========================================================================
    // Whole-graph operations
    // =========================================================================

    /// Set a metadata entry (name, description, ...)
    pub fn set_metadata(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        self.graph.metadata_mut().insert(key.clone(), value);
        self.after_mutation(SessionEvent::MetadataUpdated { key });
    }

    /// Re-derive the validation result from the current graph
    pub fn validate(&mut self) -> &ValidationResult {
        let result = validate_graph(&self.graph, &self.registry);
        if result != self.validation {
            self.validation = result;
            self.emit(SessionEvent::ValidationUpdated {
                result: self.validation.clone(),
            });
        }
        &self.validation
    }

    /// Portable snapshot of the current graph
    pub fn export_graph(&self) -> SerializedGraph {
        self.graph.to_serialized()
    }

    /// Snapshot of the current graph as pretty JSON
    pub fn export_json(&self) -> Result<String> {
        self.export_graph().to_json_pretty()
    }

    /// Replace the whole graph.
    ///
    /// The import is all-or-nothing: if the snapshot is malformed the
    /// current graph is left untouched.
    pub fn import_graph(&mut self, serialized: SerializedGraph) -> Result<()> {
        let graph = AutomationGraph::from_serialized(serialized)
            .inspect_err(|e| log::warn!("Rejected graph import: {}", e))?;

        log::info!(
            "Imported graph with {} node(s) and {} edge(s)",
            graph.node_count(),
            graph.edge_count()
        );
        let event = SessionEvent::GraphImported {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
        };
        self.graph = graph;
        self.after_mutation(event);
        Ok(())
    }

    /// Parse and import a JSON snapshot
    pub fn import_json(&mut self, json: &str) -> Result<()> {
        let serialized = SerializedGraph::from_json(json)?;
        self.import_graph(serialized)
    }

    /// Reposition every node with the layered layout
    pub fn auto_layout(&mut self) {
        let positions = layout::compute_layout(&self.graph, &self.config.layout);
        for node in self.graph.nodes_mut() {
            if let Some(position) = positions.get(&node.id) {
                node.position = position.finite_or_zero();
            }
        }
        self.after_mutation(SessionEvent::LayoutApplied);
    }

    /// Close the session without saving
    pub fn discard(self) {
        log::debug!(
            "Discarding session with {} node(s), unsaved changes: {}",
            self.graph.node_count(),
            self.dirty
        );
        self.emit(SessionEvent::Discarded);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn after_mutation(&mut self, event: SessionEvent) {
        self.state = SessionState::Editing;
        self.dirty = true;
        self.emit(event);
        self.refresh_validation();
        self.emit(SessionEvent::ValidationUpdated {
            result: self.validation.clone(),
        });
    }

    fn refresh_validation(&mut self) {
        self.validation = validate_graph(&self.graph, &self.registry);
    }

    fn emit(&self, event: SessionEvent) {
        if let Err(e) = self.events.send(event) {
            log::warn!("Failed to deliver session event: {}", e);
        }
    }
}

impl Default for BuilderSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BuilderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuilderSession")
            .field("state", &self.state)
            .field("nodes", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .field("dirty", &self.dirty)
            .field("is_valid", &self.validation.is_valid)
            .finish()
    }
}

fn fresh_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}
