//! Automation Engine - graph model and builder for CRM workflow automations
//!
//! This crate lets an editor assemble a lead-nurturing workflow out of
//! triggers, actions, conditions, delays and loops, and tells it at every
//! step whether the result could be executed. It provides:
//!
//! - A serializable directed graph of typed nodes and port-keyed edges
//! - Per-kind configuration contracts with defaults and field checks
//! - A validation engine that accumulates every error and warning
//! - A builder session that mutates the graph and re-validates
//! - Deterministic layered auto-layout
//! - Compressed snapshot-based undo/redo and a file-backed workflow store
//!
//! Execution of workflows is out of scope; the engine only models them.
//!
//! # Example
//!
//! ```ignore
//! use automation_engine::{BuilderSession, NodeKind};
//!
//! let mut session = BuilderSession::new();
//! let trigger = session.add_node(NodeKind::Trigger, (0.0, 0.0), Some("lead_created"));
//! let tag = session.add_node(NodeKind::Action, (0.0, 100.0), Some("add_tag"));
//! session.connect(&trigger.id, None, &tag.id)?;
//! assert!(!session.validate().is_valid); // the tag is still empty
//! ```

pub mod builder;
pub mod config;
pub mod contracts;
pub mod error;
pub mod events;
pub mod graph;
pub mod layout;
pub mod session;
pub mod store;
pub mod types;
pub mod undo;
pub mod validation;

// Re-export key types
pub use builder::GraphBuilder;
pub use config::{LayoutConfig, LayoutDirection, SessionConfig};
pub use contracts::{ContractRegistry, ContractReport, NodeContract};
pub use error::{AutomationError, InvalidEdgeReason, Result};
pub use events::{EventError, EventSink, NullEventSink, SessionEvent, VecEventSink};
pub use graph::{AutomationGraph, SerializedGraph};
pub use session::{BuilderSession, SessionState};
pub use store::{WorkflowStore, WorkflowSummary};
pub use types::{ports, AutomationEdge, AutomationNode, EdgeId, NodeConfig, NodeId, NodeKind, Position};
pub use undo::UndoStack;
pub use validation::{validate_graph, ValidationResult};
