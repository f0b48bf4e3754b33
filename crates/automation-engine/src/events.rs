//! Change notifications emitted by a builder session
//!
//! Every mutating session operation emits one event describing the change,
//! followed by a `ValidationUpdated` event carrying the fresh result. A
//! caller can record the change events to drive an undo log or to re-render.

use serde::{Deserialize, Serialize};

use crate::types::{EdgeId, NodeId, NodeKind};
use crate::validation::ValidationResult;

/// Receiver for session events.
///
/// A sink might forward to a UI channel, an undo recorder or a test buffer.
/// Delivery failures are logged by the session and never abort the edit.
pub trait EventSink: Send + Sync {
    fn send(&self, event: SessionEvent) -> Result<(), EventError>;
}

/// A sink could not accept an event
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("event delivery failed: {message}")]
pub struct EventError {
    pub message: String,
}

impl EventError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Events emitted by a builder session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    /// A node was added (directly or by duplication)
    #[serde(rename_all = "camelCase")]
    NodeAdded { node_id: NodeId, kind: NodeKind },

    /// A node and its edges were removed
    #[serde(rename_all = "camelCase")]
    NodeRemoved {
        node_id: NodeId,
        removed_edges: Vec<EdgeId>,
    },

    /// A node was moved on the canvas
    #[serde(rename_all = "camelCase")]
    NodeMoved { node_id: NodeId },

    /// A node's configuration changed
    #[serde(rename_all = "camelCase")]
    ConfigUpdated {
        node_id: NodeId,
        fields: Vec<String>,
    },

    /// An edge was created
    #[serde(rename_all = "camelCase")]
    EdgeAdded { edge_id: EdgeId },

    /// An edge was removed
    #[serde(rename_all = "camelCase")]
    EdgeRemoved { edge_id: EdgeId },

    /// A metadata entry was set
    MetadataUpdated { key: String },

    /// The graph was replaced by an import
    #[serde(rename_all = "camelCase")]
    GraphImported { node_count: usize, edge_count: usize },

    /// Auto-layout repositioned the nodes
    LayoutApplied,

    /// Validation was recomputed
    ValidationUpdated { result: ValidationResult },

    /// The session was closed without saving
    Discarded,
}

impl SessionEvent {
    /// Whether this event reflects a change to the graph itself
    pub fn is_graph_change(&self) -> bool {
        !matches!(
            self,
            SessionEvent::ValidationUpdated { .. } | SessionEvent::Discarded
        )
    }
}

/// A no-op event sink that discards all events
///
/// Useful for testing or when events aren't needed.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: SessionEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: std::sync::Mutex<Vec<SessionEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: SessionEvent) -> Result<(), EventError> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| EventError::new("event buffer poisoned"))?;
        events.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_event_sink() {
        let sink = VecEventSink::new();

        sink.send(SessionEvent::EdgeAdded {
            edge_id: "e1".to_string(),
        })
        .unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);

        match &events[0] {
            SessionEvent::EdgeAdded { edge_id } => assert_eq!(edge_id, "e1"),
            _ => panic!("Expected EdgeAdded event"),
        }

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_null_event_sink() {
        let sink = NullEventSink;
        // Should not panic
        sink.send(SessionEvent::LayoutApplied).unwrap();
    }

    #[test]
    fn test_event_error_display() {
        let err = EventError::new("receiver dropped");
        assert_eq!(err.to_string(), "event delivery failed: receiver dropped");
    }

    #[test]
    fn test_event_serialization() {
        let event = SessionEvent::NodeRemoved {
            node_id: "n1".to_string(),
            removed_edges: vec!["e1".to_string()],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "nodeRemoved", "nodeId": "n1", "removedEdges": ["e1"]})
        );
        assert!(event.is_graph_change());
        assert!(!SessionEvent::Discarded.is_graph_change());
    }
}
