//! Undo/redo history for builder sessions
//!
//! The history is caller-side: push `BuilderSession::export_graph()` after
//! each edit and feed whatever `undo`/`redo` return back into
//! `BuilderSession::import_graph()`. Each entry is the graph's JSON
//! compressed with zstd.

use std::collections::VecDeque;

use crate::error::{AutomationError, Result};
use crate::graph::SerializedGraph;

const COMPRESSION_LEVEL: i32 = 3;

/// One compressed graph state
struct Snapshot(Vec<u8>);

impl Snapshot {
    fn encode(graph: &SerializedGraph) -> Result<Self> {
        let json = serde_json::to_vec(graph)?;
        zstd::encode_all(&json[..], COMPRESSION_LEVEL)
            .map(Snapshot)
            .map_err(|e| AutomationError::Compression(e.to_string()))
    }

    fn decode(&self) -> Result<SerializedGraph> {
        let json = zstd::decode_all(&self.0[..])
            .map_err(|e| AutomationError::Compression(e.to_string()))?;
        Ok(serde_json::from_slice(&json)?)
    }
}

/// Bounded undo/redo history of graph states
pub struct UndoStack {
    /// Older states, oldest first
    past: VecDeque<Snapshot>,
    /// State matching the live graph
    present: Option<Snapshot>,
    /// States undone since the last push, most recently undone last
    future: Vec<Snapshot>,
    capacity: usize,
}

impl UndoStack {
    /// History holding at most `capacity` states in total (at least one)
    pub fn new(capacity: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present: None,
            future: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record the graph after an edit. Anything that could be redone is lost.
    pub fn push(&mut self, graph: &SerializedGraph) -> Result<()> {
        let snapshot = Snapshot::encode(graph)?;

        self.future.clear();
        if let Some(previous) = self.present.replace(snapshot) {
            self.past.push_back(previous);
        }
        while self.past.len() + 1 > self.capacity {
            self.past.pop_front();
        }

        log::debug!(
            "Recorded graph state ({} in history, {} bytes)",
            self.len(),
            self.compressed_size()
        );
        Ok(())
    }

    /// The state before the present one, or `None` when there is none
    pub fn undo(&mut self) -> Option<Result<SerializedGraph>> {
        let previous = self.past.pop_back()?;
        if let Some(present) = self.present.replace(previous) {
            self.future.push(present);
        }
        self.current()
    }

    /// The state most recently undone, or `None` after a push
    pub fn redo(&mut self) -> Option<Result<SerializedGraph>> {
        let next = self.future.pop()?;
        if let Some(present) = self.present.replace(next) {
            self.past.push_back(present);
        }
        self.current()
    }

    /// Decode the present state
    pub fn current(&self) -> Option<Result<SerializedGraph>> {
        self.present.as_ref().map(Snapshot::decode)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of states held, present included
    pub fn len(&self) -> usize {
        self.past.len() + usize::from(self.present.is_some()) + self.future.len()
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_none()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.present = None;
        self.future.clear();
    }

    /// Bytes held by all compressed states
    pub fn compressed_size(&self) -> usize {
        self.past
            .iter()
            .chain(self.present.iter())
            .chain(self.future.iter())
            .map(|s| s.0.len())
            .sum()
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(100)
    }
}

impl std::fmt::Debug for UndoStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoStack")
            .field("past", &self.past.len())
            .field("future", &self.future.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
