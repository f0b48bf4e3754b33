//! Workflow storage with file persistence.
//!
//! Each workflow is one pretty-printed JSON file named `<id>.json` holding a
//! [`SerializedGraph`]. The store only writes graphs that pass validation;
//! drafts stay in the session until they are fixed.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::contracts::ContractRegistry;
use crate::error::{AutomationError, Result};
use crate::graph::{AutomationGraph, SerializedGraph};
use crate::session::BuilderSession;
use crate::validation::validate_graph;

/// Listing entry for a stored workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    pub id: String,
    /// `metadata.name`, falling back to the id
    pub name: String,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Directory of saved workflows
#[derive(Debug, Clone)]
pub struct WorkflowStore {
    root: PathBuf,
}

impl WorkflowStore {
    /// Create a store rooted at `path`.
    ///
    /// The directory is created on first save.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            root: path.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save the session's graph under `id` and mark the session saved.
    ///
    /// Fails with [`AutomationError::InvalidWorkflow`] when the latest
    /// validation result has errors.
    pub fn save_session(&self, id: &str, session: &mut BuilderSession) -> Result<PathBuf> {
        let result = session.validate();
        if !result.is_valid {
            return Err(AutomationError::InvalidWorkflow {
                errors: result.errors.clone(),
            });
        }
        let path = self.write(id, &session.export_graph())?;
        session.mark_saved();
        Ok(path)
    }

    /// Validate and save a serialized graph under `id`
    pub fn save(
        &self,
        id: &str,
        graph: &SerializedGraph,
        registry: &ContractRegistry,
    ) -> Result<PathBuf> {
        let hydrated = AutomationGraph::from_serialized(graph.clone())?;
        let result = validate_graph(&hydrated, registry);
        if !result.is_valid {
            return Err(AutomationError::InvalidWorkflow {
                errors: result.errors,
            });
        }
        self.write(id, graph)
    }

    /// Load the workflow stored under `id`
    pub fn load(&self, id: &str) -> Result<SerializedGraph> {
        let path = self.path_for(id)?;
        let content = std::fs::read_to_string(&path)?;
        let graph = SerializedGraph::from_json(&content)?;
        log::info!("Loaded workflow '{}' from {:?}", id, path);
        Ok(graph)
    }

    /// Load the workflow stored under `id` into a fresh session
    pub fn open(&self, id: &str, config: SessionConfig) -> Result<BuilderSession> {
        BuilderSession::from_serialized(self.load(id)?, config)
    }

    /// Summaries of every readable workflow, sorted by id.
    ///
    /// Files that fail to parse are skipped with a warning.
    pub fn list(&self) -> Result<Vec<WorkflowSummary>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let file_path = entry?.path();
            if file_path.extension().map_or(true, |e| e != "json") {
                continue;
            }
            let Some(id) = file_path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = std::fs::read_to_string(&file_path)?;
            match SerializedGraph::from_json(&content) {
                Ok(graph) => summaries.push(WorkflowSummary {
                    id: id.to_string(),
                    name: graph
                        .metadata
                        .get("name")
                        .and_then(|v| v.as_str())
                        .unwrap_or(id)
                        .to_string(),
                    node_count: graph.nodes.len(),
                    edge_count: graph.edges.len(),
                }),
                Err(e) => {
                    log::warn!("Failed to parse workflow from {:?}: {}", file_path, e);
                }
            }
        }

        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }

    /// Delete a stored workflow. Returns whether a file was removed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path)?;
        log::debug!("Deleted workflow '{}' from {:?}", id, path);
        Ok(true)
    }

    fn write(&self, id: &str, graph: &SerializedGraph) -> Result<PathBuf> {
        let path = self.path_for(id)?;
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(&path, graph.to_json_pretty()?)?;
        log::info!("Saved workflow '{}' to {:?}", id, path);
        Ok(path)
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        let acceptable = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !acceptable {
            return Err(AutomationError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid workflow id '{}'", id),
            )));
        }
        Ok(self.root.join(format!("{}.json", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::types::NodeKind;
    use serde_json::json;

    fn valid_graph() -> SerializedGraph {
        GraphBuilder::new()
            .trigger("t", "manual")
            .action("a", "add_tag")
            .with_config(json!({"tag": "contacted"}))
            .edge("t", None, "a")
            .with_metadata("name", json!("Tag new leads"))
            .build()
    }

    #[test]
    fn test_save_load_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkflowStore::new(dir.path().join("workflows"));
        let registry = ContractRegistry::with_builtin();

        assert!(store.list().unwrap().is_empty());

        let graph = valid_graph();
        store.save("tag-new-leads", &graph, &registry).unwrap();
        assert_eq!(store.load("tag-new-leads").unwrap(), graph);

        let summaries = store.list().unwrap();
        assert_eq!(
            summaries,
            vec![WorkflowSummary {
                id: "tag-new-leads".to_string(),
                name: "Tag new leads".to_string(),
                node_count: 2,
                edge_count: 1,
            }]
        );

        assert!(store.delete("tag-new-leads").unwrap());
        assert!(!store.delete("tag-new-leads").unwrap());
        assert!(store.load("tag-new-leads").is_err());
    }

    #[test]
    fn test_invalid_graph_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkflowStore::new(dir.path());
        let registry = ContractRegistry::with_builtin();

        let graph = GraphBuilder::new().action("a", "wait").build();
        match store.save("draft", &graph, &registry) {
            Err(AutomationError::InvalidWorkflow { errors }) => {
                assert_eq!(errors, vec!["workflow must have a trigger"]);
            }
            other => panic!("expected InvalidWorkflow, got {:?}", other),
        }
        assert!(!dir.path().join("draft.json").exists());
    }

    #[test]
    fn test_save_session_marks_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkflowStore::new(dir.path());

        let mut session = BuilderSession::new();
        let action = session.add_node(NodeKind::Action, (0.0, 0.0), Some("wait"));
        assert!(store.save_session("draft", &mut session).is_err());
        assert!(session.has_unsaved_changes());

        let trigger = session.add_node(NodeKind::Trigger, (0.0, 0.0), Some("manual"));
        session.connect(&trigger.id, None, &action.id).unwrap();
        store.save_session("draft", &mut session).unwrap();
        assert!(!session.has_unsaved_changes());

        let reopened = store.open("draft", SessionConfig::default()).unwrap();
        assert_eq!(reopened.export_graph(), session.export_graph());
    }

    #[test]
    fn test_unparsable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkflowStore::new(dir.path());
        store
            .save("good", &valid_graph(), &ContractRegistry::with_builtin())
            .unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let ids: Vec<_> = store.list().unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["good"]);
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = WorkflowStore::new(dir.path());
        assert!(matches!(
            store.load("../escape"),
            Err(AutomationError::Io(_))
        ));
        assert!(store.delete("").is_err());
    }
}
