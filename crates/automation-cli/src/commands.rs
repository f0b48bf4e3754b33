//! Subcommand implementations
//!
//! Each command writes its report to `out` so it can be exercised without a
//! terminal.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use automation_engine::{BuilderSession, NodeKind, SerializedGraph, SessionConfig};

/// Read a workflow file into a fresh session
pub fn open(path: &Path, config: SessionConfig) -> anyhow::Result<BuilderSession> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let graph = SerializedGraph::from_json(&json)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let session = BuilderSession::from_serialized(graph, config)
        .with_context(|| format!("Failed to import {}", path.display()))?;
    log::info!(
        "Loaded {} ({} nodes, {} edges)",
        path.display(),
        session.graph().node_count(),
        session.graph().edge_count()
    );
    Ok(session)
}

/// Print the validation report. Returns whether the workflow is valid.
pub fn validate(session: &mut BuilderSession, out: &mut impl Write) -> anyhow::Result<bool> {
    let result = session.validate();
    for error in &result.errors {
        writeln!(out, "error: {}", error)?;
    }
    for warning in &result.warnings {
        writeln!(out, "warning: {}", warning)?;
    }
    writeln!(
        out,
        "{} ({} errors, {} warnings)",
        if result.is_valid { "valid" } else { "invalid" },
        result.errors.len(),
        result.warnings.len()
    )?;
    Ok(result.is_valid)
}

/// Apply auto-layout and write the graph to `output`, or to `out` when unset
pub fn layout(
    session: &mut BuilderSession,
    output: Option<&Path>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    session.auto_layout();
    let json = session.export_json()?;

    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote laid-out workflow to {}", path.display());
        }
        None => writeln!(out, "{}", json)?,
    }
    Ok(())
}

/// Print the workflow name and node/edge counts per kind
pub fn inspect(session: &mut BuilderSession, out: &mut impl Write) -> anyhow::Result<()> {
    let graph = session.graph();
    if let Some(name) = graph.metadata().get("name").and_then(|v| v.as_str()) {
        writeln!(out, "name: {}", name)?;
    }
    writeln!(out, "nodes: {}", graph.node_count())?;
    for kind in NodeKind::ALL {
        let count = graph.nodes_of_kind(kind).count();
        if count > 0 {
            writeln!(out, "  {}: {}", kind, count)?;
        }
    }
    writeln!(out, "edges: {}", graph.edge_count())?;

    let result = session.validate();
    writeln!(
        out,
        "status: {}",
        if result.is_valid { "valid" } else { "invalid" }
    )?;
    Ok(())
}
