//! Structural and semantic validation of automation graphs
//!
//! Validation is a pure function of a graph snapshot. Every rule runs on
//! every pass and findings accumulate, so one pass surfaces the complete
//! list. Errors block save/test in the editor; warnings are advisory.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::contracts::{ContractRegistry, ContractReport, LoopContract};
use crate::graph::AutomationGraph;
use crate::types::{ports, AutomationEdge, NodeId, NodeKind};

/// Outcome of validating a graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True when there are no blocking errors
    pub is_valid: bool,
    /// Blocking findings
    pub errors: Vec<String>,
    /// Advisory findings
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn from_report(report: ContractReport) -> Self {
        Self {
            is_valid: report.errors.is_empty(),
            errors: report.errors,
            warnings: report.warnings,
        }
    }

    /// Whether any finding mentions the given text
    pub fn mentions(&self, needle: &str) -> bool {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .any(|m| m.contains(needle))
    }
}

/// Validate an automation graph against the given contracts
pub fn validate_graph(graph: &AutomationGraph, registry: &ContractRegistry) -> ValidationResult {
    let mut report = ContractReport::default();

    let triggers = validate_triggers(graph, &mut report);
    validate_reachability(graph, &triggers, &mut report);
    validate_node_configs(graph, registry, &mut report);
    validate_ports(graph, &mut report);
    validate_branch_completeness(graph, &mut report);
    validate_loop_termination(graph, &mut report);
    detect_unbounded_cycles(graph, &mut report);

    ValidationResult::from_report(report)
}

/// Exactly one trigger, and no edges into it
fn validate_triggers(graph: &AutomationGraph, report: &mut ContractReport) -> Vec<NodeId> {
    let triggers: Vec<NodeId> = graph
        .nodes_of_kind(NodeKind::Trigger)
        .map(|n| n.id.clone())
        .collect();

    match triggers.len() {
        0 => report.error("workflow must have a trigger"),
        1 => {}
        _ => report.error("workflow must have exactly one trigger"),
    }

    for trigger in &triggers {
        if !graph.incoming_edges(trigger).is_empty() {
            report.error(format!(
                "trigger node {} cannot have incoming connections",
                trigger
            ));
        }
    }

    triggers
}

/// Every non-trigger node should be reachable from a trigger
fn validate_reachability(graph: &AutomationGraph, triggers: &[NodeId], report: &mut ContractReport) {
    if triggers.is_empty() {
        return;
    }

    let mut reachable: HashSet<NodeId> = HashSet::new();
    for trigger in triggers {
        if let Ok(set) = graph.reachable_from(trigger) {
            reachable.extend(set);
        }
    }

    for node in graph.nodes() {
        if node.kind != NodeKind::Trigger && !reachable.contains(&node.id) {
            report.warning(format!("node {} is not connected to the trigger", node.id));
        }
    }
}

/// Per-kind required configuration
fn validate_node_configs(
    graph: &AutomationGraph,
    registry: &ContractRegistry,
    report: &mut ContractReport,
) {
    for node in graph.nodes() {
        registry.validate_node(node, report);
    }
}

/// Edges must leave through a port their source kind has, and branching
/// ports fan out to at most one target
fn validate_ports(graph: &AutomationGraph, report: &mut ContractReport) {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut reported: HashSet<(&str, &str)> = HashSet::new();

    for edge in graph.edges() {
        let Ok(source) = graph.get_node(&edge.source_node_id) else {
            continue;
        };
        let port = edge.source_port.as_deref();

        if !source.kind.accepts_port(port) {
            report.error(format!(
                "edge {} leaves {} node {} through unknown port '{}'",
                edge.id,
                source.kind,
                source.id,
                port.unwrap_or("")
            ));
            continue;
        }

        if let Some(port) = port {
            let key = (edge.source_node_id.as_str(), port);
            if !seen.insert(key) && reported.insert(key) {
                report.error(format!(
                    "{} node {} port '{}' has more than one target",
                    source.kind, source.id, port
                ));
            }
        }
    }
}

/// Conditions should route at least two of their ports
fn validate_branch_completeness(graph: &AutomationGraph, report: &mut ContractReport) {
    for node in graph.nodes_of_kind(NodeKind::Condition) {
        let connected: HashSet<&str> = graph
            .outgoing_edges(&node.id, None)
            .into_iter()
            .filter_map(|e| e.source_port.as_deref())
            .filter(|p| NodeKind::Condition.output_ports().contains(p))
            .collect();

        if connected.len() < 2 {
            report.warning(format!(
                "condition node {} has incomplete branches",
                node.id
            ));
        }
    }
}

/// Loops need a termination bound; missing ports are flagged
fn validate_loop_termination(graph: &AutomationGraph, report: &mut ContractReport) {
    for node in graph.nodes_of_kind(NodeKind::Loop) {
        if !LoopContract::has_termination_bound(&node.config) {
            report.error(format!("loop node {} has no termination bound", node.id));
        }
        if graph.outgoing_edges(&node.id, Some(ports::LOOP_EXIT)).is_empty() {
            report.warning(format!("loop node {} has no exit path", node.id));
        }
        if graph.outgoing_edges(&node.id, Some(ports::LOOP_BODY)).is_empty() {
            report.warning(format!("loop node {} has an empty body", node.id));
        }
    }
}

/// Whether an edge leaves a loop node through its `loop-body` port
fn is_loop_body_edge(graph: &AutomationGraph, edge: &AutomationEdge) -> bool {
    edge.source_port.as_deref() == Some(ports::LOOP_BODY)
        && graph
            .get_node(&edge.source_node_id)
            .is_ok_and(|n| n.kind == NodeKind::Loop)
}

/// Flag cycles that are not bounded by a loop node.
///
/// The DFS starts at the triggers and then covers the remaining nodes in
/// insertion order. A back edge closes a cycle at the node it targets; that
/// revisit is legal only when the target is a loop node and the current path
/// left it through `loop-body`.
fn detect_unbounded_cycles(graph: &AutomationGraph, report: &mut ContractReport) {
    let mut successors: HashMap<&str, Vec<(&str, bool)>> = HashMap::new();
    for edge in graph.edges() {
        successors
            .entry(edge.source_node_id.as_str())
            .or_default()
            .push((edge.target_node_id.as_str(), is_loop_body_edge(graph, edge)));
    }

    let roots = graph
        .nodes_of_kind(NodeKind::Trigger)
        .chain(graph.nodes())
        .map(|n| n.id.as_str());

    let mut walk = CycleWalk {
        successors,
        path: Vec::new(),
        on_path: HashMap::new(),
        done: HashSet::new(),
    };
    for root in roots {
        if !walk.done.contains(root) && walk.finds_unbounded_cycle(root) {
            report.error("workflow contains a cycle not bounded by a loop node");
            return;
        }
    }
}

/// DFS state for [`detect_unbounded_cycles`]
struct CycleWalk<'a> {
    /// Successors with a flag marking loop-body edges
    successors: HashMap<&'a str, Vec<(&'a str, bool)>>,
    /// Current path; the flag records whether the path left the node
    /// through a loop-body edge
    path: Vec<(&'a str, bool)>,
    /// Index into `path` of every node currently on it
    on_path: HashMap<&'a str, usize>,
    done: HashSet<&'a str>,
}

impl<'a> CycleWalk<'a> {
    fn finds_unbounded_cycle(&mut self, node_id: &'a str) -> bool {
        self.on_path.insert(node_id, self.path.len());
        self.path.push((node_id, false));

        let next_steps = self.successors.get(node_id).cloned().unwrap_or_default();
        for (next, via_loop_body) in next_steps {
            if let Some(step) = self.path.last_mut() {
                step.1 = via_loop_body;
            }

            match self.on_path.get(next) {
                Some(&index) => {
                    let (_, left_by_loop_body) = self.path[index];
                    if !left_by_loop_body {
                        return true;
                    }
                }
                None if !self.done.contains(next) => {
                    if self.finds_unbounded_cycle(next) {
                        return true;
                    }
                }
                None => {}
            }
        }

        self.path.pop();
        self.on_path.remove(node_id);
        self.done.insert(node_id);
        false
    }
}
