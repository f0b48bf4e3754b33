//! Layered auto-layout
//!
//! Triggers sit on layer 0 and every other node lands one layer below its
//! deepest predecessor. Edges that close a cycle (a loop body returning to
//! its loop node) and edges into a trigger are ignored for layering. Nodes
//! that share a layer keep their insertion order and are spread evenly
//! around the layer's centre line.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::{LayoutConfig, LayoutDirection};
use crate::graph::AutomationGraph;
use crate::types::{NodeId, NodeKind, Position};

/// Compute a layer index for every node
pub fn assign_layers(graph: &AutomationGraph) -> HashMap<NodeId, usize> {
    let index: HashMap<&str, usize> = graph
        .nodes()
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let ignored = ignored_edges(graph, &index);

    let count = graph.node_count();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut in_degree = vec![0usize; count];
    for (edge_index, edge) in graph.edges().iter().enumerate() {
        if ignored.contains(&edge_index) {
            continue;
        }
        let (Some(&from), Some(&to)) = (
            index.get(edge.source_node_id.as_str()),
            index.get(edge.target_node_id.as_str()),
        ) else {
            continue;
        };
        successors[from].push(to);
        in_degree[to] += 1;
    }

    // Kahn's algorithm in insertion order keeps the result deterministic
    let mut layers = vec![0usize; count];
    let mut queue: VecDeque<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
    while let Some(current) = queue.pop_front() {
        for &next in &successors[current] {
            layers[next] = layers[next].max(layers[current] + 1);
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    graph
        .nodes()
        .iter()
        .zip(layers)
        .map(|(node, layer)| (node.id.clone(), layer))
        .collect()
}

/// Compute positions for every node
pub fn compute_layout(graph: &AutomationGraph, config: &LayoutConfig) -> HashMap<NodeId, Position> {
    let layers = assign_layers(graph);

    let depth = layers.values().copied().max().map_or(0, |d| d + 1);
    let mut rows: Vec<Vec<&str>> = vec![Vec::new(); depth];
    for node in graph.nodes() {
        if let Some(&layer) = layers.get(&node.id) {
            rows[layer].push(node.id.as_str());
        }
    }

    let mut positions = HashMap::with_capacity(graph.node_count());
    for (layer, row) in rows.iter().enumerate() {
        let centre = (row.len() as f64 - 1.0) / 2.0;
        for (slot, node_id) in row.iter().enumerate() {
            let along = layer as f64 * config.layer_spacing;
            let across = (slot as f64 - centre) * config.node_spacing;
            let position = match config.direction {
                LayoutDirection::TopDown => {
                    Position::new(config.origin.x + across, config.origin.y + along)
                }
                LayoutDirection::LeftRight => {
                    Position::new(config.origin.x + along, config.origin.y + across)
                }
            };
            positions.insert((*node_id).to_string(), position);
        }
    }

    positions
}

/// Indices of edges left out of layering: back edges found by a DFS that
/// starts from the triggers, and any edge pointing at a trigger.
fn ignored_edges(graph: &AutomationGraph, index: &HashMap<&str, usize>) -> HashSet<usize> {
    let mut ignored = HashSet::new();
    let mut outgoing: Vec<Vec<(usize, usize)>> = vec![Vec::new(); graph.node_count()];

    for (edge_index, edge) in graph.edges().iter().enumerate() {
        let (Some(&from), Some(&to)) = (
            index.get(edge.source_node_id.as_str()),
            index.get(edge.target_node_id.as_str()),
        ) else {
            continue;
        };
        if graph.nodes()[to].kind == NodeKind::Trigger {
            ignored.insert(edge_index);
            continue;
        }
        outgoing[from].push((edge_index, to));
    }

    let roots = graph
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, n)| n.kind == NodeKind::Trigger)
        .map(|(i, _)| i)
        .chain(0..graph.node_count());

    let mut on_stack = vec![false; graph.node_count()];
    let mut done = vec![false; graph.node_count()];
    for root in roots {
        if !done[root] {
            collect_back_edges(root, &outgoing, &mut on_stack, &mut done, &mut ignored);
        }
    }

    ignored
}

fn collect_back_edges(
    node: usize,
    outgoing: &[Vec<(usize, usize)>],
    on_stack: &mut [bool],
    done: &mut [bool],
    back_edges: &mut HashSet<usize>,
) {
    on_stack[node] = true;
    for &(edge_index, next) in &outgoing[node] {
        if on_stack[next] {
            back_edges.insert(edge_index);
        } else if !done[next] {
            collect_back_edges(next, outgoing, on_stack, done, back_edges);
        }
    }
    on_stack[node] = false;
    done[node] = true;
}
