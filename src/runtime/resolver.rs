//! Graph resolver: linear execution ordering with cycle detection.
//!
//! Dependency edges come from two sources and are honored identically:
//! each node's `inputFrom` config field, and the workflow's `edges` list
//! (a node depends on every edge source that targets it). Ordering is a
//! depth-first visit with three-color marking; ties among independent
//! roots preserve definition order so runs are reproducible.

use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::workflow::types::{NodeSpec, Workflow};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mark {
    InProgress,
    Done,
}

/// Compute one valid execution order containing every node exactly once,
/// each placed after all nodes it depends on.
///
/// Fails with `Validation` before traversal if any `inputFrom` or edge
/// endpoint names a nonexistent node, and with `CircularDependency` when a
/// dependency cycle is found; partial ordering work is discarded on failure.
pub fn resolve_order(workflow: &Workflow) -> EngineResult<Vec<&NodeSpec>> {
    let node_map: HashMap<&str, &NodeSpec> = workflow
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), node))
        .collect();

    // Reference checks happen before any traversal.
    for node in &workflow.nodes {
        if let Some(predecessor) = node.input_from() {
            if !node_map.contains_key(predecessor) {
                return Err(EngineError::Validation(format!(
                    "node {} declares inputFrom {predecessor}, which does not exist",
                    node.id
                )));
            }
        }
    }
    for edge in &workflow.edges {
        if !node_map.contains_key(edge.source.as_str()) {
            return Err(EngineError::Validation(format!(
                "edge references unknown source node {}",
                edge.source
            )));
        }
        if !node_map.contains_key(edge.target.as_str()) {
            return Err(EngineError::Validation(format!(
                "edge references unknown target node {}",
                edge.target
            )));
        }
    }

    // Predecessors per node id: inputFrom first, then incoming edges.
    let mut predecessors: HashMap<&str, Vec<&str>> = HashMap::new();
    for node in &workflow.nodes {
        let entry = predecessors.entry(node.id.as_str()).or_default();
        if let Some(from) = node.input_from() {
            entry.push(from);
        }
    }
    for edge in &workflow.edges {
        let entry = predecessors.entry(edge.target.as_str()).or_default();
        if !entry.contains(&edge.source.as_str()) {
            entry.push(edge.source.as_str());
        }
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut ordered: Vec<&NodeSpec> = Vec::with_capacity(workflow.nodes.len());

    for node in &workflow.nodes {
        visit(
            node.id.as_str(),
            &node_map,
            &predecessors,
            &mut marks,
            &mut ordered,
        )?;
    }

    Ok(ordered)
}

fn visit<'a>(
    node_id: &'a str,
    node_map: &HashMap<&'a str, &'a NodeSpec>,
    predecessors: &HashMap<&'a str, Vec<&'a str>>,
    marks: &mut HashMap<&'a str, Mark>,
    ordered: &mut Vec<&'a NodeSpec>,
) -> EngineResult<()> {
    match marks.get(node_id) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => {
            // Re-entering an in-progress node means we walked a cycle back
            // to it, so it is guaranteed to be on the cycle.
            return Err(EngineError::CircularDependency {
                node_id: node_id.to_string(),
            });
        }
        None => {}
    }

    marks.insert(node_id, Mark::InProgress);

    if let Some(deps) = predecessors.get(node_id) {
        for dep in deps {
            visit(dep, node_map, predecessors, marks, ordered)?;
        }
    }

    ordered.push(node_map[node_id]);
    marks.insert(node_id, Mark::Done);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::Edge;
    use serde_json::json;

    fn node(id: &str, config: serde_json::Value) -> NodeSpec {
        NodeSpec {
            id: id.to_string(),
            node_type: "print".to_string(),
            config,
        }
    }

    fn workflow(nodes: Vec<NodeSpec>, edges: Vec<Edge>) -> Workflow {
        Workflow {
            id: "wf".to_string(),
            name: "test".to_string(),
            nodes,
            edges,
        }
    }

    fn edge(source: &str, target: &str) -> Edge {
        Edge {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    fn position(order: &[&NodeSpec], id: &str) -> usize {
        order.iter().position(|n| n.id == id).unwrap()
    }

    #[test]
    fn chain_orders_dependencies_first() {
        // Definition order is reversed on purpose
        let wf = workflow(
            vec![
                node("n3", json!({ "inputFrom": "n2" })),
                node("n2", json!({ "inputFrom": "n1" })),
                node("n1", json!({})),
            ],
            vec![],
        );

        let order = resolve_order(&wf).unwrap();
        assert_eq!(order.len(), 3);
        assert!(position(&order, "n1") < position(&order, "n2"));
        assert!(position(&order, "n2") < position(&order, "n3"));
    }

    #[test]
    fn every_node_appears_exactly_once() {
        let wf = workflow(
            vec![
                node("a", json!({})),
                node("b", json!({ "inputFrom": "a" })),
                node("c", json!({ "inputFrom": "a" })),
                node("d", json!({ "inputFrom": "c" })),
            ],
            vec![],
        );

        let order = resolve_order(&wf).unwrap();
        let mut ids: Vec<&str> = order.iter().map(|n| n.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn independent_roots_keep_definition_order() {
        let wf = workflow(
            vec![node("x", json!({})), node("y", json!({})), node("z", json!({}))],
            vec![],
        );

        let order = resolve_order(&wf).unwrap();
        let ids: Vec<&str> = order.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn edges_are_an_equal_dependency_source() {
        // No inputFrom anywhere; only the edges list declares the chain
        let wf = workflow(
            vec![node("sink", json!({})), node("source", json!({}))],
            vec![edge("source", "sink")],
        );

        let order = resolve_order(&wf).unwrap();
        assert!(position(&order, "source") < position(&order, "sink"));
    }

    #[test]
    fn two_node_cycle_is_detected() {
        let wf = workflow(
            vec![
                node("n1", json!({ "inputFrom": "n2" })),
                node("n2", json!({ "inputFrom": "n1" })),
            ],
            vec![],
        );

        match resolve_order(&wf) {
            Err(EngineError::CircularDependency { node_id }) => {
                assert!(node_id == "n1" || node_id == "n2");
            }
            other => panic!("expected circular dependency, got {other:?}"),
        }
    }

    #[test]
    fn named_cycle_node_is_actually_on_the_cycle() {
        // "entry" feeds into a 3-node cycle; it must not be the one blamed
        let wf = workflow(
            vec![
                node("entry", json!({})),
                node("a", json!({ "inputFrom": "c" })),
                node("b", json!({ "inputFrom": "a" })),
                node("c", json!({ "inputFrom": "b" })),
            ],
            vec![edge("entry", "a")],
        );

        match resolve_order(&wf) {
            Err(EngineError::CircularDependency { node_id }) => {
                assert!(["a", "b", "c"].contains(&node_id.as_str()), "{node_id}");
            }
            other => panic!("expected circular dependency, got {other:?}"),
        }
    }

    #[test]
    fn dangling_input_from_is_a_validation_error() {
        let wf = workflow(vec![node("n1", json!({ "inputFrom": "ghost" }))], vec![]);
        assert!(matches!(
            resolve_order(&wf),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn dangling_edge_endpoint_is_a_validation_error() {
        let wf = workflow(vec![node("n1", json!({}))], vec![edge("n1", "ghost")]);
        assert!(matches!(
            resolve_order(&wf),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let wf = workflow(vec![node("n1", json!({ "inputFrom": "n1" }))], vec![]);
        assert!(matches!(
            resolve_order(&wf),
            Err(EngineError::CircularDependency { node_id }) if node_id == "n1"
        ));
    }
}
