use std::collections::{HashMap, HashSet};

use crate::error::FlowError;
use crate::graph::FlowGraph;

/// Validates the structural invariants of a diagnosis graph.
///
/// Checks run in a fixed order and the first violation wins:
/// unique node ids, edge endpoints, start node, solution presence,
/// acyclicity. A graph that passes is safe to persist and traverse.
pub struct FlowValidator;

impl FlowValidator {
    /// Validate a complete graph, returning the first violated invariant.
    pub fn validate(graph: &FlowGraph) -> Result<(), FlowError> {
        Self::check_unique_node_ids(graph)?;
        Self::check_edge_endpoints(graph)?;
        Self::check_start_node(graph)?;
        Self::check_solution_presence(graph)?;
        Self::check_acyclic(graph)?;
        Ok(())
    }

    /// Every node id must be unique within the graph.
    ///
    /// Duplicate ids would make edge endpoints and traversal ambiguous.
    fn check_unique_node_ids(graph: &FlowGraph) -> Result<(), FlowError> {
        let mut seen = HashSet::with_capacity(graph.nodes.len());
        for node in &graph.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(FlowError::DuplicateNodeId(node.id.clone()));
            }
        }
        Ok(())
    }

    /// Both endpoints of every edge must reference nodes in the graph.
    fn check_edge_endpoints(graph: &FlowGraph) -> Result<(), FlowError> {
        let node_ids: HashSet<&str> = graph.nodes.iter().map(|node| node.id.as_str()).collect();
        for edge in &graph.edges {
            if !node_ids.contains(edge.from.as_str()) || !node_ids.contains(edge.to.as_str()) {
                return Err(FlowError::DanglingEdge {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                });
            }
        }
        Ok(())
    }

    /// The start node id must reference a node in the graph.
    fn check_start_node(graph: &FlowGraph) -> Result<(), FlowError> {
        if graph.node(&graph.start_node_id).is_none() {
            return Err(FlowError::MissingStartNode);
        }
        Ok(())
    }

    /// At least one node must be a solution, otherwise no path can resolve.
    fn check_solution_presence(graph: &FlowGraph) -> Result<(), FlowError> {
        if !graph.nodes.iter().any(|node| node.is_solution()) {
            return Err(FlowError::NoSolutionNode);
        }
        Ok(())
    }

    /// The directed graph must be acyclic.
    ///
    /// Runs a depth-first search from every node, not just those reachable
    /// from the start node: a later update can re-point the start node into
    /// a previously unreachable component. The search keeps an explicit
    /// frame stack with a neighbor cursor per frame, a `visited` set of
    /// fully explored nodes, and an `on_stack` set of nodes on the current
    /// path. An edge into an `on_stack` node is a back edge and therefore a
    /// cycle; an edge into a `visited` node is a cross edge and is not.
    /// Runs in O(nodes + edges).
    fn check_acyclic(graph: &FlowGraph) -> Result<(), FlowError> {
        // Adjacency list keyed by node id, neighbors in edge order
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::with_capacity(graph.nodes.len());
        for edge in &graph.edges {
            adjacency
                .entry(edge.from.as_str())
                .or_default()
                .push(edge.to.as_str());
        }

        let mut visited: HashSet<&str> = HashSet::with_capacity(graph.nodes.len());
        let mut on_stack: HashSet<&str> = HashSet::with_capacity(graph.nodes.len());

        for start in graph.nodes.iter().map(|node| node.id.as_str()) {
            if visited.contains(start) {
                continue;
            }

            // Each frame is (node, index of the next neighbor to explore)
            let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
            on_stack.insert(start);

            while let Some((node, cursor)) = stack.pop() {
                let neighbors = adjacency.get(node).map(Vec::as_slice).unwrap_or(&[]);
                if cursor < neighbors.len() {
                    // Resume this frame at the next neighbor afterwards
                    stack.push((node, cursor + 1));

                    let next = neighbors[cursor];
                    if on_stack.contains(next) {
                        return Err(FlowError::CircularReference);
                    }
                    if !visited.contains(next) {
                        on_stack.insert(next);
                        stack.push((next, 0));
                    }
                } else {
                    // All neighbors explored, retire the node
                    on_stack.remove(node);
                    visited.insert(node);
                }
            }
        }

        Ok(())
    }
}
