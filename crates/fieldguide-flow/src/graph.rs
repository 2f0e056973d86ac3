use serde::{Deserialize, Serialize};

/// The two node roles in a diagnosis graph.
///
/// Question nodes present a prompt with outgoing options; solution nodes
/// terminate a path and may link to a knowledge-base article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Question,
    Solution,
}

/// A single node in a diagnosis graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub content: String,
    /// Knowledge-base article linked from a solution node, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qa_page_id: Option<String>,
}

impl FlowNode {
    pub fn is_solution(&self) -> bool {
        self.kind == NodeKind::Solution
    }
}

/// A labelled directed edge between two nodes of the same graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub from: String,
    pub to: String,
    pub label: String,
}

/// One selectable answer offered while traversing a graph.
///
/// Options are derived from the outgoing edges of the current node and
/// preserve edge order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalOption {
    pub label: String,
    pub next_node_id: String,
}

/// A complete diagnosis graph: the unit that validation and traversal
/// operate on.
///
/// `FlowGraph` carries only the structural fields. Titles, descriptions and
/// timestamps belong to the surrounding record type, not to the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowGraph {
    pub start_node_id: String,
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

impl FlowGraph {
    /// Assemble a graph from its parts. No validation happens here; call
    /// [`crate::validation::FlowValidator::validate`] before persisting.
    pub fn new(start_node_id: impl Into<String>, nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) -> Self {
        FlowGraph {
            start_node_id: start_node_id.into(),
            nodes,
            edges,
        }
    }

    /// Look up a node by id.
    pub fn node(&self, node_id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|node| node.id == node_id)
    }

    /// Collect the outgoing options of `node_id`, preserving edge order.
    ///
    /// Solution nodes can have outgoing edges; their options are reported
    /// like any other node's. Callers decide whether to present them.
    pub fn options_from(&self, node_id: &str) -> Vec<TraversalOption> {
        self.edges
            .iter()
            .filter(|edge| edge.from == node_id)
            .map(|edge| TraversalOption {
                label: edge.label.clone(),
                next_node_id: edge.to.clone(),
            })
            .collect()
    }
}
