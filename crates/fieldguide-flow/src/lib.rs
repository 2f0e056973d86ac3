//! # Fieldguide Flow
//!
//! Graph primitives for diagnosis flows: directed graphs of question and
//! solution nodes that guide a reader from a symptom to a knowledge-base
//! article. This crate provides the graph model, structural validation,
//! the JSON codec for persisted graphs, and traversal option resolution.
//!
//! ## Features
//!
//! * Typed node/edge model matching the client wire shape
//! * Ordered structural validation with first-violation-wins semantics
//! * Iterative cycle detection that covers unreachable components
//! * Codec boundary for the serialized node/edge storage columns
//!
//! ## Example
//!
//! ```
//! use fieldguide_flow::{FlowEdge, FlowGraph, FlowNode, FlowValidator, NodeKind};
//!
//! let graph = FlowGraph::new(
//!     "q1",
//!     vec![
//!         FlowNode {
//!             id: "q1".to_string(),
//!             kind: NodeKind::Question,
//!             content: "Does the device power on?".to_string(),
//!             qa_page_id: None,
//!         },
//!         FlowNode {
//!             id: "s1".to_string(),
//!             kind: NodeKind::Solution,
//!             content: "Check the power cable.".to_string(),
//!             qa_page_id: Some("article-42".to_string()),
//!         },
//!     ],
//!     vec![FlowEdge {
//!         from: "q1".to_string(),
//!         to: "s1".to_string(),
//!         label: "No".to_string(),
//!     }],
//! );
//!
//! assert!(FlowValidator::validate(&graph).is_ok());
//!
//! let options = graph.options_from("q1");
//! assert_eq!(options[0].next_node_id, "s1");
//! ```

mod error;
mod graph;
mod validation;

pub mod codec;

pub use error::FlowError;
pub use graph::{FlowEdge, FlowGraph, FlowNode, NodeKind, TraversalOption};
pub use validation::FlowValidator;

/// Decode the persisted columns of a flow record into a graph.
///
/// # Errors
///
/// Returns [`FlowError::MalformedPayload`] when either column fails to
/// deserialize. No validation is performed; stored graphs were validated
/// when written.
pub fn decode_graph(
    start_node_id: &str,
    nodes_text: &str,
    edges_text: &str,
) -> Result<FlowGraph, FlowError> {
    let nodes = codec::decode_nodes(nodes_text)?;
    let edges = codec::decode_edges(edges_text)?;
    Ok(FlowGraph::new(start_node_id, nodes, edges))
}
