use thiserror::Error;

/// All possible errors that can occur while building or loading a diagnosis graph.
///
/// The display strings are part of the API contract; clients match on them.
/// Code should match on the variants instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// A node id appears more than once in the graph
    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(String),

    /// An edge endpoint references a node id that is not part of the graph
    #[error("Edge references missing node: {from} -> {to}")]
    DanglingEdge { from: String, to: String },

    /// The start node id is not part of the graph
    #[error("Start node does not exist")]
    MissingStartNode,

    /// The graph has no solution node to terminate at
    #[error("Flow must have at least one solution node")]
    NoSolutionNode,

    /// The graph contains a directed cycle
    #[error("Circular reference detected")]
    CircularReference,

    /// A persisted nodes/edges payload failed to (de)serialize
    #[error("Malformed flow payload: {0}")]
    MalformedPayload(String),
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::MalformedPayload(err.to_string())
    }
}

impl FlowError {
    /// Get the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            FlowError::DuplicateNodeId(_) => "ERR_FLOW_DUPLICATE_NODE",
            FlowError::DanglingEdge { .. } => "ERR_FLOW_DANGLING_EDGE",
            FlowError::MissingStartNode => "ERR_FLOW_MISSING_START",
            FlowError::NoSolutionNode => "ERR_FLOW_NO_SOLUTION",
            FlowError::CircularReference => "ERR_FLOW_CIRCULAR",
            FlowError::MalformedPayload(_) => "ERR_FLOW_MALFORMED_PAYLOAD",
        }
    }
}
