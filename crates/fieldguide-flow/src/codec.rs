//! (De)serialization boundary for the persisted graph columns.
//!
//! Flow records store their nodes and edges as opaque JSON text. All
//! encoding and decoding of that text goes through this module so the
//! storage layer never needs to know the payload shape.

use crate::error::FlowError;
use crate::graph::{FlowEdge, FlowNode};

/// Serialize nodes into the text stored on a flow record.
pub fn encode_nodes(nodes: &[FlowNode]) -> Result<String, FlowError> {
    Ok(serde_json::to_string(nodes)?)
}

/// Deserialize the stored node text of a flow record.
///
/// Malformed text is an error, not an empty graph. A record that fails to
/// decode was corrupted outside the API and must surface loudly.
pub fn decode_nodes(text: &str) -> Result<Vec<FlowNode>, FlowError> {
    Ok(serde_json::from_str(text)?)
}

/// Serialize edges into the text stored on a flow record.
pub fn encode_edges(edges: &[FlowEdge]) -> Result<String, FlowError> {
    Ok(serde_json::to_string(edges)?)
}

/// Deserialize the stored edge text of a flow record.
pub fn decode_edges(text: &str) -> Result<Vec<FlowEdge>, FlowError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;

    #[test]
    fn test_round_trip_preserves_order_and_fields() {
        let nodes = vec![
            FlowNode {
                id: "q1".to_string(),
                kind: NodeKind::Question,
                content: "Does it power on?".to_string(),
                qa_page_id: None,
            },
            FlowNode {
                id: "s1".to_string(),
                kind: NodeKind::Solution,
                content: "Replace the power supply".to_string(),
                qa_page_id: Some("article-1".to_string()),
            },
        ];

        let text = encode_nodes(&nodes).unwrap();
        assert_eq!(decode_nodes(&text).unwrap(), nodes);

        let edges = vec![FlowEdge {
            from: "q1".to_string(),
            to: "s1".to_string(),
            label: "No".to_string(),
        }];

        let text = encode_edges(&edges).unwrap();
        assert_eq!(decode_edges(&text).unwrap(), edges);
    }

    #[test]
    fn test_malformed_text_is_an_error() {
        let err = decode_nodes("{not json").unwrap_err();
        assert!(matches!(err, FlowError::MalformedPayload(_)));
        assert_eq!(err.error_code(), "ERR_FLOW_MALFORMED_PAYLOAD");

        // Valid JSON of the wrong shape is just as malformed
        assert!(decode_edges(r#"{"from":"a"}"#).is_err());
    }

    #[test]
    fn test_decode_accepts_client_payload_shape() {
        // The stored text uses the same wire shape the web client sends
        let text = r#"[
            {"id":"q1","type":"question","content":"Is it plugged in?"},
            {"id":"s1","type":"solution","content":"Plug it in","qaPageId":"a-1"}
        ]"#;

        let nodes = decode_nodes(text).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].kind, NodeKind::Question);
        assert_eq!(nodes[1].qa_page_id.as_deref(), Some("a-1"));
    }
}
