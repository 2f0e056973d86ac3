//! Diagnosis flow lifecycle and traversal resolution.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use fieldguide_flow::{codec, decode_graph, FlowGraph, FlowValidator};
use fieldguide_store::FlowRecord;

use crate::api::flows::{
    CreateFlowRequest, FlowResponse, SolutionRef, TraversalResponse, UpdateFlowRequest,
};
use crate::error::{ServerError, ServerResult};
use crate::server::KnowledgeServer;

impl KnowledgeServer {
    /// Validates and stores a new flow. The graph is rejected before
    /// anything is written if it has duplicate nodes, dangling edges, a
    /// missing start node, no solution, or a cycle.
    pub async fn create_flow(&self, req: CreateFlowRequest) -> ServerResult<FlowResponse> {
        if req.title.trim().is_empty() {
            return Err(ServerError::ValidationError("Title is required".to_string()));
        }

        let graph = FlowGraph::new(req.start_node_id, req.nodes, req.edges);
        FlowValidator::validate(&graph)?;

        let now = Utc::now();
        let record = FlowRecord {
            id: Uuid::new_v4().to_string(),
            title: req.title,
            description: req.description,
            start_node_id: graph.start_node_id.clone(),
            nodes: codec::encode_nodes(&graph.nodes)?,
            edges: codec::encode_edges(&graph.edges)?,
            created_at: now,
            updated_at: now,
        };

        self.store.store_flow(&record).await?;
        info!(flow_id = %record.id, nodes = graph.nodes.len(), "Created diagnosis flow");
        Ok(FlowResponse::from_parts(record, graph))
    }

    pub async fn get_flow(&self, flow_id: &str) -> ServerResult<FlowResponse> {
        let record = self.require_flow(flow_id).await?;
        let graph = decode_stored(&record)?;
        Ok(FlowResponse::from_parts(record, graph))
    }

    /// Lists flows, newest first.
    pub async fn list_flows(&self) -> ServerResult<Vec<FlowResponse>> {
        let mut records = self.store.list_flows().await?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut responses = Vec::with_capacity(records.len());
        for record in records {
            let graph = decode_stored(&record)?;
            responses.push(FlowResponse::from_parts(record, graph));
        }
        Ok(responses)
    }

    /// Applies a partial update. When any graph field is supplied, the
    /// merged graph (supplied fields over stored ones) must validate as a
    /// whole; only the supplied fields are persisted.
    pub async fn update_flow(
        &self,
        flow_id: &str,
        req: UpdateFlowRequest,
    ) -> ServerResult<FlowResponse> {
        let mut record = self.require_flow(flow_id).await?;

        let nodes_supplied = req.nodes.is_some();
        let edges_supplied = req.edges.is_some();
        let start_supplied = req.start_node_id.is_some();

        if nodes_supplied || edges_supplied || start_supplied {
            let stored = decode_stored(&record)?;
            let candidate = FlowGraph::new(
                req.start_node_id
                    .unwrap_or_else(|| record.start_node_id.clone()),
                req.nodes.unwrap_or(stored.nodes),
                req.edges.unwrap_or(stored.edges),
            );
            FlowValidator::validate(&candidate)?;

            if nodes_supplied {
                record.nodes = codec::encode_nodes(&candidate.nodes)?;
            }
            if edges_supplied {
                record.edges = codec::encode_edges(&candidate.edges)?;
            }
            if start_supplied {
                record.start_node_id = candidate.start_node_id;
            }
        }

        if let Some(title) = req.title {
            if title.trim().is_empty() {
                return Err(ServerError::ValidationError("Title is required".to_string()));
            }
            record.title = title;
        }
        if let Some(description) = req.description {
            record.description = Some(description);
        }
        record.updated_at = Utc::now();

        self.store.update_flow(&record).await?;
        info!(flow_id = %record.id, "Updated diagnosis flow");

        let graph = decode_stored(&record)?;
        Ok(FlowResponse::from_parts(record, graph))
    }

    pub async fn delete_flow(&self, flow_id: &str) -> ServerResult<()> {
        self.require_flow(flow_id).await?;
        self.store.delete_flow(flow_id).await?;
        info!(%flow_id, "Deleted diagnosis flow");
        Ok(())
    }

    /// Resolves one step of a guided diagnosis: the current node, the
    /// labeled outgoing options, and, for solution nodes, the linked
    /// article if it still exists.
    pub async fn resolve_flow_node(
        &self,
        flow_id: &str,
        node_id: &str,
    ) -> ServerResult<TraversalResponse> {
        let record = self.require_flow(flow_id).await?;
        let graph = decode_stored(&record)?;

        let node = graph
            .node(node_id)
            .ok_or_else(|| ServerError::NotFound("Node".to_string()))?;

        let options = graph.options_from(node_id);

        let solution = if node.is_solution() {
            match &node.qa_page_id {
                Some(article_id) => {
                    self.store
                        .get_article(article_id)
                        .await?
                        .map(|article| SolutionRef {
                            id: article.id,
                            title: article.title,
                            slug: article.slug,
                        })
                }
                None => None,
            }
        } else {
            None
        };

        Ok(TraversalResponse {
            current_node: node.clone(),
            options,
            solution,
        })
    }

    async fn require_flow(&self, flow_id: &str) -> ServerResult<FlowRecord> {
        self.store
            .get_flow(flow_id)
            .await?
            .ok_or_else(|| ServerError::NotFound("Flow".to_string()))
    }
}

/// Decodes the persisted graph columns. A record that no longer parses is
/// a server fault, not a client error.
fn decode_stored(record: &FlowRecord) -> ServerResult<FlowGraph> {
    decode_graph(&record.start_node_id, &record.nodes, &record.edges).map_err(|err| {
        ServerError::InternalError(format!("Stored flow {} is corrupted: {}", record.id, err))
    })
}
