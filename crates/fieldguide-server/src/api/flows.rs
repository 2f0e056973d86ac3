//! Diagnosis-flow endpoints: graph CRUD and stateless traversal.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use fieldguide_flow::{FlowEdge, FlowGraph, FlowNode, TraversalOption};
use fieldguide_store::FlowRecord;

use crate::server::KnowledgeServer;

use super::auth::AdminUser;
use super::errors::api_error_response;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlowRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub start_node_id: String,
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFlowRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_node_id: Option<String>,
    pub nodes: Option<Vec<FlowNode>>,
    pub edges: Option<Vec<FlowEdge>>,
}

/// Flow as served to clients, with the graph decoded back into node and
/// edge lists.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_node_id: String,
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FlowResponse {
    pub fn from_parts(record: FlowRecord, graph: FlowGraph) -> Self {
        FlowResponse {
            id: record.id,
            title: record.title,
            description: record.description,
            start_node_id: graph.start_node_id,
            nodes: graph.nodes,
            edges: graph.edges,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// One traversal step: the current node, the outgoing choices, and the
/// linked article when the node is a solution.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalResponse {
    pub current_node: FlowNode,
    pub options: Vec<TraversalOption>,
    pub solution: Option<SolutionRef>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SolutionRef {
    pub id: String,
    pub title: String,
    pub slug: String,
}

pub async fn create_flow_handler(
    State(server): State<Arc<KnowledgeServer>>,
    _admin: AdminUser,
    Json(req): Json<CreateFlowRequest>,
) -> impl IntoResponse {
    match server.create_flow(req).await {
        Ok(flow) => (StatusCode::CREATED, Json(flow)).into_response(),
        Err(err) => {
            if !err.is_client_error() {
                error!(?err, "Failed to create flow");
            }
            api_error_response(&err)
        }
    }
}

pub async fn list_flows_handler(State(server): State<Arc<KnowledgeServer>>) -> impl IntoResponse {
    match server.list_flows().await {
        Ok(flows) => Json(flows).into_response(),
        Err(err) => {
            error!(?err, "Failed to list flows");
            api_error_response(&err)
        }
    }
}

pub async fn get_flow_handler(
    State(server): State<Arc<KnowledgeServer>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match server.get_flow(&id).await {
        Ok(flow) => Json(flow).into_response(),
        Err(err) => api_error_response(&err),
    }
}

pub async fn update_flow_handler(
    State(server): State<Arc<KnowledgeServer>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateFlowRequest>,
) -> impl IntoResponse {
    match server.update_flow(&id, req).await {
        Ok(flow) => Json(flow).into_response(),
        Err(err) => {
            if !err.is_client_error() {
                error!(?err, flow_id = %id, "Failed to update flow");
            }
            api_error_response(&err)
        }
    }
}

pub async fn delete_flow_handler(
    State(server): State<Arc<KnowledgeServer>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match server.delete_flow(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => api_error_response(&err),
    }
}

pub async fn resolve_node_handler(
    State(server): State<Arc<KnowledgeServer>>,
    Path((id, node_id)): Path<(String, String)>,
) -> impl IntoResponse {
    match server.resolve_flow_node(&id, &node_id).await {
        Ok(step) => Json(step).into_response(),
        Err(err) => {
            if !err.is_client_error() {
                error!(?err, flow_id = %id, "Failed to resolve flow node");
            }
            api_error_response(&err)
        }
    }
}
