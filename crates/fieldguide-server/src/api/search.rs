//! Full-text search endpoint.
//!
//! The only rate-limited route: lookups fan out to the external index, so
//! each client IP gets a fixed request budget per window.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use fieldguide_search::CategoryRef;
use fieldguide_store::ArticleKind;

use crate::rate_limit::RateLimiterKey;
use crate::server::KnowledgeServer;

use super::errors::api_error_response;

/// Raw query-string parameters. Everything arrives as text; numeric
/// values are parsed leniently with fallbacks.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category_id: Option<String>,
    pub tags: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub snippet: String,
    #[serde(rename = "type")]
    pub kind: ArticleKind,
    pub tags: Vec<String>,
    pub category: CategoryRef,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    pub query: String,
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
    pub processing_time: u64,
}

pub async fn search_handler(
    State(server): State<Arc<KnowledgeServer>>,
    Query(params): Query<SearchParams>,
    headers: HeaderMap,
) -> Response {
    let key = RateLimiterKey::new("search", client_identifier(&headers));
    if let Err(err) = server.search_limiter.allow(&key) {
        return api_error_response(&err);
    }

    match server.search_articles(&params).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => {
            if !err.is_client_error() {
                error!(?err, "Search failed");
            }
            api_error_response(&err)
        }
    }
}

/// Client IP for rate limiting, taken from the first `x-forwarded-for`
/// entry when the server sits behind a proxy.
fn client_identifier(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|list| list.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_identifier_takes_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1, 172.16.0.9".parse().unwrap());
        assert_eq!(client_identifier(&headers), Some("10.0.0.1".to_string()));
    }

    #[test]
    fn client_identifier_is_none_without_header() {
        assert_eq!(client_identifier(&HeaderMap::new()), None);
    }
}
