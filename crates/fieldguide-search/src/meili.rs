//! Meilisearch implementation of SearchIndex
//!
//! Talks to a Meilisearch instance over its REST API. Document writes are
//! acknowledged as asynchronous tasks by the engine; this client treats an
//! accepted task as success.

use crate::{SearchDocument, SearchError, SearchIndex, SearchPage, SearchQuery, SearchResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, error};

/// Name of the article index.
const INDEX_UID: &str = "qa_pages";

/// Meilisearch implementation of SearchIndex
#[derive(Debug, Clone)]
pub struct MeiliClient {
    /// Base URL of the Meilisearch instance
    base_url: String,

    /// API key (master or index-scoped)
    api_key: String,

    /// HTTP client
    client: Client,
}

impl MeiliClient {
    /// Create a new MeiliClient instance
    pub fn new(base_url: String, api_key: String) -> Self {
        // Create a reqwest client with reasonable defaults
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }

    /// Format the index collection endpoint URL
    fn indexes_endpoint(&self) -> String {
        format!("{}/indexes", self.base_url)
    }

    /// Format the index settings endpoint URL
    fn settings_endpoint(&self) -> String {
        format!("{}/indexes/{}/settings", self.base_url, INDEX_UID)
    }

    /// Format the documents endpoint URL
    fn documents_endpoint(&self) -> String {
        format!("{}/indexes/{}/documents", self.base_url, INDEX_UID)
    }

    /// Format a single-document endpoint URL
    fn document_endpoint(&self, document_id: &str) -> String {
        format!("{}/{}", self.documents_endpoint(), document_id)
    }

    /// Format the search endpoint URL
    fn search_endpoint(&self) -> String {
        format!("{}/indexes/{}/search", self.base_url, INDEX_UID)
    }

    /// Format the health endpoint URL
    fn health_endpoint(&self) -> String {
        format!("{}/health", self.base_url)
    }

    /// Build the engine's filter expression for a structured query.
    ///
    /// Values within one field are OR-ed, fields are AND-ed. Returns `None`
    /// when the query carries no filters.
    fn build_filter(query: &SearchQuery) -> Option<String> {
        let mut conditions = Vec::new();

        if !query.kinds.is_empty() {
            let kinds = query
                .kinds
                .iter()
                .map(|kind| format!("type = \"{}\"", kind.as_str()))
                .collect::<Vec<_>>()
                .join(" OR ");
            conditions.push(format!("({})", kinds));
        }

        if !query.statuses.is_empty() {
            let statuses = query
                .statuses
                .iter()
                .map(|status| format!("status = \"{}\"", status.as_str()))
                .collect::<Vec<_>>()
                .join(" OR ");
            conditions.push(format!("({})", statuses));
        }

        if !query.tags.is_empty() {
            let tags = query
                .tags
                .iter()
                .map(|tag| format!("tags = \"{}\"", tag))
                .collect::<Vec<_>>()
                .join(" OR ");
            conditions.push(format!("({})", tags));
        }

        if let Some(category_id) = &query.category_id {
            conditions.push(format!("categoryId = \"{}\"", category_id));
        }

        if conditions.is_empty() {
            None
        } else {
            Some(conditions.join(" AND "))
        }
    }
}

#[async_trait]
impl SearchIndex for MeiliClient {
    async fn ensure_index(&self) -> SearchResult<()> {
        debug!("Ensuring index {} exists", INDEX_UID);

        // Index creation is an asynchronous task; a duplicate create fails
        // inside the task, not here, so the follow-up settings write is
        // what actually matters.
        let response = self
            .client
            .post(self.indexes_endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({ "uid": INDEX_UID, "primaryKey": "id" }))
            .send()
            .await
            .map_err(|e| SearchError::BackendError(e.into()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Failed to create index: {}", error_text);
            return Err(SearchError::BackendError(anyhow::anyhow!(
                "Failed to create index: Status {}, Error: {}",
                status,
                error_text
            )));
        }

        let settings = json!({
            "searchableAttributes": ["title", "contentText", "tags"],
            "filterableAttributes": ["type", "status", "categoryId", "tags"],
            "sortableAttributes": ["createdAt", "viewCount"],
            "displayedAttributes": [
                "id", "slug", "title", "contentText", "type", "status",
                "categoryId", "category", "tags", "createdAt", "viewCount"
            ],
            "rankingRules": ["words", "typo", "proximity", "attribute", "sort", "exactness"]
        });

        let response = self
            .client
            .patch(self.settings_endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&settings)
            .send()
            .await
            .map_err(|e| SearchError::BackendError(e.into()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Failed to update index settings: {}", error_text);
            return Err(SearchError::BackendError(anyhow::anyhow!(
                "Failed to update index settings: Status {}, Error: {}",
                status,
                error_text
            )));
        }

        Ok(())
    }

    async fn index_document(&self, document: &SearchDocument) -> SearchResult<()> {
        debug!("Indexing document {}", document.id);

        let response = self
            .client
            .post(self.documents_endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&[document])
            .send()
            .await
            .map_err(|e| SearchError::BackendError(e.into()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Failed to index document: {}", error_text);
            return Err(SearchError::BackendError(anyhow::anyhow!(
                "Failed to index document: Status {}, Error: {}",
                status,
                error_text
            )));
        }

        Ok(())
    }

    async fn remove_document(&self, document_id: &str) -> SearchResult<()> {
        debug!("Removing document {}", document_id);

        let response = self
            .client
            .delete(self.document_endpoint(document_id))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| SearchError::BackendError(e.into()))?;

        // Removing an already-absent document is fine (idempotent)
        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Failed to remove document: {}", error_text);
            return Err(SearchError::BackendError(anyhow::anyhow!(
                "Failed to remove document: Status {}, Error: {}",
                status,
                error_text
            )));
        }

        Ok(())
    }

    async fn clear_documents(&self) -> SearchResult<()> {
        debug!("Clearing all documents from {}", INDEX_UID);

        let response = self
            .client
            .delete(self.documents_endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| SearchError::BackendError(e.into()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Failed to clear documents: {}", error_text);
            return Err(SearchError::BackendError(anyhow::anyhow!(
                "Failed to clear documents: Status {}, Error: {}",
                status,
                error_text
            )));
        }

        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> SearchResult<SearchPage> {
        let mut body = json!({
            "q": query.text,
            "limit": query.limit,
            "offset": query.offset(),
        });
        if let Some(filter) = Self::build_filter(query) {
            body["filter"] = json!(filter);
        }

        let response = self
            .client
            .post(self.search_endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::BackendError(e.into()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Search request failed: {}", error_text);
            return Err(SearchError::BackendError(anyhow::anyhow!(
                "Search request failed: Status {}, Error: {}",
                status,
                error_text
            )));
        }

        response
            .json::<SearchPage>()
            .await
            .map_err(|e| SearchError::BackendError(e.into()))
    }

    async fn health_check(&self) -> SearchResult<bool> {
        let response = self
            .client
            .get(self.health_endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| SearchError::BackendError(e.into()))?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SearchError::BackendError(e.into()))?;
        Ok(body["status"] == "available")
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
