//! Fieldguide Search
//!
//! Provides the full-text search boundary. The `SearchIndex` trait defines
//! the contract for keeping the article index in step with the store and
//! for running structured queries; `meili` backs it with a Meilisearch
//! instance over HTTP and `memory` with a filtered map for tests and
//! development.
//!
//! Queries are structured (`SearchQuery`); only the Meilisearch backend
//! turns them into the engine's filter-expression syntax.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use fieldguide_store::{Article, ArticleKind, ArticleStatus, Category};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod meili;
pub mod memory;

pub use meili::MeiliClient;
pub use memory::InMemoryIndex;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Search backend error: {0}")]
    BackendError(#[from] anyhow::Error), // Catch-all for backend-specific issues

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Result type for SearchIndex operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Category projection carried on indexed documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub name: String,
    pub slug: String,
}

/// An article as stored in the search index.
///
/// `created_at` is a unix timestamp in milliseconds so the engine can sort
/// on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDocument {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub content_text: String,
    #[serde(rename = "type")]
    pub kind: ArticleKind,
    pub status: ArticleStatus,
    pub category_id: Option<String>,
    pub category: Option<CategoryRef>,
    pub tags: Vec<String>,
    pub created_at: i64,
    pub view_count: u64,
}

impl SearchDocument {
    /// Project an article (and its resolved category, when any) into the
    /// indexed shape.
    pub fn from_article(article: &Article, category: Option<&Category>) -> Self {
        SearchDocument {
            id: article.id.clone(),
            slug: article.slug.clone(),
            title: article.title.clone(),
            content_text: article.content_text.clone(),
            kind: article.kind,
            status: article.status,
            category_id: article.category_id.clone(),
            category: category.map(|category| CategoryRef {
                name: category.name.clone(),
                slug: category.slug.clone(),
            }),
            tags: article.tags.clone(),
            created_at: article.created_at.timestamp_millis(),
            view_count: article.view_count,
        }
    }

    /// The document's creation time as a chrono timestamp.
    pub fn created_at_utc(&self) -> chrono::DateTime<Utc> {
        Utc.timestamp_millis_opt(self.created_at)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// A structured search request.
///
/// Empty filter lists match everything; tag and kind conditions within a
/// list are OR-ed, conditions across fields are AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    pub kinds: Vec<ArticleKind>,
    pub statuses: Vec<ArticleStatus>,
    pub tags: Vec<String>,
    pub category_id: Option<String>,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        SearchQuery {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Offset of the first hit of the requested page.
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1) * self.limit
    }
}

impl Default for SearchQuery {
    fn default() -> Self {
        SearchQuery {
            text: String::new(),
            kinds: Vec::new(),
            statuses: Vec::new(),
            tags: Vec::new(),
            category_id: None,
            page: 1,
            limit: 20,
        }
    }
}

/// One page of search results.
///
/// Field names line up with the engine's response so the HTTP backend can
/// deserialize it directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub hits: Vec<SearchDocument>,
    #[serde(default)]
    pub estimated_total_hits: u64,
    #[serde(default)]
    pub processing_time_ms: u64,
}

/// Trait defining the contract for search-index implementations.
///
/// Index writes are eventually consistent: callers treat failures as
/// warnings, never as request failures. Whether a given article belongs in
/// the index (only published ones do) is the caller's policy, not the
/// backend's.
#[async_trait]
pub trait SearchIndex: Send + Sync + std::fmt::Debug {
    /// Create the index if needed and apply its settings.
    async fn ensure_index(&self) -> SearchResult<()>;

    /// Add or refresh a document.
    async fn index_document(&self, document: &SearchDocument) -> SearchResult<()>;

    /// Remove a document by id. Removing an absent document is not an error.
    async fn remove_document(&self, document_id: &str) -> SearchResult<()>;

    /// Drop all documents, keeping the index and its settings.
    async fn clear_documents(&self) -> SearchResult<()>;

    /// Run a structured query.
    async fn search(&self, query: &SearchQuery) -> SearchResult<SearchPage>;

    /// Check whether the backend is reachable and serving.
    async fn health_check(&self) -> SearchResult<bool>;

    /// Convert to Any for downcasting
    fn as_any(&self) -> &dyn std::any::Any
    where
        Self: 'static;
}
