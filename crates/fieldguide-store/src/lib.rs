//! Fieldguide Store
//!
//! Provides the repository abstraction for knowledge-base records and two
//! reference backends. The `KnowledgeStore` trait defines the contract for
//! persisting users, articles, taxonomy, diagnosis flows, and article
//! history; `memory` backs it with shared maps and `file` with JSON
//! documents under a data directory.

use async_trait::async_trait;
use thiserror::Error;

mod types;

pub mod file;
pub mod memory;
pub mod snapshot;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use types::{
    Article, ArticleFilter, ArticleKind, ArticleStatus, Category, FlowRecord, HistoryEntry, Role,
    Tag, User,
};

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    BackendError(#[from] anyhow::Error), // Catch-all for backend-specific issues

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Result type for KnowledgeStore operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait defining the contract for knowledge-store implementations.
///
/// Lookups return `Ok(None)` for absent records; `NotFound` is reserved for
/// operations that require the record to exist (updates, deletes, counter
/// bumps). Uniqueness violations (user email, article slug, category slug)
/// surface as `Conflict`.
#[async_trait]
pub trait KnowledgeStore: Send + Sync + std::fmt::Debug {
    // Users

    /// Store a new user. Fails with `Conflict` when the id or email is taken.
    async fn store_user(&self, user: &User) -> StoreResult<()>;

    /// Look up a user by id.
    async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>>;

    /// Look up a user by email (exact match).
    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// List all users, newest first.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Replace an existing user record.
    async fn update_user(&self, user: &User) -> StoreResult<()>;

    /// Delete a user by id.
    async fn delete_user(&self, user_id: &str) -> StoreResult<()>;

    // Articles

    /// Store a new article. Fails with `Conflict` when the id or slug is taken.
    async fn store_article(&self, article: &Article) -> StoreResult<()>;

    /// Look up an article by id.
    async fn get_article(&self, article_id: &str) -> StoreResult<Option<Article>>;

    /// Look up an article by slug.
    async fn get_article_by_slug(&self, slug: &str) -> StoreResult<Option<Article>>;

    /// List articles matching the filter, newest first.
    async fn list_articles(&self, filter: &ArticleFilter) -> StoreResult<Vec<Article>>;

    /// Replace an existing article record. Fails with `Conflict` when the
    /// new slug collides with a different article.
    async fn update_article(&self, article: &Article) -> StoreResult<()>;

    /// Delete an article and its history entries.
    async fn delete_article(&self, article_id: &str) -> StoreResult<()>;

    /// Atomically bump an article's view counter, returning the new count.
    async fn increment_view_count(&self, article_id: &str) -> StoreResult<u64>;

    // Tags

    /// Register a tag name, keeping the existing entry when already present.
    async fn upsert_tag(&self, tag: &Tag) -> StoreResult<()>;

    /// List all registered tags, sorted by name.
    async fn list_tags(&self) -> StoreResult<Vec<Tag>>;

    // Categories

    /// Store a new category. Fails with `Conflict` when the slug is taken.
    async fn store_category(&self, category: &Category) -> StoreResult<()>;

    /// Look up a category by id.
    async fn get_category(&self, category_id: &str) -> StoreResult<Option<Category>>;

    /// List all categories, sorted by name.
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;

    // Diagnosis flows

    /// Store a new flow record.
    async fn store_flow(&self, flow: &FlowRecord) -> StoreResult<()>;

    /// Look up a flow record by id.
    async fn get_flow(&self, flow_id: &str) -> StoreResult<Option<FlowRecord>>;

    /// List all flow records, newest first.
    async fn list_flows(&self) -> StoreResult<Vec<FlowRecord>>;

    /// Replace an existing flow record.
    async fn update_flow(&self, flow: &FlowRecord) -> StoreResult<()>;

    /// Delete a flow record by id.
    async fn delete_flow(&self, flow_id: &str) -> StoreResult<()>;

    // Article history

    /// Store a history snapshot.
    async fn store_history(&self, entry: &HistoryEntry) -> StoreResult<()>;

    /// Look up a history entry by id.
    async fn get_history(&self, history_id: &str) -> StoreResult<Option<HistoryEntry>>;

    /// List the history of an article, newest first.
    async fn list_history(&self, article_id: &str) -> StoreResult<Vec<HistoryEntry>>;

    // Aggregates

    /// Total number of articles.
    async fn count_articles(&self) -> StoreResult<u64>;

    /// Total number of users.
    async fn count_users(&self) -> StoreResult<u64>;

    /// Sum of view counters across all articles.
    async fn total_views(&self) -> StoreResult<u64>;

    /// Convert to Any for downcasting
    fn as_any(&self) -> &dyn std::any::Any
    where
        Self: 'static;
}
