//! In-memory implementation of KnowledgeStore
//!
//! This implementation is primarily intended for testing and development purposes.

use crate::{
    Article, ArticleFilter, Category, FlowRecord, HistoryEntry, KnowledgeStore, StoreError,
    StoreResult, Tag, User,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of KnowledgeStore
///
/// Records live in shared maps; clones of the store share the same state.
/// All data is lost when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<String, User>>>,
    articles: Arc<RwLock<HashMap<String, Article>>>,
    tags: Arc<RwLock<HashMap<String, Tag>>>,
    categories: Arc<RwLock<HashMap<String, Category>>>,
    flows: Arc<RwLock<HashMap<String, FlowRecord>>>,
    history: Arc<RwLock<HashMap<String, HistoryEntry>>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            articles: Arc::new(RwLock::new(HashMap::new())),
            tags: Arc::new(RwLock::new(HashMap::new())),
            categories: Arc::new(RwLock::new(HashMap::new())),
            flows: Arc::new(RwLock::new(HashMap::new())),
            history: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeStore for MemoryStore {
    async fn store_user(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(StoreError::Conflict(format!(
                "user id already exists: {}",
                user.id
            )));
        }
        if users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "user email already exists: {}",
                user.email
            )));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(StoreError::NotFound(format!("user: {}", user.id)));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> StoreResult<()> {
        let mut users = self.users.write().await;
        match users.remove(user_id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(format!("user: {}", user_id))),
        }
    }

    async fn store_article(&self, article: &Article) -> StoreResult<()> {
        let mut articles = self.articles.write().await;
        if articles.contains_key(&article.id) {
            return Err(StoreError::Conflict(format!(
                "article id already exists: {}",
                article.id
            )));
        }
        if articles.values().any(|existing| existing.slug == article.slug) {
            return Err(StoreError::Conflict(format!(
                "article slug already exists: {}",
                article.slug
            )));
        }
        articles.insert(article.id.clone(), article.clone());
        Ok(())
    }

    async fn get_article(&self, article_id: &str) -> StoreResult<Option<Article>> {
        let articles = self.articles.read().await;
        Ok(articles.get(article_id).cloned())
    }

    async fn get_article_by_slug(&self, slug: &str) -> StoreResult<Option<Article>> {
        let articles = self.articles.read().await;
        Ok(articles.values().find(|article| article.slug == slug).cloned())
    }

    async fn list_articles(&self, filter: &ArticleFilter) -> StoreResult<Vec<Article>> {
        let articles = self.articles.read().await;
        let mut matching: Vec<Article> = articles
            .values()
            .filter(|article| filter.matches(article))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn update_article(&self, article: &Article) -> StoreResult<()> {
        let mut articles = self.articles.write().await;
        if !articles.contains_key(&article.id) {
            return Err(StoreError::NotFound(format!("article: {}", article.id)));
        }
        let slug_taken = articles
            .values()
            .any(|existing| existing.slug == article.slug && existing.id != article.id);
        if slug_taken {
            return Err(StoreError::Conflict(format!(
                "article slug already exists: {}",
                article.slug
            )));
        }
        articles.insert(article.id.clone(), article.clone());
        Ok(())
    }

    async fn delete_article(&self, article_id: &str) -> StoreResult<()> {
        let mut articles = self.articles.write().await;
        if articles.remove(article_id).is_none() {
            return Err(StoreError::NotFound(format!("article: {}", article_id)));
        }
        // History entries cascade with their article
        let mut history = self.history.write().await;
        history.retain(|_, entry| entry.article_id != article_id);
        Ok(())
    }

    async fn increment_view_count(&self, article_id: &str) -> StoreResult<u64> {
        let mut articles = self.articles.write().await;
        match articles.get_mut(article_id) {
            Some(article) => {
                article.view_count += 1;
                Ok(article.view_count)
            }
            None => Err(StoreError::NotFound(format!("article: {}", article_id))),
        }
    }

    async fn upsert_tag(&self, tag: &Tag) -> StoreResult<()> {
        let mut tags = self.tags.write().await;
        tags.entry(tag.name.clone()).or_insert_with(|| tag.clone());
        Ok(())
    }

    async fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        let tags = self.tags.read().await;
        let mut all: Vec<Tag> = tags.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn store_category(&self, category: &Category) -> StoreResult<()> {
        let mut categories = self.categories.write().await;
        if categories.contains_key(&category.id) {
            return Err(StoreError::Conflict(format!(
                "category id already exists: {}",
                category.id
            )));
        }
        if categories
            .values()
            .any(|existing| existing.slug == category.slug)
        {
            return Err(StoreError::Conflict(format!(
                "category slug already exists: {}",
                category.slug
            )));
        }
        categories.insert(category.id.clone(), category.clone());
        Ok(())
    }

    async fn get_category(&self, category_id: &str) -> StoreResult<Option<Category>> {
        let categories = self.categories.read().await;
        Ok(categories.get(category_id).cloned())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let categories = self.categories.read().await;
        let mut all: Vec<Category> = categories.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn store_flow(&self, flow: &FlowRecord) -> StoreResult<()> {
        let mut flows = self.flows.write().await;
        if flows.contains_key(&flow.id) {
            return Err(StoreError::Conflict(format!(
                "flow id already exists: {}",
                flow.id
            )));
        }
        flows.insert(flow.id.clone(), flow.clone());
        Ok(())
    }

    async fn get_flow(&self, flow_id: &str) -> StoreResult<Option<FlowRecord>> {
        let flows = self.flows.read().await;
        Ok(flows.get(flow_id).cloned())
    }

    async fn list_flows(&self) -> StoreResult<Vec<FlowRecord>> {
        let flows = self.flows.read().await;
        let mut all: Vec<FlowRecord> = flows.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update_flow(&self, flow: &FlowRecord) -> StoreResult<()> {
        let mut flows = self.flows.write().await;
        if !flows.contains_key(&flow.id) {
            return Err(StoreError::NotFound(format!("flow: {}", flow.id)));
        }
        flows.insert(flow.id.clone(), flow.clone());
        Ok(())
    }

    async fn delete_flow(&self, flow_id: &str) -> StoreResult<()> {
        let mut flows = self.flows.write().await;
        match flows.remove(flow_id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(format!("flow: {}", flow_id))),
        }
    }

    async fn store_history(&self, entry: &HistoryEntry) -> StoreResult<()> {
        let mut history = self.history.write().await;
        history.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn get_history(&self, history_id: &str) -> StoreResult<Option<HistoryEntry>> {
        let history = self.history.read().await;
        Ok(history.get(history_id).cloned())
    }

    async fn list_history(&self, article_id: &str) -> StoreResult<Vec<HistoryEntry>> {
        let history = self.history.read().await;
        let mut entries: Vec<HistoryEntry> = history
            .values()
            .filter(|entry| entry.article_id == article_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn count_articles(&self) -> StoreResult<u64> {
        let articles = self.articles.read().await;
        Ok(articles.len() as u64)
    }

    async fn count_users(&self) -> StoreResult<u64> {
        let users = self.users.read().await;
        Ok(users.len() as u64)
    }

    async fn total_views(&self) -> StoreResult<u64> {
        let articles = self.articles.read().await;
        Ok(articles.values().map(|article| article.view_count).sum())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
