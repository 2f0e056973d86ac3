//! File-backed implementation of KnowledgeStore
//!
//! Stores one JSON document per record under a data directory, with tags
//! collected in a single registry file. Suited to single-process
//! deployments and the operational tooling; concurrent access within the
//! process is serialized through a coarse lock.

use crate::{
    Article, ArticleFilter, Category, FlowRecord, HistoryEntry, KnowledgeStore, StoreError,
    StoreResult, Tag, User,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

const USERS: &str = "users";
const ARTICLES: &str = "articles";
const CATEGORIES: &str = "categories";
const FLOWS: &str = "flows";
const HISTORY: &str = "history";
const TAGS_FILE: &str = "tags.json";

/// File-backed implementation of KnowledgeStore
///
/// Data survives restarts; a fresh handle over the same directory sees all
/// previously written records. Clones share the same lock and directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    lock: Arc<RwLock<()>>,
}

impl FileStore {
    /// Open (or initialize) a store rooted at `root`, creating the
    /// collection directories as needed.
    pub fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        for collection in [USERS, ARTICLES, CATEGORIES, FLOWS, HISTORY] {
            std::fs::create_dir_all(root.join(collection))?;
        }
        debug!(root = %root.display(), "file store initialized");
        Ok(Self {
            root,
            lock: Arc::new(RwLock::new(())),
        })
    }

    /// Resolve the document path for a record id.
    ///
    /// Ids are uuids; anything containing other characters cannot name a
    /// record file and resolves to nothing.
    fn record_path(&self, collection: &str, id: &str) -> Option<PathBuf> {
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return None;
        }
        Some(self.root.join(collection).join(format!("{}.json", id)))
    }

    fn require_path(&self, collection: &str, id: &str) -> StoreResult<PathBuf> {
        self.record_path(collection, id)
            .ok_or_else(|| StoreError::NotFound(format!("{}: {}", collection, id)))
    }

    async fn read_record<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_record<T: Serialize>(path: &Path, record: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(record)?;
        // Write-then-rename keeps readers off half-written documents
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn remove_record(path: &Path) -> StoreResult<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn list_collection<T: DeserializeOwned>(&self, collection: &str) -> StoreResult<Vec<T>> {
        let dir = self.root.join(collection);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(record) = Self::read_record(&path).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn read_tags(&self) -> StoreResult<BTreeMap<String, Tag>> {
        let path = self.root.join(TAGS_FILE);
        Ok(Self::read_record(&path).await?.unwrap_or_default())
    }

    async fn write_tags(&self, tags: &BTreeMap<String, Tag>) -> StoreResult<()> {
        let path = self.root.join(TAGS_FILE);
        Self::write_record(&path, tags).await
    }
}

#[async_trait]
impl KnowledgeStore for FileStore {
    async fn store_user(&self, user: &User) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        let path = self
            .record_path(USERS, &user.id)
            .ok_or_else(|| anyhow::anyhow!("record id is not a valid file name: {}", user.id))?;
        if fs::try_exists(&path).await? {
            return Err(StoreError::Conflict(format!(
                "user id already exists: {}",
                user.id
            )));
        }
        let existing: Vec<User> = self.list_collection(USERS).await?;
        if existing.iter().any(|candidate| candidate.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "user email already exists: {}",
                user.email
            )));
        }
        Self::write_record(&path, user).await
    }

    async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        let _guard = self.lock.read().await;
        match self.record_path(USERS, user_id) {
            Some(path) => Self::read_record(&path).await,
            None => Ok(None),
        }
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let _guard = self.lock.read().await;
        let users: Vec<User> = self.list_collection(USERS).await?;
        Ok(users.into_iter().find(|user| user.email == email))
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let _guard = self.lock.read().await;
        let mut users: Vec<User> = self.list_collection(USERS).await?;
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        let path = self.require_path(USERS, &user.id)?;
        if !fs::try_exists(&path).await? {
            return Err(StoreError::NotFound(format!("user: {}", user.id)));
        }
        Self::write_record(&path, user).await
    }

    async fn delete_user(&self, user_id: &str) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        let path = self.require_path(USERS, user_id)?;
        if Self::remove_record(&path).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("user: {}", user_id)))
        }
    }

    async fn store_article(&self, article: &Article) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        let path = self
            .record_path(ARTICLES, &article.id)
            .ok_or_else(|| anyhow::anyhow!("record id is not a valid file name: {}", article.id))?;
        if fs::try_exists(&path).await? {
            return Err(StoreError::Conflict(format!(
                "article id already exists: {}",
                article.id
            )));
        }
        let existing: Vec<Article> = self.list_collection(ARTICLES).await?;
        if existing.iter().any(|candidate| candidate.slug == article.slug) {
            return Err(StoreError::Conflict(format!(
                "article slug already exists: {}",
                article.slug
            )));
        }
        Self::write_record(&path, article).await
    }

    async fn get_article(&self, article_id: &str) -> StoreResult<Option<Article>> {
        let _guard = self.lock.read().await;
        match self.record_path(ARTICLES, article_id) {
            Some(path) => Self::read_record(&path).await,
            None => Ok(None),
        }
    }

    async fn get_article_by_slug(&self, slug: &str) -> StoreResult<Option<Article>> {
        let _guard = self.lock.read().await;
        let articles: Vec<Article> = self.list_collection(ARTICLES).await?;
        Ok(articles.into_iter().find(|article| article.slug == slug))
    }

    async fn list_articles(&self, filter: &ArticleFilter) -> StoreResult<Vec<Article>> {
        let _guard = self.lock.read().await;
        let mut articles: Vec<Article> = self.list_collection(ARTICLES).await?;
        articles.retain(|article| filter.matches(article));
        articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(articles)
    }

    async fn update_article(&self, article: &Article) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        let path = self.require_path(ARTICLES, &article.id)?;
        if !fs::try_exists(&path).await? {
            return Err(StoreError::NotFound(format!("article: {}", article.id)));
        }
        let existing: Vec<Article> = self.list_collection(ARTICLES).await?;
        let slug_taken = existing
            .iter()
            .any(|candidate| candidate.slug == article.slug && candidate.id != article.id);
        if slug_taken {
            return Err(StoreError::Conflict(format!(
                "article slug already exists: {}",
                article.slug
            )));
        }
        Self::write_record(&path, article).await
    }

    async fn delete_article(&self, article_id: &str) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        let path = self.require_path(ARTICLES, article_id)?;
        if !Self::remove_record(&path).await? {
            return Err(StoreError::NotFound(format!("article: {}", article_id)));
        }
        // History entries cascade with their article
        let entries: Vec<HistoryEntry> = self.list_collection(HISTORY).await?;
        for entry in entries {
            if entry.article_id == article_id {
                if let Some(entry_path) = self.record_path(HISTORY, &entry.id) {
                    Self::remove_record(&entry_path).await?;
                }
            }
        }
        Ok(())
    }

    async fn increment_view_count(&self, article_id: &str) -> StoreResult<u64> {
        let _guard = self.lock.write().await;
        let path = self.require_path(ARTICLES, article_id)?;
        let mut article: Article = Self::read_record(&path)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("article: {}", article_id)))?;
        article.view_count += 1;
        Self::write_record(&path, &article).await?;
        Ok(article.view_count)
    }

    async fn upsert_tag(&self, tag: &Tag) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        let mut tags = self.read_tags().await?;
        tags.entry(tag.name.clone()).or_insert_with(|| tag.clone());
        self.write_tags(&tags).await
    }

    async fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        let _guard = self.lock.read().await;
        let tags = self.read_tags().await?;
        Ok(tags.into_values().collect())
    }

    async fn store_category(&self, category: &Category) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        let path = self.record_path(CATEGORIES, &category.id).ok_or_else(|| {
            anyhow::anyhow!("record id is not a valid file name: {}", category.id)
        })?;
        if fs::try_exists(&path).await? {
            return Err(StoreError::Conflict(format!(
                "category id already exists: {}",
                category.id
            )));
        }
        let existing: Vec<Category> = self.list_collection(CATEGORIES).await?;
        if existing
            .iter()
            .any(|candidate| candidate.slug == category.slug)
        {
            return Err(StoreError::Conflict(format!(
                "category slug already exists: {}",
                category.slug
            )));
        }
        Self::write_record(&path, category).await
    }

    async fn get_category(&self, category_id: &str) -> StoreResult<Option<Category>> {
        let _guard = self.lock.read().await;
        match self.record_path(CATEGORIES, category_id) {
            Some(path) => Self::read_record(&path).await,
            None => Ok(None),
        }
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let _guard = self.lock.read().await;
        let mut categories: Vec<Category> = self.list_collection(CATEGORIES).await?;
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn store_flow(&self, flow: &FlowRecord) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        let path = self
            .record_path(FLOWS, &flow.id)
            .ok_or_else(|| anyhow::anyhow!("record id is not a valid file name: {}", flow.id))?;
        if fs::try_exists(&path).await? {
            return Err(StoreError::Conflict(format!(
                "flow id already exists: {}",
                flow.id
            )));
        }
        Self::write_record(&path, flow).await
    }

    async fn get_flow(&self, flow_id: &str) -> StoreResult<Option<FlowRecord>> {
        let _guard = self.lock.read().await;
        match self.record_path(FLOWS, flow_id) {
            Some(path) => Self::read_record(&path).await,
            None => Ok(None),
        }
    }

    async fn list_flows(&self) -> StoreResult<Vec<FlowRecord>> {
        let _guard = self.lock.read().await;
        let mut flows: Vec<FlowRecord> = self.list_collection(FLOWS).await?;
        flows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(flows)
    }

    async fn update_flow(&self, flow: &FlowRecord) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        let path = self.require_path(FLOWS, &flow.id)?;
        if !fs::try_exists(&path).await? {
            return Err(StoreError::NotFound(format!("flow: {}", flow.id)));
        }
        Self::write_record(&path, flow).await
    }

    async fn delete_flow(&self, flow_id: &str) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        let path = self.require_path(FLOWS, flow_id)?;
        if Self::remove_record(&path).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("flow: {}", flow_id)))
        }
    }

    async fn store_history(&self, entry: &HistoryEntry) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        let path = self
            .record_path(HISTORY, &entry.id)
            .ok_or_else(|| anyhow::anyhow!("record id is not a valid file name: {}", entry.id))?;
        Self::write_record(&path, entry).await
    }

    async fn get_history(&self, history_id: &str) -> StoreResult<Option<HistoryEntry>> {
        let _guard = self.lock.read().await;
        match self.record_path(HISTORY, history_id) {
            Some(path) => Self::read_record(&path).await,
            None => Ok(None),
        }
    }

    async fn list_history(&self, article_id: &str) -> StoreResult<Vec<HistoryEntry>> {
        let _guard = self.lock.read().await;
        let mut entries: Vec<HistoryEntry> = self.list_collection(HISTORY).await?;
        entries.retain(|entry| entry.article_id == article_id);
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn count_articles(&self) -> StoreResult<u64> {
        let _guard = self.lock.read().await;
        let articles: Vec<Article> = self.list_collection(ARTICLES).await?;
        Ok(articles.len() as u64)
    }

    async fn count_users(&self) -> StoreResult<u64> {
        let _guard = self.lock.read().await;
        let users: Vec<User> = self.list_collection(USERS).await?;
        Ok(users.len() as u64)
    }

    async fn total_views(&self) -> StoreResult<u64> {
        let _guard = self.lock.read().await;
        let articles: Vec<Article> = self.list_collection(ARTICLES).await?;
        Ok(articles.iter().map(|article| article.view_count).sum())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArticleKind, ArticleStatus, Role};
    use chrono::Utc;
    use tempfile::tempdir;

    fn sample_user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$test".to_string(),
            role: Role::Admin,
            created_at: Utc::now(),
        }
    }

    fn sample_article(id: &str, slug: &str) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Article {}", id),
            slug: slug.to_string(),
            content_markdown: "# Body".to_string(),
            content_text: "Body".to_string(),
            kind: ArticleKind::Troubleshooting,
            status: ArticleStatus::Published,
            author_id: "author-1".to_string(),
            category_id: None,
            tags: vec!["network".to_string()],
            view_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempdir().unwrap();

        {
            let store = FileStore::new(dir.path()).unwrap();
            store
                .store_user(&sample_user("u1", "kept@example.com"))
                .await
                .unwrap();
            store
                .store_article(&sample_article("a1", "kept-article"))
                .await
                .unwrap();
            store
                .upsert_tag(&Tag {
                    name: "network".to_string(),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        // A fresh handle over the same directory sees everything
        let reopened = FileStore::new(dir.path()).unwrap();
        assert!(reopened.get_user("u1").await.unwrap().is_some());
        assert_eq!(
            reopened
                .get_article_by_slug("kept-article")
                .await
                .unwrap()
                .unwrap()
                .id,
            "a1"
        );
        assert_eq!(reopened.list_tags().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        store
            .store_user(&sample_user("u1", "taken@example.com"))
            .await
            .unwrap();
        let err = store
            .store_user(&sample_user("u2", "taken@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_increment_view_count_persists() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        store
            .store_article(&sample_article("a1", "counted"))
            .await
            .unwrap();
        assert_eq!(store.increment_view_count("a1").await.unwrap(), 1);
        assert_eq!(store.increment_view_count("a1").await.unwrap(), 2);

        let reopened = FileStore::new(dir.path()).unwrap();
        assert_eq!(
            reopened.get_article("a1").await.unwrap().unwrap().view_count,
            2
        );
    }

    #[tokio::test]
    async fn test_path_like_ids_resolve_to_nothing() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        assert!(store.get_user("../escape").await.unwrap().is_none());
        assert!(store.get_flow("a/b").await.unwrap().is_none());

        let err = store.delete_user("../escape").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_history_cascades_with_article() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        store
            .store_article(&sample_article("a1", "with-history"))
            .await
            .unwrap();
        store
            .store_history(&HistoryEntry {
                id: "h1".to_string(),
                article_id: "a1".to_string(),
                changed_by: "u1".to_string(),
                old_content: serde_json::json!({"title": "Before"}),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        store.delete_article("a1").await.unwrap();
        assert!(store.list_history("a1").await.unwrap().is_empty());
        assert!(store.get_history("h1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_flow_update_and_delete() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        let mut flow = FlowRecord {
            id: "f1".to_string(),
            title: "Printer diagnosis".to_string(),
            description: Some("Paper jams and friends".to_string()),
            start_node_id: "q1".to_string(),
            nodes: r#"[{"id":"q1","type":"solution","content":"Done"}]"#.to_string(),
            edges: "[]".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.store_flow(&flow).await.unwrap();

        flow.title = "Printer diagnosis v2".to_string();
        store.update_flow(&flow).await.unwrap();
        assert_eq!(
            store.get_flow("f1").await.unwrap().unwrap().title,
            "Printer diagnosis v2"
        );

        store.delete_flow("f1").await.unwrap();
        let err = store.delete_flow("f1").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
