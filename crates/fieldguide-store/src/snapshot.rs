//! Full-store snapshot used by the backup and restore binaries.
//!
//! A snapshot is a single JSON document holding every record in the store,
//! in the order restore must recreate them (users and taxonomy before the
//! articles that reference them).

use serde::{Deserialize, Serialize};

use crate::types::{Article, Category, FlowRecord, HistoryEntry, Tag, User};
use crate::{KnowledgeStore, StoreResult};

/// Serialized dump of every record in a knowledge store.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub flows: Vec<FlowRecord>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl StoreSnapshot {
    /// Reads every record out of `store`.
    pub async fn capture(store: &dyn KnowledgeStore) -> StoreResult<Self> {
        let users = store.list_users().await?;
        let tags = store.list_tags().await?;
        let categories = store.list_categories().await?;
        let articles = store.list_articles(&Default::default()).await?;
        let flows = store.list_flows().await?;

        let mut history = Vec::new();
        for article in &articles {
            history.extend(store.list_history(&article.id).await?);
        }

        Ok(StoreSnapshot {
            users,
            tags,
            categories,
            articles,
            flows,
            history,
        })
    }

    /// Writes every record into `store`. Referenced records are created
    /// before the records that point at them; the store is assumed empty.
    pub async fn apply(&self, store: &dyn KnowledgeStore) -> StoreResult<()> {
        for user in &self.users {
            store.store_user(user).await?;
        }
        for tag in &self.tags {
            store.upsert_tag(tag).await?;
        }
        for category in &self.categories {
            store.store_category(category).await?;
        }
        for article in &self.articles {
            store.store_article(article).await?;
        }
        for flow in &self.flows {
            store.store_flow(flow).await?;
        }
        for entry in &self.history {
            store.store_history(entry).await?;
        }
        Ok(())
    }

    pub fn record_count(&self) -> usize {
        self.users.len()
            + self.tags.len()
            + self.categories.len()
            + self.articles.len()
            + self.flows.len()
            + self.history.len()
    }
}
