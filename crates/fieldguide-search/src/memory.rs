//! In-memory implementation of SearchIndex
//!
//! This implementation is primarily intended for testing and development
//! purposes. Matching is plain case-insensitive substring search; there is
//! no relevance ranking, results come back newest first.

use crate::{SearchDocument, SearchIndex, SearchPage, SearchQuery, SearchResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of SearchIndex
///
/// Documents live in a shared map; clones of the index share the same
/// state. All data is lost when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIndex {
    documents: Arc<RwLock<HashMap<String, SearchDocument>>>,
}

impl InMemoryIndex {
    /// Create a new empty in-memory index
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(document: &SearchDocument, query: &SearchQuery) -> bool {
        if !query.kinds.is_empty() && !query.kinds.contains(&document.kind) {
            return false;
        }
        if !query.statuses.is_empty() && !query.statuses.contains(&document.status) {
            return false;
        }
        if !query.tags.is_empty()
            && !query.tags.iter().any(|tag| document.tags.contains(tag))
        {
            return false;
        }
        if let Some(category_id) = &query.category_id {
            if document.category_id.as_ref() != Some(category_id) {
                return false;
            }
        }

        if query.text.is_empty() {
            return true;
        }
        let needle = query.text.to_lowercase();
        document.title.to_lowercase().contains(&needle)
            || document.content_text.to_lowercase().contains(&needle)
            || document
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
    }
}

#[async_trait]
impl SearchIndex for InMemoryIndex {
    async fn ensure_index(&self) -> SearchResult<()> {
        // Nothing to configure
        Ok(())
    }

    async fn index_document(&self, document: &SearchDocument) -> SearchResult<()> {
        let mut documents = self.documents.write().await;
        documents.insert(document.id.clone(), document.clone());
        Ok(())
    }

    async fn remove_document(&self, document_id: &str) -> SearchResult<()> {
        let mut documents = self.documents.write().await;
        documents.remove(document_id);
        Ok(())
    }

    async fn clear_documents(&self) -> SearchResult<()> {
        let mut documents = self.documents.write().await;
        documents.clear();
        Ok(())
    }

    async fn search(&self, query: &SearchQuery) -> SearchResult<SearchPage> {
        let documents = self.documents.read().await;
        let mut matching: Vec<SearchDocument> = documents
            .values()
            .filter(|document| Self::matches(document, query))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let hits: Vec<SearchDocument> = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect();

        Ok(SearchPage {
            hits,
            estimated_total_hits: total,
            processing_time_ms: 0,
        })
    }

    async fn health_check(&self) -> SearchResult<bool> {
        Ok(true)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldguide_store::{ArticleKind, ArticleStatus};

    fn sample_document(id: &str, title: &str, status: ArticleStatus) -> SearchDocument {
        SearchDocument {
            id: id.to_string(),
            slug: format!("slug-{}", id),
            title: title.to_string(),
            content_text: format!("Body of {}", title),
            kind: ArticleKind::Faq,
            status,
            category_id: None,
            category: None,
            tags: vec![],
            created_at: 1_700_000_000_000,
            view_count: 0,
        }
    }

    #[tokio::test]
    async fn test_index_search_and_remove() {
        let index = InMemoryIndex::new();
        index
            .index_document(&sample_document(
                "a1",
                "Printer offline",
                ArticleStatus::Published,
            ))
            .await
            .unwrap();

        let page = index.search(&SearchQuery::new("printer")).await.unwrap();
        assert_eq!(page.hits.len(), 1);
        assert_eq!(page.estimated_total_hits, 1);

        // Case-insensitive
        let page = index.search(&SearchQuery::new("PRINTER")).await.unwrap();
        assert_eq!(page.hits.len(), 1);

        index.remove_document("a1").await.unwrap();
        let page = index.search(&SearchQuery::new("printer")).await.unwrap();
        assert!(page.hits.is_empty());

        // Removing again is fine
        index.remove_document("a1").await.unwrap();
    }

    #[tokio::test]
    async fn test_status_filter() {
        let index = InMemoryIndex::new();
        index
            .index_document(&sample_document("a1", "Draft thing", ArticleStatus::Draft))
            .await
            .unwrap();
        index
            .index_document(&sample_document(
                "a2",
                "Published thing",
                ArticleStatus::Published,
            ))
            .await
            .unwrap();

        let mut query = SearchQuery::new("thing");
        query.statuses = vec![ArticleStatus::Published];

        let page = index.search(&query).await.unwrap();
        assert_eq!(page.hits.len(), 1);
        assert_eq!(page.hits[0].id, "a2");
    }

    #[tokio::test]
    async fn test_tag_filter_is_any_match() {
        let index = InMemoryIndex::new();
        let mut tagged = sample_document("a1", "Tagged", ArticleStatus::Published);
        tagged.tags = vec!["printer".to_string()];
        index.index_document(&tagged).await.unwrap();

        let mut query = SearchQuery::new("");
        query.tags = vec!["office".to_string(), "printer".to_string()];
        assert_eq!(index.search(&query).await.unwrap().hits.len(), 1);

        query.tags = vec!["office".to_string()];
        assert!(index.search(&query).await.unwrap().hits.is_empty());
    }

    #[tokio::test]
    async fn test_pagination() {
        let index = InMemoryIndex::new();
        for i in 0..5 {
            let mut document =
                sample_document(&format!("a{}", i), "Same title", ArticleStatus::Published);
            document.created_at = 1_700_000_000_000 + i;
            index.index_document(&document).await.unwrap();
        }

        let mut query = SearchQuery::new("same");
        query.limit = 2;
        query.page = 2;

        let page = index.search(&query).await.unwrap();
        assert_eq!(page.estimated_total_hits, 5);
        assert_eq!(page.hits.len(), 2);
        // Newest first, so page 2 holds the third and fourth newest
        assert_eq!(page.hits[0].id, "a2");
        assert_eq!(page.hits[1].id, "a1");
    }

    #[tokio::test]
    async fn test_clear_documents() {
        let index = InMemoryIndex::new();
        index
            .index_document(&sample_document("a1", "One", ArticleStatus::Published))
            .await
            .unwrap();
        index
            .index_document(&sample_document("a2", "Two", ArticleStatus::Published))
            .await
            .unwrap();

        index.clear_documents().await.unwrap();
        let page = index.search(&SearchQuery::new("")).await.unwrap();
        assert!(page.hits.is_empty());
    }
}
