//! Search index synchronization and the public search operation.

use tracing::warn;

use fieldguide_search::{CategoryRef, SearchDocument, SearchQuery};
use fieldguide_store::{Article, ArticleKind, ArticleStatus};

use crate::api::search::{SearchHit, SearchParams, SearchResponse};
use crate::error::{ServerError, ServerResult};
use crate::server::KnowledgeServer;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MIN_PAGE_SIZE: u32 = 5;
const MAX_PAGE_SIZE: u32 = 100;

impl KnowledgeServer {
    /// Runs a public full-text search. Only PUBLISHED articles are
    /// searchable regardless of what the index happens to contain.
    pub async fn search_articles(&self, params: &SearchParams) -> ServerResult<SearchResponse> {
        let text = params.q.as_deref().map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return Err(ServerError::ValidationError(
                "Query parameter 'q' is required".to_string(),
            ));
        }

        let page = params
            .page
            .as_deref()
            .and_then(|value| value.parse::<u32>().ok())
            .map(|value| value.max(1))
            .unwrap_or(1);
        let limit = params
            .limit
            .as_deref()
            .and_then(|value| value.parse::<u32>().ok())
            .map(|value| value.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let mut kinds = Vec::new();
        for raw in csv_values(params.kind.as_deref()) {
            let kind = raw.parse::<ArticleKind>().map_err(|_| {
                ServerError::ValidationError("Invalid type filter".to_string())
            })?;
            kinds.push(kind);
        }

        let mut query = SearchQuery::new(text);
        query.kinds = kinds;
        query.statuses = vec![ArticleStatus::Published];
        query.tags = csv_values(params.tags.as_deref());
        query.category_id = params.category_id.clone().filter(|id| !id.is_empty());
        query.page = page;
        query.limit = limit;

        let result = self.search.search(&query).await?;
        let total = result.estimated_total_hits;

        let hits = result
            .hits
            .into_iter()
            .map(|doc| {
                let created_at = doc.created_at_utc();
                SearchHit {
                    id: doc.id,
                    slug: doc.slug,
                    title: doc.title,
                    snippet: doc.content_text.chars().take(200).collect(),
                    kind: doc.kind,
                    tags: doc.tags,
                    category: doc.category.unwrap_or_else(|| CategoryRef {
                        name: "Unknown".to_string(),
                        slug: "unknown".to_string(),
                    }),
                    created_at,
                }
            })
            .collect();

        Ok(SearchResponse {
            hits,
            query: text.to_string(),
            total,
            page,
            total_pages: total.div_ceil(limit as u64),
            processing_time: result.processing_time_ms,
        })
    }

    /// Brings the index document for `article` in line with its status:
    /// PUBLISHED articles are (re)indexed, everything else is removed.
    /// Failures are logged, never propagated; the store stays the source
    /// of truth and a reindex can catch the index up.
    pub(crate) async fn sync_article(&self, article: &Article) {
        let result = if article.status == ArticleStatus::Published {
            let category = match &article.category_id {
                Some(category_id) => match self.store.get_category(category_id).await {
                    Ok(category) => category,
                    Err(err) => {
                        warn!(
                            article_id = %article.id,
                            ?err,
                            "Failed to resolve category while indexing"
                        );
                        None
                    }
                },
                None => None,
            };
            let document = SearchDocument::from_article(article, category.as_ref());
            self.search.index_document(&document).await
        } else {
            self.search.remove_document(&article.id).await
        };

        if let Err(err) = result {
            warn!(article_id = %article.id, ?err, "Failed to synchronize search index");
        }
    }

    /// Best-effort removal, used when an article is deleted outright.
    pub(crate) async fn remove_from_index(&self, article_id: &str) {
        if let Err(err) = self.search.remove_document(article_id).await {
            warn!(%article_id, ?err, "Failed to remove article from search index");
        }
    }

    /// Creates the index and pushes settings at startup. A failure is
    /// logged and startup continues; searches will surface backend errors
    /// until the index comes up.
    pub(crate) async fn bootstrap_search_index(&self) {
        if let Err(err) = self.search.ensure_index().await {
            warn!(?err, "Search index bootstrap failed, continuing without it");
        }
    }
}

fn csv_values(raw: Option<&str>) -> Vec<String> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
