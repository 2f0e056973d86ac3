//! View tracking and aggregate statistics.

use fieldguide_store::{ArticleFilter, ArticleStatus, StoreError};

use crate::api::analytics::{AuthorBrief, CategoryBrief, GlobalStats, PopularEntry, ViewStats};
use crate::error::{ServerError, ServerResult};
use crate::server::KnowledgeServer;

impl KnowledgeServer {
    /// Counts one view against an article and returns the new total.
    pub async fn track_view(&self, article_id: &str) -> ServerResult<u64> {
        match self.store.increment_view_count(article_id).await {
            Ok(count) => Ok(count),
            Err(StoreError::NotFound(_)) => Err(ServerError::NotFound("Article".to_string())),
            Err(err) => Err(err.into()),
        }
    }

    /// The most-viewed PUBLISHED articles, most viewed first.
    pub async fn popular_articles(&self, limit: usize) -> ServerResult<Vec<PopularEntry>> {
        let filter = ArticleFilter {
            status: Some(ArticleStatus::Published),
            ..Default::default()
        };
        let mut articles = self.store.list_articles(&filter).await?;
        articles.sort_by(|a, b| b.view_count.cmp(&a.view_count));
        articles.truncate(limit);

        let mut entries = Vec::with_capacity(articles.len());
        for article in articles {
            let author = self
                .store
                .get_user(&article.author_id)
                .await?
                .map(|user| AuthorBrief { email: user.email });
            let category = match &article.category_id {
                Some(category_id) => {
                    self.store
                        .get_category(category_id)
                        .await?
                        .map(|category| CategoryBrief {
                            name: category.name,
                            slug: category.slug,
                        })
                }
                None => None,
            };

            entries.push(PopularEntry {
                id: article.id,
                title: article.title,
                slug: article.slug,
                view_count: article.view_count,
                kind: article.kind,
                category,
                author,
                updated_at: article.updated_at,
            });
        }
        Ok(entries)
    }

    /// Total views for one article.
    pub async fn view_stats(&self, article_id: &str) -> ServerResult<ViewStats> {
        let article = self.require_article(article_id).await?;
        Ok(ViewStats {
            total_views: article.view_count,
        })
    }

    /// Instance-wide counters.
    pub async fn global_stats(&self) -> ServerResult<GlobalStats> {
        let articles = self.store.count_articles().await?;
        let users = self.store.count_users().await?;
        let views = self.store.total_views().await?;
        Ok(GlobalStats {
            articles,
            users,
            views,
        })
    }
}
