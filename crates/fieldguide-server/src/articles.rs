//! Article operations: authoring, visibility, history, and restore.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use fieldguide_store::{Article, ArticleFilter, ArticleKind, ArticleStatus, HistoryEntry};

use crate::api::articles::{
    ArticleResponse, AuthorRef, CreateArticleRequest, HistoryResponse, UpdateArticleRequest,
};
use crate::api::auth::AuthUser;
use crate::api::metadata::CategoryResponse;
use crate::error::{ServerError, ServerResult};
use crate::markdown;
use crate::server::KnowledgeServer;
use crate::workflow;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static HYPHEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());

/// Turns a title into a URL slug: lowercased, punctuation dropped, spaces
/// hyphenated, hyphen runs collapsed.
pub(crate) fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let cleaned = NON_WORD.replace_all(&lowered, "");
    let hyphenated = WHITESPACE.replace_all(&cleaned, "-");
    let collapsed = HYPHEN_RUNS.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Admins may touch any article, writers only their own.
pub(crate) fn ensure_author_or_admin(article: &Article, user: &AuthUser) -> ServerResult<()> {
    if user.role.is_admin() || article.author_id == user.id {
        Ok(())
    } else {
        Err(ServerError::Forbidden("Forbidden".to_string()))
    }
}

/// The article fields captured into a history record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSnapshot {
    pub title: String,
    pub content_markdown: String,
    pub content_text: String,
    pub status: ArticleStatus,
    #[serde(rename = "type")]
    pub kind: ArticleKind,
    pub category_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ArticleSnapshot {
    fn of(article: &Article) -> Self {
        ArticleSnapshot {
            title: article.title.clone(),
            content_markdown: article.content_markdown.clone(),
            content_text: article.content_text.clone(),
            status: article.status,
            kind: article.kind,
            category_id: article.category_id.clone(),
            tags: article.tags.clone(),
        }
    }

    /// Placeholder shown when a stored history payload no longer parses.
    pub(crate) fn fallback() -> Self {
        ArticleSnapshot {
            title: "Unknown".to_string(),
            content_markdown: String::new(),
            content_text: String::new(),
            status: ArticleStatus::Draft,
            kind: ArticleKind::Faq,
            category_id: None,
            tags: Vec::new(),
        }
    }
}

impl KnowledgeServer {
    /// Creates a new article in DRAFT for `author_id`.
    pub async fn create_article(
        &self,
        req: CreateArticleRequest,
        author_id: &str,
    ) -> ServerResult<ArticleResponse> {
        validate_title(&req.title)?;
        validate_content(&req.content_markdown)?;
        if let Some(category_id) = &req.category_id {
            self.ensure_category_exists(category_id).await?;
        }

        let slug = self.generate_slug(&req.title, None).await?;
        let content_text = markdown::strip_markdown(&req.content_markdown);
        let tags = self
            .normalize_and_record_tags(req.tags.unwrap_or_default())
            .await?;

        let now = Utc::now();
        let article = Article {
            id: Uuid::new_v4().to_string(),
            title: req.title,
            slug,
            content_markdown: req.content_markdown,
            content_text,
            kind: req.kind.unwrap_or(ArticleKind::Faq),
            status: ArticleStatus::Draft,
            author_id: author_id.to_string(),
            category_id: req.category_id,
            tags,
            view_count: 0,
            created_at: now,
            updated_at: now,
        };

        self.store.store_article(&article).await?;
        info!(article_id = %article.id, slug = %article.slug, "Created article");
        self.article_view(article).await
    }

    /// Fetches an article, enforcing draft visibility: non-published
    /// articles are only shown to their author or an admin.
    pub async fn get_article(
        &self,
        article_id: &str,
        viewer: Option<&AuthUser>,
    ) -> ServerResult<ArticleResponse> {
        let article = self.require_article(article_id).await?;

        if article.status != ArticleStatus::Published {
            match viewer {
                None => return Err(ServerError::Unauthorized("Unauthorized".to_string())),
                Some(user) if !user.role.is_admin() && article.author_id != user.id => {
                    return Err(ServerError::Forbidden("Forbidden".to_string()))
                }
                Some(_) => {}
            }
        }

        self.article_view(article).await
    }

    /// Lists articles matching `filter`, newest first.
    pub async fn list_articles(&self, filter: &ArticleFilter) -> ServerResult<Vec<ArticleResponse>> {
        let mut articles = self.store.list_articles(filter).await?;
        articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut views = Vec::with_capacity(articles.len());
        for article in articles {
            views.push(self.article_view(article).await?);
        }
        Ok(views)
    }

    /// Applies a partial update. The previous state is snapshotted to
    /// history first; the slug is regenerated only when the title changes,
    /// and a supplied status must be a legal workflow transition.
    pub async fn update_article(
        &self,
        article_id: &str,
        req: UpdateArticleRequest,
        user: &AuthUser,
    ) -> ServerResult<ArticleResponse> {
        let mut article = self.require_article(article_id).await?;
        ensure_author_or_admin(&article, user)?;

        if let Some(title) = &req.title {
            validate_title(title)?;
        }
        if let Some(content) = &req.content_markdown {
            validate_content(content)?;
        }
        if let Some(category_id) = &req.category_id {
            self.ensure_category_exists(category_id).await?;
        }
        if let Some(status) = req.status {
            if status != article.status && !workflow::can_transition(article.status, status, user.role)
            {
                return Err(ServerError::Forbidden(
                    "Forbidden: Invalid status transition".to_string(),
                ));
            }
        }

        self.snapshot_article(&article, &user.id).await?;

        if let Some(title) = req.title {
            if title != article.title {
                article.slug = self.generate_slug(&title, Some(&article.id)).await?;
            }
            article.title = title;
        }
        if let Some(content) = req.content_markdown {
            article.content_text = markdown::strip_markdown(&content);
            article.content_markdown = content;
        }
        if let Some(kind) = req.kind {
            article.kind = kind;
        }
        if let Some(category_id) = req.category_id {
            article.category_id = Some(category_id);
        }
        if let Some(status) = req.status {
            article.status = status;
        }
        if let Some(tags) = req.tags {
            article.tags = self.normalize_and_record_tags(tags).await?;
        }
        article.updated_at = Utc::now();

        self.store.update_article(&article).await?;
        self.sync_article(&article).await;
        info!(article_id = %article.id, "Updated article");
        self.article_view(article).await
    }

    /// Deletes an article along with its history, and drops it from the
    /// search index.
    pub async fn delete_article(&self, article_id: &str, user: &AuthUser) -> ServerResult<()> {
        let article = self.require_article(article_id).await?;
        ensure_author_or_admin(&article, user)?;

        self.store.delete_article(article_id).await?;
        self.remove_from_index(article_id).await;
        info!(%article_id, "Deleted article");
        Ok(())
    }

    /// Lists history records for an article, newest first. Payloads that no
    /// longer parse are shown as a placeholder snapshot rather than hidden.
    pub async fn article_history(
        &self,
        article_id: &str,
        user: &AuthUser,
    ) -> ServerResult<Vec<HistoryResponse>> {
        let article = self.require_article(article_id).await?;
        ensure_author_or_admin(&article, user)?;

        let mut entries = self.store.list_history(article_id).await?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut responses = Vec::with_capacity(entries.len());
        for entry in entries {
            let changed_by = self
                .store
                .get_user(&entry.changed_by)
                .await?
                .map(|user| AuthorRef {
                    id: user.id,
                    email: user.email,
                    role: user.role,
                });
            let old_content = serde_json::from_value(entry.old_content.clone())
                .unwrap_or_else(|_| ArticleSnapshot::fallback());

            responses.push(HistoryResponse {
                id: entry.id,
                article_id: entry.article_id,
                changed_by,
                old_content,
                created_at: entry.created_at,
            });
        }
        Ok(responses)
    }

    /// Restores an article to the state captured in `history_id`. The
    /// current state is snapshotted first, so a restore can itself be
    /// undone.
    pub async fn restore_article(
        &self,
        article_id: &str,
        history_id: &str,
        user: &AuthUser,
    ) -> ServerResult<ArticleResponse> {
        let entry = self
            .store
            .get_history(history_id)
            .await?
            .filter(|entry| entry.article_id == article_id)
            .ok_or_else(|| ServerError::NotFound("History record".to_string()))?;

        let mut article = self.require_article(article_id).await?;
        ensure_author_or_admin(&article, user)?;

        let snapshot: ArticleSnapshot =
            serde_json::from_value(entry.old_content.clone()).map_err(|err| {
                ServerError::InternalError(format!(
                    "History record {} is corrupted: {}",
                    history_id, err
                ))
            })?;

        self.snapshot_article(&article, &user.id).await?;

        if snapshot.title != article.title {
            article.slug = self.generate_slug(&snapshot.title, Some(&article.id)).await?;
        }
        article.title = snapshot.title;
        article.content_markdown = snapshot.content_markdown;
        article.content_text = snapshot.content_text;
        article.status = snapshot.status;
        article.kind = snapshot.kind;
        article.category_id = snapshot.category_id;
        article.tags = self.normalize_and_record_tags(snapshot.tags).await?;
        article.updated_at = Utc::now();

        self.store.update_article(&article).await?;
        self.sync_article(&article).await;
        info!(article_id = %article.id, %history_id, "Restored article from history");
        self.article_view(article).await
    }

    pub(crate) async fn require_article(&self, article_id: &str) -> ServerResult<Article> {
        self.store
            .get_article(article_id)
            .await?
            .ok_or_else(|| ServerError::NotFound("Article".to_string()))
    }

    /// Builds the API projection: embeds the author (sans password hash)
    /// and the resolved category.
    pub(crate) async fn article_view(&self, article: Article) -> ServerResult<ArticleResponse> {
        let author = self
            .store
            .get_user(&article.author_id)
            .await?
            .map(|user| AuthorRef {
                id: user.id,
                email: user.email,
                role: user.role,
            });

        let category = match &article.category_id {
            Some(category_id) => self
                .store
                .get_category(category_id)
                .await?
                .map(CategoryResponse::from),
            None => None,
        };

        Ok(ArticleResponse {
            id: article.id,
            title: article.title,
            slug: article.slug,
            content_markdown: article.content_markdown,
            content_text: article.content_text,
            kind: article.kind,
            status: article.status,
            author_id: article.author_id,
            author,
            category_id: article.category_id,
            category,
            tags: article.tags,
            view_count: article.view_count,
            created_at: article.created_at,
            updated_at: article.updated_at,
        })
    }

    /// Writes the article's current state to history.
    pub(crate) async fn snapshot_article(
        &self,
        article: &Article,
        changed_by: &str,
    ) -> ServerResult<()> {
        let entry = HistoryEntry {
            id: Uuid::new_v4().to_string(),
            article_id: article.id.clone(),
            changed_by: changed_by.to_string(),
            old_content: serde_json::to_value(ArticleSnapshot::of(article))?,
            created_at: Utc::now(),
        };
        self.store.store_history(&entry).await?;
        Ok(())
    }

    /// Returns a slug unique across articles, appending `-1`, `-2`, ... on
    /// collision. `exclude_article_id` lets an article keep its own slug.
    async fn generate_slug(
        &self,
        title: &str,
        exclude_article_id: Option<&str>,
    ) -> ServerResult<String> {
        let base = slugify(title);
        let base = if base.is_empty() {
            "untitled".to_string()
        } else {
            base
        };

        let mut candidate = base.clone();
        let mut counter = 1;
        loop {
            match self.store.get_article_by_slug(&candidate).await? {
                None => return Ok(candidate),
                Some(existing) if exclude_article_id == Some(existing.id.as_str()) => {
                    return Ok(candidate)
                }
                Some(_) => {
                    candidate = format!("{}-{}", base, counter);
                    counter += 1;
                }
            }
        }
    }

    async fn ensure_category_exists(&self, category_id: &str) -> ServerResult<()> {
        if self.store.get_category(category_id).await?.is_none() {
            return Err(ServerError::ValidationError(
                "Category does not exist".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> ServerResult<()> {
    if title.chars().count() < 10 {
        return Err(ServerError::ValidationError(
            "Title must be at least 10 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_content(content: &str) -> ServerResult<()> {
    if content.chars().count() < 50 {
        return Err(ServerError::ValidationError(
            "Content must be at least 50 characters".to_string(),
        ));
    }
    Ok(())
}
