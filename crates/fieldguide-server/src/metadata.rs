//! Tag and category taxonomy.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;
use uuid::Uuid;

use fieldguide_store::{ArticleFilter, Category, StoreError, Tag};

use crate::api::metadata::{CategoryResponse, TagResponse, TagWithCount};
use crate::error::{ServerError, ServerResult};
use crate::server::KnowledgeServer;

static KEBAB_CASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

/// Canonical tag form: lowercased with all whitespace removed, so
/// "Slow WiFi" and "slowwifi" are the same tag.
pub(crate) fn normalize_tag_name(name: &str) -> String {
    name.to_lowercase().split_whitespace().collect()
}

impl KnowledgeServer {
    /// Upserts a tag under its normalized name.
    pub async fn create_tag(&self, name: &str) -> ServerResult<TagResponse> {
        let normalized = normalize_tag_name(name);
        if normalized.is_empty() {
            return Err(ServerError::ValidationError(
                "Tag name is required".to_string(),
            ));
        }

        let tag = Tag {
            name: normalized,
            created_at: Utc::now(),
        };
        // Upsert keeps the stored created_at when the tag exists; report
        // whichever record is now in the store.
        self.store.upsert_tag(&tag).await?;
        let stored = self
            .store
            .list_tags()
            .await?
            .into_iter()
            .find(|existing| existing.name == tag.name)
            .unwrap_or(tag);

        info!(tag = %stored.name, "Upserted tag");
        Ok(TagResponse::from(&stored))
    }

    /// Lists tags with the number of articles carrying each one.
    pub async fn list_tags(&self) -> ServerResult<Vec<TagWithCount>> {
        let tags = self.store.list_tags().await?;
        let articles = self.store.list_articles(&ArticleFilter::default()).await?;

        let mut counts: HashMap<&str, u64> = HashMap::new();
        for article in &articles {
            for name in &article.tags {
                *counts.entry(name.as_str()).or_default() += 1;
            }
        }

        Ok(tags
            .iter()
            .map(|tag| TagWithCount {
                name: tag.name.clone(),
                created_at: tag.created_at,
                count: counts.get(tag.name.as_str()).copied().unwrap_or(0),
            })
            .collect())
    }

    /// Creates a category. The slug must already be kebab-case; it is not
    /// derived from the name.
    pub async fn create_category(&self, name: &str, slug: &str) -> ServerResult<CategoryResponse> {
        if name.trim().is_empty() {
            return Err(ServerError::ValidationError(
                "Category name is required".to_string(),
            ));
        }
        if !KEBAB_CASE.is_match(slug) {
            return Err(ServerError::ValidationError(
                "Invalid slug format: must be kebab-case".to_string(),
            ));
        }

        let taken = self
            .store
            .list_categories()
            .await?
            .iter()
            .any(|existing| existing.name == name || existing.slug == slug);
        if taken {
            return Err(ServerError::Conflict("Category already exists".to_string()));
        }

        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            slug: slug.to_string(),
            created_at: Utc::now(),
        };

        self.store
            .store_category(&category)
            .await
            .map_err(|err| match err {
                StoreError::Conflict(_) => {
                    ServerError::Conflict("Category already exists".to_string())
                }
                other => other.into(),
            })?;

        info!(category_id = %category.id, slug = %category.slug, "Created category");
        Ok(CategoryResponse::from(category))
    }

    pub async fn list_categories(&self) -> ServerResult<Vec<CategoryResponse>> {
        let mut categories = self.store.list_categories().await?;
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories.into_iter().map(CategoryResponse::from).collect())
    }

    /// Normalizes, dedupes, and records a tag list, returning the
    /// canonical names in their original order.
    pub(crate) async fn normalize_and_record_tags(
        &self,
        raw: Vec<String>,
    ) -> ServerResult<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        for raw_name in raw {
            let normalized = normalize_tag_name(&raw_name);
            if !normalized.is_empty() && !names.contains(&normalized) {
                names.push(normalized);
            }
        }
        if names.is_empty() {
            return Ok(names);
        }

        let known: HashSet<String> = self
            .store
            .list_tags()
            .await?
            .into_iter()
            .map(|tag| tag.name)
            .collect();

        for name in &names {
            if !known.contains(name) {
                let tag = Tag {
                    name: name.clone(),
                    created_at: Utc::now(),
                };
                self.store.upsert_tag(&tag).await?;
            }
        }
        Ok(names)
    }
}
