//! Rebuilds the search index from the store.
//!
//! Clears the index, then re-indexes every PUBLISHED article. Drafts and
//! articles in review are never indexed.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use fieldguide_search::{SearchDocument, SearchIndex};
use fieldguide_server::{create_search_index, create_store, ServerConfig};
use fieldguide_store::{ArticleFilter, ArticleStatus, KnowledgeStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::load().context("Failed to load configuration")?;
    let store = create_store(&config).context("Failed to open store")?;
    let search = create_search_index(&config).context("Failed to open search index")?;

    search
        .ensure_index()
        .await
        .context("Failed to prepare index")?;
    search
        .clear_documents()
        .await
        .context("Failed to clear index")?;

    let articles = store.list_articles(&ArticleFilter::default()).await?;
    let total = articles.len();
    let mut indexed = 0usize;

    for article in articles {
        if article.status != ArticleStatus::Published {
            continue;
        }
        let category = match &article.category_id {
            Some(category_id) => store.get_category(category_id).await?,
            None => None,
        };
        let document = SearchDocument::from_article(&article, category.as_ref());
        search
            .index_document(&document)
            .await
            .with_context(|| format!("Failed to index article {}", article.id))?;
        indexed += 1;
    }

    println!("Indexed {} of {} articles", indexed, total);
    Ok(())
}
