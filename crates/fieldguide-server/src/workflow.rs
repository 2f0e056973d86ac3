//! Article status workflow.

use chrono::Utc;
use tracing::info;

use fieldguide_store::{ArticleStatus, Role};

use crate::api::articles::ArticleResponse;
use crate::api::auth::AuthUser;
use crate::articles::ensure_author_or_admin;
use crate::error::{ServerError, ServerResult};
use crate::server::KnowledgeServer;

/// Transition matrix. Admins may make any transition, writers may only
/// submit their drafts for review, and a no-op transition is always
/// allowed.
pub fn can_transition(current: ArticleStatus, new: ArticleStatus, role: Role) -> bool {
    if current == new {
        return true;
    }
    if role.is_admin() {
        return true;
    }
    matches!(
        (current, new),
        (ArticleStatus::Draft, ArticleStatus::Review)
    )
}

impl KnowledgeServer {
    /// Moves an article to `new_status` and synchronizes the search index:
    /// publishing indexes the article, every other target state removes it.
    pub async fn transition_article(
        &self,
        article_id: &str,
        new_status: ArticleStatus,
        user: &AuthUser,
    ) -> ServerResult<ArticleResponse> {
        let mut article = self.require_article(article_id).await?;
        ensure_author_or_admin(&article, user)?;

        if !can_transition(article.status, new_status, user.role) {
            return Err(ServerError::Forbidden(
                "Forbidden: Invalid status transition".to_string(),
            ));
        }

        let previous = article.status;
        article.status = new_status;
        article.updated_at = Utc::now();

        self.store.update_article(&article).await?;
        self.sync_article(&article).await;

        info!(
            article_id = %article.id,
            from = previous.as_str(),
            to = new_status.as_str(),
            "Transitioned article status"
        );
        self.article_view(article).await
    }
}
