//! Record types persisted by the knowledge store.
//!
//! These are the storage shapes, serialized as-is by the file backend and
//! the snapshot tooling. API-facing projections (which, for example, never
//! expose password hashes) live in the server crate.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Writer,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Writer => "WRITER",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "WRITER" => Ok(Role::Writer),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Publication state of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ArticleStatus {
    Draft,
    Review,
    Published,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "DRAFT",
            ArticleStatus::Review => "REVIEW",
            ArticleStatus::Published => "PUBLISHED",
        }
    }
}

impl FromStr for ArticleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(ArticleStatus::Draft),
            "REVIEW" => Ok(ArticleStatus::Review),
            "PUBLISHED" => Ok(ArticleStatus::Published),
            other => Err(format!("Unknown article status: {}", other)),
        }
    }
}

/// Editorial kind of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ArticleKind {
    Faq,
    Troubleshooting,
}

impl ArticleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleKind::Faq => "FAQ",
            ArticleKind::Troubleshooting => "TROUBLESHOOTING",
        }
    }
}

impl FromStr for ArticleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FAQ" => Ok(ArticleKind::Faq),
            "TROUBLESHOOTING" => Ok(ArticleKind::Troubleshooting),
            other => Err(format!("Unknown article type: {}", other)),
        }
    }
}

/// A user account. `password_hash` is an argon2 PHC string and must never
/// leave the service boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A knowledge-base article (Q&A page).
///
/// `content_text` is the markdown-stripped twin of `content_markdown`,
/// maintained on every write so the search index never re-derives it.
/// `tags` holds normalized tag names; the tag registry is upserted
/// alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content_markdown: String,
    pub content_text: String,
    pub kind: ArticleKind,
    pub status: ArticleStatus,
    pub author_id: String,
    pub category_id: Option<String>,
    pub tags: Vec<String>,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A registry entry for a normalized tag name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// An article category with a URL-safe slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// A stored diagnosis flow.
///
/// `nodes` and `edges` hold serialized JSON text; the flow crate's codec
/// is the only place that reads or writes that shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_node_id: String,
    pub nodes: String,
    pub edges: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A point-in-time snapshot of an article taken before a change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub article_id: String,
    pub changed_by: String,
    /// JSON snapshot of the editable fields as they were before the change.
    pub old_content: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Filter for article listings. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleFilter {
    pub status: Option<ArticleStatus>,
    pub kind: Option<ArticleKind>,
    pub author_id: Option<String>,
}

impl ArticleFilter {
    pub fn matches(&self, article: &Article) -> bool {
        if let Some(status) = self.status {
            if article.status != status {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if article.kind != kind {
                return false;
            }
        }
        if let Some(author_id) = &self.author_id {
            if &article.author_id != author_id {
                return false;
            }
        }
        true
    }
}
