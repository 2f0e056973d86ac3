//! Integration tests for the server's domain operations, run against the
//! in-memory store and index.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use pretty_assertions::assert_eq;

use fieldguide_flow::{FlowEdge, FlowNode, NodeKind};
use fieldguide_search::{
    InMemoryIndex, SearchDocument, SearchError, SearchIndex, SearchPage, SearchQuery, SearchResult,
};
use fieldguide_store::{
    ArticleFilter, ArticleStatus, FlowRecord, KnowledgeStore, MemoryStore, Role,
};

use fieldguide_server::api::articles::{CreateArticleRequest, UpdateArticleRequest};
use fieldguide_server::api::auth::AuthUser;
use fieldguide_server::api::flows::{CreateFlowRequest, UpdateFlowRequest};
use fieldguide_server::api::search::SearchParams;
use fieldguide_server::{AuthService, KnowledgeServer, ServerConfig, ServerError};

fn test_config(uploads_dir: &std::path::Path) -> ServerConfig {
    ServerConfig {
        store_url: "memory://".to_string(),
        search_url: "memory://".to_string(),
        jwt_secret: "integration-test-secret-0123456789abcdef".to_string(),
        uploads_dir: uploads_dir.to_string_lossy().into_owned(),
        ..ServerConfig::default()
    }
}

struct TestHarness {
    server: KnowledgeServer,
    store: Arc<MemoryStore>,
    index: InMemoryIndex,
    _uploads: tempfile::TempDir,
}

fn harness() -> TestHarness {
    let uploads = tempfile::tempdir().unwrap();
    let config = test_config(uploads.path());
    let store = Arc::new(MemoryStore::new());
    let index = InMemoryIndex::new();
    let auth = AuthService::new(config.jwt_secret.clone(), config.token_expiry_hours).unwrap();
    let server = KnowledgeServer::new(config, store.clone(), Arc::new(index.clone()), auth);
    TestHarness {
        server,
        store,
        index,
        _uploads: uploads,
    }
}

async fn writer(server: &KnowledgeServer, email: &str) -> AuthUser {
    let user = server
        .register_user(email, "password123", None)
        .await
        .unwrap();
    AuthUser {
        id: user.id,
        role: Role::Writer,
    }
}

async fn admin(server: &KnowledgeServer, email: &str) -> AuthUser {
    let user = server
        .register_user(email, "password123", Some("ADMIN"))
        .await
        .unwrap();
    AuthUser {
        id: user.id,
        role: Role::Admin,
    }
}

fn article_request(title: &str) -> CreateArticleRequest {
    CreateArticleRequest {
        title: title.to_string(),
        content_markdown:
            "A body that is comfortably longer than the fifty character minimum required."
                .to_string(),
        kind: None,
        category_id: None,
        tags: None,
    }
}

fn question(id: &str, content: &str) -> FlowNode {
    FlowNode {
        id: id.to_string(),
        kind: NodeKind::Question,
        content: content.to_string(),
        qa_page_id: None,
    }
}

fn solution(id: &str, content: &str, qa_page_id: Option<&str>) -> FlowNode {
    FlowNode {
        id: id.to_string(),
        kind: NodeKind::Solution,
        content: content.to_string(),
        qa_page_id: qa_page_id.map(str::to_string),
    }
}

fn edge(from: &str, to: &str, label: &str) -> FlowEdge {
    FlowEdge {
        from: from.to_string(),
        to: to.to_string(),
        label: label.to_string(),
    }
}

fn flow_request(title: &str) -> CreateFlowRequest {
    CreateFlowRequest {
        title: title.to_string(),
        description: None,
        start_node_id: "start".to_string(),
        nodes: vec![
            question("start", "Is the printer powered on?"),
            solution("fix", "Plug the power cable back in.", None),
        ],
        edges: vec![edge("start", "fix", "No")],
    }
}

// --- Users ---------------------------------------------------------------

#[tokio::test]
async fn register_and_login_round_trip() {
    let h = harness();
    let registered = h
        .server
        .register_user("alice@example.com", "password123", None)
        .await
        .unwrap();
    assert_eq!(registered.role, Role::Writer);

    let login = h
        .server
        .login("alice@example.com", "password123")
        .await
        .unwrap();
    assert_eq!(login.user.id, registered.id);
    assert!(!login.token.is_empty());

    let err = h
        .server
        .login("alice@example.com", "wrong-password")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials");
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let h = harness();
    h.server
        .register_user("alice@example.com", "password123", None)
        .await
        .unwrap();
    let err = h
        .server
        .register_user("alice@example.com", "other-password", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServerError::Conflict(_)));
    assert_eq!(err.to_string(), "User already exists");
}

#[tokio::test]
async fn register_validates_credentials() {
    let h = harness();

    let err = h.server.register_user("", "", None).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation error: Email and password are required"
    );

    let err = h
        .server
        .register_user("not-an-email", "password123", None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Validation error: Invalid email address");

    let err = h
        .server
        .register_user("bob@example.com", "short", None)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation error: Password must be at least 6 characters"
    );
}

#[tokio::test]
async fn register_honors_valid_requested_role() {
    let h = harness();
    let admin = h
        .server
        .register_user("root@example.com", "password123", Some("ADMIN"))
        .await
        .unwrap();
    assert_eq!(admin.role, Role::Admin);

    // Unknown role names fall back to WRITER instead of failing.
    let writer = h
        .server
        .register_user("other@example.com", "password123", Some("SUPERUSER"))
        .await
        .unwrap();
    assert_eq!(writer.role, Role::Writer);
}

#[tokio::test]
async fn update_user_changes_role_and_password() {
    let h = harness();
    let user = writer(&h.server, "carol@example.com").await;

    let updated = h
        .server
        .update_user(&user.id, Some(Role::Admin), Some("new-password"))
        .await
        .unwrap();
    assert_eq!(updated.role, Role::Admin);

    h.server
        .login("carol@example.com", "new-password")
        .await
        .unwrap();
    let err = h
        .server
        .login("carol@example.com", "password123")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials");
}

// --- Articles ------------------------------------------------------------

#[tokio::test]
async fn create_article_validates_title_and_content() {
    let h = harness();
    let user = writer(&h.server, "w@example.com").await;

    let mut req = article_request("short");
    let err = h.server.create_article(req, &user.id).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation error: Title must be at least 10 characters"
    );

    req = article_request("A perfectly valid title");
    req.content_markdown = "too short".to_string();
    let err = h.server.create_article(req, &user.id).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation error: Content must be at least 50 characters"
    );
}

#[tokio::test]
async fn create_article_generates_unique_slugs() {
    let h = harness();
    let user = writer(&h.server, "w@example.com").await;

    let first = h
        .server
        .create_article(article_request("Printer will not start"), &user.id)
        .await
        .unwrap();
    let second = h
        .server
        .create_article(article_request("Printer will not start"), &user.id)
        .await
        .unwrap();
    let third = h
        .server
        .create_article(article_request("Printer will not start"), &user.id)
        .await
        .unwrap();

    assert_eq!(first.slug, "printer-will-not-start");
    assert_eq!(second.slug, "printer-will-not-start-1");
    assert_eq!(third.slug, "printer-will-not-start-2");
}

#[tokio::test]
async fn create_article_rejects_unknown_category() {
    let h = harness();
    let user = writer(&h.server, "w@example.com").await;

    let mut req = article_request("A perfectly valid title");
    req.category_id = Some("missing-category".to_string());
    let err = h.server.create_article(req, &user.id).await.unwrap_err();
    assert_eq!(err.to_string(), "Validation error: Category does not exist");
}

#[tokio::test]
async fn draft_articles_are_hidden_from_other_viewers() {
    let h = harness();
    let author = writer(&h.server, "author@example.com").await;
    let other = writer(&h.server, "other@example.com").await;
    let boss = admin(&h.server, "admin@example.com").await;

    let article = h
        .server
        .create_article(article_request("A perfectly valid title"), &author.id)
        .await
        .unwrap();

    // Anonymous viewers get a 401, other writers a 403.
    let err = h.server.get_article(&article.id, None).await.unwrap_err();
    assert!(matches!(err, ServerError::Unauthorized(_)));
    let err = h
        .server
        .get_article(&article.id, Some(&other))
        .await
        .unwrap_err();
    assert!(matches!(err, ServerError::Forbidden(_)));

    // The author and admins can read the draft.
    h.server
        .get_article(&article.id, Some(&author))
        .await
        .unwrap();
    h.server
        .get_article(&article.id, Some(&boss))
        .await
        .unwrap();

    // Published articles are public.
    h.server
        .transition_article(&article.id, ArticleStatus::Published, &boss)
        .await
        .unwrap();
    h.server.get_article(&article.id, None).await.unwrap();
}

#[tokio::test]
async fn update_article_snapshots_previous_state() {
    let h = harness();
    let user = writer(&h.server, "w@example.com").await;

    let article = h
        .server
        .create_article(article_request("A perfectly valid title"), &user.id)
        .await
        .unwrap();

    let req = UpdateArticleRequest {
        title: Some("A different but still valid title".to_string()),
        ..UpdateArticleRequest::default()
    };
    let updated = h
        .server
        .update_article(&article.id, req, &user)
        .await
        .unwrap();

    // A title change re-derives the slug.
    assert_eq!(updated.slug, "a-different-but-still-valid-title");

    let history = h.server.article_history(&article.id, &user).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].old_content.title, "A perfectly valid title");
    assert_eq!(
        history[0].changed_by.as_ref().map(|u| u.id.as_str()),
        Some(user.id.as_str())
    );
}

#[tokio::test]
async fn update_article_enforces_transition_matrix() {
    let h = harness();
    let user = writer(&h.server, "w@example.com").await;

    let article = h
        .server
        .create_article(article_request("A perfectly valid title"), &user.id)
        .await
        .unwrap();

    // A writer cannot jump straight to PUBLISHED.
    let req = UpdateArticleRequest {
        status: Some(ArticleStatus::Published),
        ..UpdateArticleRequest::default()
    };
    let err = h
        .server
        .update_article(&article.id, req, &user)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Forbidden: Invalid status transition");

    // DRAFT -> REVIEW is the one transition writers may make.
    let req = UpdateArticleRequest {
        status: Some(ArticleStatus::Review),
        ..UpdateArticleRequest::default()
    };
    let updated = h
        .server
        .update_article(&article.id, req, &user)
        .await
        .unwrap();
    assert_eq!(updated.status, ArticleStatus::Review);
}

#[tokio::test]
async fn update_article_requires_author_or_admin() {
    let h = harness();
    let author = writer(&h.server, "author@example.com").await;
    let other = writer(&h.server, "other@example.com").await;

    let article = h
        .server
        .create_article(article_request("A perfectly valid title"), &author.id)
        .await
        .unwrap();

    let req = UpdateArticleRequest {
        title: Some("Hijacked by someone else entirely".to_string()),
        ..UpdateArticleRequest::default()
    };
    let err = h
        .server
        .update_article(&article.id, req, &other)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Forbidden");
}

#[tokio::test]
async fn publish_indexes_and_reject_removes() {
    let h = harness();
    let user = writer(&h.server, "w@example.com").await;
    let boss = admin(&h.server, "admin@example.com").await;

    let article = h
        .server
        .create_article(article_request("A perfectly valid title"), &user.id)
        .await
        .unwrap();

    // Drafts never reach the index.
    let page = h.index.search(&SearchQuery::new("")).await.unwrap();
    assert!(page.hits.is_empty());

    h.server
        .transition_article(&article.id, ArticleStatus::Published, &boss)
        .await
        .unwrap();
    let page = h.index.search(&SearchQuery::new("")).await.unwrap();
    assert_eq!(page.hits.len(), 1);
    assert_eq!(page.hits[0].id, article.id);

    h.server
        .transition_article(&article.id, ArticleStatus::Draft, &boss)
        .await
        .unwrap();
    let page = h.index.search(&SearchQuery::new("")).await.unwrap();
    assert!(page.hits.is_empty());
}

#[tokio::test]
async fn index_failure_does_not_fail_the_write() {
    let uploads = tempfile::tempdir().unwrap();
    let config = test_config(uploads.path());
    let auth = AuthService::new(config.jwt_secret.clone(), config.token_expiry_hours).unwrap();
    let server = KnowledgeServer::new(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(FailingIndex),
        auth,
    );

    let user = writer(&server, "w@example.com").await;
    let boss = admin(&server, "admin@example.com").await;
    let article = server
        .create_article(article_request("A perfectly valid title"), &user.id)
        .await
        .unwrap();

    // The store is the source of truth; a dead index only degrades search.
    let published = server
        .transition_article(&article.id, ArticleStatus::Published, &boss)
        .await
        .unwrap();
    assert_eq!(published.status, ArticleStatus::Published);
}

#[tokio::test]
async fn delete_article_cascades_history_and_index() {
    let h = harness();
    let user = writer(&h.server, "w@example.com").await;
    let boss = admin(&h.server, "admin@example.com").await;

    let article = h
        .server
        .create_article(article_request("A perfectly valid title"), &user.id)
        .await
        .unwrap();
    let req = UpdateArticleRequest {
        content_markdown: Some(
            "Replacement body text that is also longer than fifty characters in total.".to_string(),
        ),
        ..UpdateArticleRequest::default()
    };
    h.server
        .update_article(&article.id, req, &user)
        .await
        .unwrap();
    h.server
        .transition_article(&article.id, ArticleStatus::Published, &boss)
        .await
        .unwrap();

    h.server.delete_article(&article.id, &user).await.unwrap();

    let err = h.server.get_article(&article.id, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Article not found");
    assert!(h.store.list_history(&article.id).await.unwrap().is_empty());
    let page = h.index.search(&SearchQuery::new("")).await.unwrap();
    assert!(page.hits.is_empty());
}

#[tokio::test]
async fn restore_article_round_trip() {
    let h = harness();
    let user = writer(&h.server, "w@example.com").await;

    let article = h
        .server
        .create_article(article_request("A perfectly valid title"), &user.id)
        .await
        .unwrap();
    let req = UpdateArticleRequest {
        title: Some("A replacement title for the article".to_string()),
        ..UpdateArticleRequest::default()
    };
    h.server
        .update_article(&article.id, req, &user)
        .await
        .unwrap();

    let history = h.server.article_history(&article.id, &user).await.unwrap();
    assert_eq!(history.len(), 1);

    let restored = h
        .server
        .restore_article(&article.id, &history[0].id, &user)
        .await
        .unwrap();
    assert_eq!(restored.title, "A perfectly valid title");
    assert_eq!(restored.slug, "a-perfectly-valid-title");

    // The restore snapshotted the pre-restore state too.
    let history = h.server.article_history(&article.id, &user).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(
        history[0].old_content.title,
        "A replacement title for the article"
    );
}

#[tokio::test]
async fn restore_rejects_history_from_another_article() {
    let h = harness();
    let user = writer(&h.server, "w@example.com").await;

    let first = h
        .server
        .create_article(article_request("A perfectly valid title"), &user.id)
        .await
        .unwrap();
    let second = h
        .server
        .create_article(article_request("Another valid article title"), &user.id)
        .await
        .unwrap();
    let req = UpdateArticleRequest {
        title: Some("A replacement title for the article".to_string()),
        ..UpdateArticleRequest::default()
    };
    h.server.update_article(&first.id, req, &user).await.unwrap();
    let history = h.server.article_history(&first.id, &user).await.unwrap();

    let err = h
        .server
        .restore_article(&second.id, &history[0].id, &user)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "History record not found");
}

// --- Flows ---------------------------------------------------------------

#[tokio::test]
async fn create_flow_round_trip() {
    let h = harness();
    let created = h
        .server
        .create_flow(flow_request("Printer diagnosis"))
        .await
        .unwrap();
    assert_eq!(created.start_node_id, "start");
    assert_eq!(created.nodes.len(), 2);

    let fetched = h.server.get_flow(&created.id).await.unwrap();
    assert_eq!(fetched.title, "Printer diagnosis");
    assert_eq!(fetched.edges.len(), 1);
}

#[tokio::test]
async fn create_flow_validates_graph() {
    let h = harness();

    let mut req = flow_request("");
    let err = h.server.create_flow(req).await.unwrap_err();
    assert_eq!(err.to_string(), "Validation error: Title is required");

    // Duplicate node ids.
    req = flow_request("Broken flow");
    req.nodes.push(question("start", "Duplicate"));
    let err = h.server.create_flow(req).await.unwrap_err();
    assert_eq!(err.to_string(), "Validation error: Duplicate node id: start");

    // Edge to a node that does not exist.
    req = flow_request("Broken flow");
    req.edges.push(edge("start", "ghost", "Maybe"));
    let err = h.server.create_flow(req).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation error: Edge references missing node: start -> ghost"
    );

    // Unknown start node.
    req = flow_request("Broken flow");
    req.start_node_id = "ghost".to_string();
    let err = h.server.create_flow(req).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation error: Start node does not exist"
    );

    // No solution node.
    req = flow_request("Broken flow");
    req.nodes = vec![question("start", "Only a question")];
    req.edges = vec![];
    let err = h.server.create_flow(req).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation error: Flow must have at least one solution node"
    );

    // Cycle among questions.
    req = flow_request("Broken flow");
    req.nodes = vec![
        question("start", "First"),
        question("loop", "Second"),
        solution("fix", "Done", None),
    ];
    req.edges = vec![
        edge("start", "loop", "Next"),
        edge("loop", "start", "Back"),
        edge("loop", "fix", "Fixed"),
    ];
    let err = h.server.create_flow(req).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation error: Circular reference detected"
    );
}

#[tokio::test]
async fn update_flow_revalidates_partial_changes() {
    let h = harness();
    let created = h
        .server
        .create_flow(flow_request("Printer diagnosis"))
        .await
        .unwrap();

    // Replacing the nodes alone must stay consistent with the stored
    // edges; dropping the edge target is rejected.
    let req = UpdateFlowRequest {
        nodes: Some(vec![
            question("start", "Still the start"),
            solution("other", "A new solution", None),
        ]),
        ..UpdateFlowRequest::default()
    };
    let err = h.server.update_flow(&created.id, req).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation error: Edge references missing node: start -> fix"
    );

    // A consistent partial update goes through and keeps the old title.
    let req = UpdateFlowRequest {
        edges: Some(vec![edge("start", "fix", "Still no")]),
        ..UpdateFlowRequest::default()
    };
    let updated = h.server.update_flow(&created.id, req).await.unwrap();
    assert_eq!(updated.title, "Printer diagnosis");
    assert_eq!(updated.edges[0].label, "Still no");
}

#[tokio::test]
async fn resolve_flow_node_lists_options_and_solution() {
    let h = harness();
    let user = writer(&h.server, "w@example.com").await;
    let article = h
        .server
        .create_article(article_request("Reseat the power cable"), &user.id)
        .await
        .unwrap();

    let mut req = flow_request("Printer diagnosis");
    req.nodes = vec![
        question("start", "Is the printer powered on?"),
        solution("fix", "Plug it back in.", Some(&article.id)),
        solution("orphan", "Linked article is gone.", Some("missing")),
    ];
    req.edges = vec![edge("start", "fix", "No"), edge("start", "orphan", "Yes")];
    let flow = h.server.create_flow(req).await.unwrap();

    let step = h.server.resolve_flow_node(&flow.id, "start").await.unwrap();
    assert_eq!(step.options.len(), 2);
    assert!(step.solution.is_none());

    let step = h.server.resolve_flow_node(&flow.id, "fix").await.unwrap();
    assert!(step.options.is_empty());
    let solution = step.solution.unwrap();
    assert_eq!(solution.id, article.id);
    assert_eq!(solution.slug, article.slug);

    // A dangling article link resolves to no solution payload.
    let step = h.server.resolve_flow_node(&flow.id, "orphan").await.unwrap();
    assert!(step.solution.is_none());

    let err = h
        .server
        .resolve_flow_node("missing-flow", "start")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Flow not found");
    let err = h
        .server
        .resolve_flow_node(&flow.id, "missing-node")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Node not found");
}

#[tokio::test]
async fn corrupted_stored_flow_is_a_server_fault() {
    let h = harness();
    let record = FlowRecord {
        id: "broken".to_string(),
        title: "Broken flow".to_string(),
        description: None,
        start_node_id: "start".to_string(),
        nodes: "not valid json".to_string(),
        edges: "[]".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    h.store.store_flow(&record).await.unwrap();

    let err = h.server.get_flow("broken").await.unwrap_err();
    assert!(matches!(err, ServerError::InternalError(_)));
}

#[tokio::test]
async fn delete_flow_removes_it() {
    let h = harness();
    let flow = h
        .server
        .create_flow(flow_request("Printer diagnosis"))
        .await
        .unwrap();

    h.server.delete_flow(&flow.id).await.unwrap();
    let err = h.server.get_flow(&flow.id).await.unwrap_err();
    assert_eq!(err.to_string(), "Flow not found");
}

// --- Tags and categories -------------------------------------------------

#[tokio::test]
async fn tags_are_normalized_and_counted() {
    let h = harness();
    let user = writer(&h.server, "w@example.com").await;

    let tag = h.server.create_tag("  Printer   Setup ").await.unwrap();
    assert_eq!(tag.name, "printersetup");

    let err = h.server.create_tag("   ").await.unwrap_err();
    assert_eq!(err.to_string(), "Validation error: Tag name is required");

    let mut req = article_request("A perfectly valid title");
    req.tags = Some(vec![
        "Printer Setup".to_string(),
        "NETWORK".to_string(),
        "network".to_string(),
    ]);
    let article = h.server.create_article(req, &user.id).await.unwrap();
    assert_eq!(article.tags, vec!["printersetup", "network"]);

    let tags = h.server.list_tags().await.unwrap();
    let printer = tags.iter().find(|t| t.name == "printersetup").unwrap();
    assert_eq!(printer.count, 1);
    let network = tags.iter().find(|t| t.name == "network").unwrap();
    assert_eq!(network.count, 1);
}

#[tokio::test]
async fn categories_validate_slug_and_uniqueness() {
    let h = harness();

    let err = h
        .server
        .create_category("Hardware", "Not A Slug")
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation error: Invalid slug format: must be kebab-case"
    );

    h.server
        .create_category("Hardware", "hardware")
        .await
        .unwrap();
    let err = h
        .server
        .create_category("Hardware", "hardware-2")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Category already exists");

    let listed = h.server.list_categories().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].slug, "hardware");
}

// --- Search --------------------------------------------------------------

#[tokio::test]
async fn search_requires_a_query_and_filters_published() {
    let h = harness();
    let user = writer(&h.server, "w@example.com").await;
    let boss = admin(&h.server, "admin@example.com").await;

    let err = h
        .server
        .search_articles(&SearchParams::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation error: Query parameter 'q' is required"
    );

    let draft = h
        .server
        .create_article(article_request("Printer stays offline"), &user.id)
        .await
        .unwrap();
    let published = h
        .server
        .create_article(article_request("Printer shows an error light"), &user.id)
        .await
        .unwrap();
    h.server
        .transition_article(&published.id, ArticleStatus::Published, &boss)
        .await
        .unwrap();

    let params = SearchParams {
        q: Some("printer".to_string()),
        ..SearchParams::default()
    };
    let response = h.server.search_articles(&params).await.unwrap();
    assert_eq!(response.total, 1);
    assert_eq!(response.hits[0].id, published.id);
    assert_ne!(response.hits[0].id, draft.id);
    assert_eq!(response.page, 1);
    assert_eq!(response.total_pages, 1);
}

#[tokio::test]
async fn search_rejects_unknown_type_filter() {
    let h = harness();
    let params = SearchParams {
        q: Some("printer".to_string()),
        kind: Some("GOSSIP".to_string()),
        ..SearchParams::default()
    };
    let err = h.server.search_articles(&params).await.unwrap_err();
    assert_eq!(err.to_string(), "Validation error: Invalid type filter");
}

#[tokio::test]
async fn search_clamps_pagination() {
    let h = harness();
    let params = SearchParams {
        q: Some("printer".to_string()),
        page: Some("0".to_string()),
        limit: Some("1000".to_string()),
        ..SearchParams::default()
    };
    let response = h.server.search_articles(&params).await.unwrap();
    assert_eq!(response.page, 1);
    assert_eq!(response.total, 0);
}

// --- Analytics -----------------------------------------------------------

#[tokio::test]
async fn view_tracking_updates_counters() {
    let h = harness();
    let user = writer(&h.server, "w@example.com").await;
    let boss = admin(&h.server, "admin@example.com").await;

    let err = h.server.track_view("missing").await.unwrap_err();
    assert_eq!(err.to_string(), "Article not found");

    let first = h
        .server
        .create_article(article_request("A perfectly valid title"), &user.id)
        .await
        .unwrap();
    let second = h
        .server
        .create_article(article_request("Another valid article title"), &user.id)
        .await
        .unwrap();
    for article_id in [&first.id, &second.id, &second.id] {
        h.server.track_view(article_id).await.unwrap();
    }

    let stats = h.server.view_stats(&second.id).await.unwrap();
    assert_eq!(stats.total_views, 2);

    let global = h.server.global_stats().await.unwrap();
    assert_eq!(global.articles, 2);
    assert_eq!(global.users, 2);
    assert_eq!(global.views, 3);

    // Popular covers published articles only.
    assert!(h.server.popular_articles(10).await.unwrap().is_empty());
    h.server
        .transition_article(&second.id, ArticleStatus::Published, &boss)
        .await
        .unwrap();
    let popular = h.server.popular_articles(10).await.unwrap();
    assert_eq!(popular.len(), 1);
    assert_eq!(popular[0].id, second.id);
    assert_eq!(popular[0].view_count, 2);
}

// --- Uploads -------------------------------------------------------------

#[tokio::test]
async fn save_upload_writes_file_and_checks_type() {
    let h = harness();

    let err = h
        .server
        .save_upload("notes.txt", "text/plain", b"hello")
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation error: Invalid file type. Only PNG, JPEG, WEBP and GIF are allowed."
    );

    let file_name = h
        .server
        .save_upload("Photo.PNG", "image/png", b"fake image bytes")
        .await
        .unwrap();
    assert!(file_name.ends_with(".png"));
    let stored = h._uploads.path().join(&file_name);
    assert_eq!(std::fs::read(stored).unwrap(), b"fake image bytes");
}

// --- Test doubles --------------------------------------------------------

/// Index stand-in whose every operation fails, for exercising the
/// warn-and-continue sync paths.
#[derive(Debug)]
struct FailingIndex;

#[async_trait]
impl SearchIndex for FailingIndex {
    async fn ensure_index(&self) -> SearchResult<()> {
        Err(SearchError::ConfigurationError("index offline".to_string()))
    }

    async fn index_document(&self, _document: &SearchDocument) -> SearchResult<()> {
        Err(SearchError::ConfigurationError("index offline".to_string()))
    }

    async fn remove_document(&self, _document_id: &str) -> SearchResult<()> {
        Err(SearchError::ConfigurationError("index offline".to_string()))
    }

    async fn clear_documents(&self) -> SearchResult<()> {
        Err(SearchError::ConfigurationError("index offline".to_string()))
    }

    async fn search(&self, _query: &SearchQuery) -> SearchResult<SearchPage> {
        Err(SearchError::ConfigurationError("index offline".to_string()))
    }

    async fn health_check(&self) -> SearchResult<bool> {
        Ok(false)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
