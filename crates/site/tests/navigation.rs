//! Orchestrator behaviour over the in-memory backend: navigation events,
//! prefetch triggers, blocking fetches and view models.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use folio_core::error::CoreError;
use folio_core::media::MediaType;
use folio_core::navigation::{Origin, View};
use folio_core::project::CategoryGroup;
use folio_core::types::DbId;
use folio_db::auth::{AuthContext, AuthUser};
use folio_db::memory::MemoryBackend;
use folio_db::models::project::Project;
use folio_query::{QueryClient, QueryConfig, QueryError};
use folio_site::events::NavigationEvent;
use folio_site::Orchestrator;
use serde_json::{json, Value};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const LATENCY: Duration = Duration::from_millis(50);

fn category_row(n: u128, key: &str, name: &str) -> Value {
    json!({
        "id": DbId::from_u128(n),
        "key": key,
        "name": name,
        "hidden": false,
        "created_at": "2025-01-01T00:00:00Z",
    })
}

fn project_id(category_offset: u128, n: u128) -> DbId {
    DbId::from_u128(category_offset * 100 + n)
}

fn project_rows(category_offset: u128, category: &str, count: u128) -> Vec<Value> {
    (1..=count)
        .map(|n| {
            json!({
                "id": project_id(category_offset, n),
                "title": format!("{category} {n}"),
                "category": category,
                "image_url": format!("https://cdn.example.com/{category}/{n}.png"),
                "created_at": format!("2025-0{}-{:02}T00:00:00Z", category_offset, n),
                "updated_at": format!("2025-0{}-{:02}T00:00:00Z", category_offset, n),
            })
        })
        .collect()
}

/// Three visible categories: admin (8 projects), design (7), writing (0),
/// plus one project filed under a category that no longer exists.
fn backend() -> Arc<MemoryBackend> {
    let backend = MemoryBackend::new()
        .with_portfolio_constraints()
        .with_latency(LATENCY);
    backend.seed(
        "categories",
        vec![
            category_row(1, "writing", "Writing"),
            category_row(2, "admin", "Admin Support"),
            category_row(3, "design", "Design"),
        ],
    );
    let mut projects = project_rows(1, "admin", 8);
    projects.extend(project_rows(2, "design", 7));
    projects.extend(project_rows(3, "legacy", 1));
    backend.seed("projects", projects);
    Arc::new(backend)
}

fn owner() -> AuthContext {
    AuthContext::signed_in(
        AuthUser {
            id: DbId::from_u128(1),
            email: Some("owner@example.com".into()),
        },
        None,
    )
}

async fn orchestrator(backend: &Arc<MemoryBackend>, auth: AuthContext) -> Orchestrator {
    let client = QueryClient::new(backend.clone(), auth, QueryConfig::default());
    Orchestrator::load(client).await.unwrap()
}

fn drain(rx: &mut broadcast::Receiver<NavigationEvent>) -> Vec<NavigationEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn category_changed(key: &str) -> NavigationEvent {
    NavigationEvent::CategoryChanged {
        category: key.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Startup
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn starts_collapsed_on_first_visible_category() {
    let backend = backend();
    let orch = orchestrator(&backend, AuthContext::anonymous()).await;

    assert_eq!(orch.view(), View::Collapsed);
    assert_eq!(orch.active_category().as_deref(), Some("admin"));
    let keys: Vec<_> = orch.categories().into_iter().map(|c| c.key).collect();
    assert_eq!(keys, vec!["admin", "design", "writing"]);
}

#[tokio::test(start_paused = true)]
async fn zero_categories_render_an_empty_state() {
    let backend = Arc::new(MemoryBackend::new());
    let orch = orchestrator(&backend, AuthContext::anonymous()).await;

    assert!(orch.active_category().is_none());
    let preview = orch.visible_projects().await.unwrap();
    assert!(preview.category.is_none());
    assert!(preview.is_empty());
}

// ---------------------------------------------------------------------------
// Prefetch triggers
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn hover_warms_the_cache() {
    let backend = backend();
    let orch = orchestrator(&backend, AuthContext::anonymous()).await;
    let mut rx = orch.subscribe();

    orch.hover_category("design").unwrap();
    tokio::time::sleep(LATENCY * 2).await;
    assert!(orch.client().projects().is_cached("design"));
    assert_eq!(backend.select_calls("projects"), 1);

    // Selecting a warmed category does not fetch again.
    orch.select_category("design").await.unwrap();
    assert_eq!(backend.select_calls("projects"), 1);
    assert_eq!(drain(&mut rx), vec![category_changed("design")]);
}

#[tokio::test(start_paused = true)]
async fn section_visible_prefetches_once() {
    let backend = backend();
    let orch = orchestrator(&backend, AuthContext::anonymous()).await;

    orch.section_visible();
    tokio::time::sleep(LATENCY * 2).await;
    // Three categories plus the all-projects list.
    assert_eq!(backend.select_calls("projects"), 4);
    for key in ["admin", "design", "writing"] {
        assert!(orch.client().projects().is_cached(key));
    }

    orch.client().invalidate_project_lists();
    orch.section_visible();
    tokio::time::sleep(LATENCY * 2).await;
    assert_eq!(backend.select_calls("projects"), 4);
}

#[tokio::test(start_paused = true)]
async fn see_more_opens_all_projects_and_prefetches() {
    let backend = backend();
    let orch = orchestrator(&backend, AuthContext::anonymous()).await;
    let mut rx = orch.subscribe();

    orch.see_more();
    assert_eq!(orch.view(), View::AllProjects);
    assert_eq!(
        drain(&mut rx),
        vec![NavigationEvent::ViewChanged {
            view: View::AllProjects
        }]
    );

    tokio::time::sleep(LATENCY * 2).await;
    assert_eq!(backend.select_calls("projects"), 4);
}

#[tokio::test(start_paused = true)]
async fn failed_prefetch_does_not_surface() {
    let backend = backend();
    let orch = orchestrator(&backend, AuthContext::anonymous()).await;
    backend.fail_next_selects("projects", 1);

    orch.hover_category("design").unwrap();
    tokio::time::sleep(LATENCY * 2).await;
    assert!(!orch.client().projects().is_cached("design"));

    orch.select_category("design").await.unwrap();
    assert!(orch.client().projects().is_cached("design"));
}

// ---------------------------------------------------------------------------
// Blocking fetches
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn selecting_an_uncached_category_fetches_it() {
    let backend = backend();
    let orch = orchestrator(&backend, AuthContext::anonymous()).await;
    let mut rx = orch.subscribe();

    orch.select_category("writing").await.unwrap();

    assert_eq!(orch.active_category().as_deref(), Some("writing"));
    assert!(orch.client().projects().is_cached("writing"));
    assert_eq!(backend.select_calls("projects"), 1);
    assert_eq!(drain(&mut rx), vec![category_changed("writing")]);
}

#[tokio::test(start_paused = true)]
async fn blocking_fetch_errors_are_returned() {
    let backend = backend();
    let orch = orchestrator(&backend, AuthContext::anonymous()).await;
    let mut rx = orch.subscribe();
    backend.fail_next_selects("projects", 1);

    let err = orch.select_category("design").await.unwrap_err();
    assert_matches!(err, QueryError::Backend(_));

    // The switch itself still happened; the next read retries.
    assert_eq!(orch.active_category().as_deref(), Some("design"));
    assert_eq!(drain(&mut rx), vec![category_changed("design")]);
    assert_eq!(orch.visible_projects().await.unwrap().total, 7);
}

// ---------------------------------------------------------------------------
// Detail view and back navigation
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn back_restores_the_opened_projects_category() {
    let backend = backend();
    let orch = orchestrator(&backend, AuthContext::anonymous()).await;
    let mut rx = orch.subscribe();
    let opened = project_id(2, 3);

    // Browsing all projects with "admin" active, open a design project.
    orch.see_more();
    orch.open_project(opened, "design").unwrap();
    assert_eq!(
        orch.view(),
        View::ProjectDetail {
            project_id: opened,
            origin: Origin::AllProjects
        }
    );
    drain(&mut rx);

    orch.back().await.unwrap();

    assert_eq!(orch.view(), View::AllProjects);
    assert_eq!(orch.active_category().as_deref(), Some("design"));
    assert_eq!(
        drain(&mut rx),
        vec![
            NavigationEvent::ViewChanged {
                view: View::AllProjects
            },
            category_changed("design"),
            NavigationEvent::ScrollTo { project_id: opened },
        ]
    );
    assert!(orch.client().projects().is_cached("design"));
}

#[tokio::test(start_paused = true)]
async fn back_from_same_category_only_scrolls() {
    let backend = backend();
    let orch = orchestrator(&backend, AuthContext::anonymous()).await;
    let mut rx = orch.subscribe();
    let opened = project_id(1, 2);

    orch.open_project(opened, "admin").unwrap();
    orch.back().await.unwrap();

    assert_eq!(orch.view(), View::Collapsed);
    assert_eq!(
        drain(&mut rx),
        vec![
            NavigationEvent::ViewChanged {
                view: View::ProjectDetail {
                    project_id: opened,
                    origin: Origin::Collapsed
                }
            },
            NavigationEvent::ViewChanged {
                view: View::Collapsed
            },
            NavigationEvent::ScrollTo { project_id: opened },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn back_restores_the_opening_category_when_the_project_category_is_gone() {
    let backend = backend();
    let orch = orchestrator(&backend, owner()).await;
    let opened = project_id(2, 1);

    orch.open_project(opened, "design").unwrap();
    orch.select_category("writing").await.unwrap();
    orch.client().mutations().delete_category("design").await.unwrap();
    orch.refresh_categories().await.unwrap();
    let mut rx = orch.subscribe();

    orch.back().await.unwrap();

    assert_eq!(orch.view(), View::Collapsed);
    assert_eq!(orch.active_category().as_deref(), Some("admin"));
    assert_eq!(
        drain(&mut rx),
        vec![
            NavigationEvent::ViewChanged {
                view: View::Collapsed
            },
            category_changed("admin"),
        ]
    );
    assert_eq!(
        orch.last_opened().and_then(|l| l.opened_from),
        Some("admin".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn project_detail_includes_the_gallery() {
    let seed = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seed/portfolio.json");
    let backend = Arc::new(MemoryBackend::from_seed_file(&seed).unwrap());
    // The reel's "video" category is hidden in the seed; only the owner sees it.
    let orch = orchestrator(&backend, owner()).await;

    assert!(orch.project_detail().await.unwrap().is_none());

    let podcast: DbId = "0191f0a1-0000-7000-8000-000000000003".parse().unwrap();
    orch.open_project(podcast, "design").unwrap();
    let detail = orch.project_detail().await.unwrap().expect("project exists");
    assert_eq!(detail.project.title, "Podcast Brand Kit");
    let types: Vec<_> = detail.gallery.iter().map(|g| g.media_type).collect();
    assert_eq!(types, vec![MediaType::Image, MediaType::Video]);

    let reel: DbId = "0191f0a1-0000-7000-8000-000000000004".parse().unwrap();
    orch.open_project(reel, "video").unwrap();
    let detail = orch.project_detail().await.unwrap().expect("project exists");
    assert_eq!(detail.gallery.len(), 1);
    assert_eq!(detail.gallery[0].url, detail.project.image_url);
}

// ---------------------------------------------------------------------------
// View models
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn collapsed_view_shows_a_preview() {
    let backend = backend();
    let orch = orchestrator(&backend, AuthContext::anonymous()).await;

    // Admin support is capped below the preview size.
    let admin = orch.visible_projects().await.unwrap();
    assert_eq!(admin.projects.len(), 5);
    assert!(!admin.has_more());

    orch.select_category("design").await.unwrap();
    let design = orch.visible_projects().await.unwrap();
    assert_eq!(design.projects.len(), 6);
    assert_eq!(design.total, 7);
    assert!(design.has_more());

    orch.see_more();
    assert_eq!(orch.visible_projects().await.unwrap().projects.len(), 7);

    orch.select_category("writing").await.unwrap();
    assert!(orch.visible_projects().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn preview_limit_is_configurable() {
    let backend = backend();
    let orch = orchestrator(&backend, AuthContext::anonymous())
        .await
        .with_preview_limit(2);
    orch.select_category("design").await.unwrap();
    assert_eq!(orch.visible_projects().await.unwrap().projects.len(), 2);
}

fn group_summary(groups: &[CategoryGroup<Project>]) -> Vec<(Option<String>, usize)> {
    groups
        .iter()
        .map(|g| (g.category.clone(), g.items.len()))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn grouped_projects_follow_registry_order() {
    let backend = backend();

    let owner = orchestrator(&backend, owner()).await;
    assert_eq!(
        group_summary(&owner.grouped_projects().await.unwrap()),
        vec![
            (Some("admin".to_string()), 8),
            (Some("design".to_string()), 7),
            (None, 1),
        ]
    );

    // Visitors get no ungrouped bucket.
    let visitor = orchestrator(&backend, AuthContext::anonymous()).await;
    assert_eq!(
        group_summary(&visitor.grouped_projects().await.unwrap()),
        vec![
            (Some("admin".to_string()), 8),
            (Some("design".to_string()), 7),
        ]
    );
}

// ---------------------------------------------------------------------------
// Hidden categories
// ---------------------------------------------------------------------------

/// "admin" is visible, "design" is hidden; each holds one project.
fn backend_with_hidden_category() -> Arc<MemoryBackend> {
    let backend = MemoryBackend::new().with_portfolio_constraints();
    let mut hidden = category_row(2, "design", "Design");
    hidden["hidden"] = json!(true);
    backend.seed(
        "categories",
        vec![category_row(1, "admin", "Admin Support"), hidden],
    );
    let mut projects = project_rows(1, "admin", 1);
    projects.extend(project_rows(2, "design", 1));
    backend.seed("projects", projects);
    Arc::new(backend)
}

#[tokio::test(start_paused = true)]
async fn visitors_never_see_hidden_category_projects() {
    let backend = backend_with_hidden_category();
    let orch = orchestrator(&backend, AuthContext::anonymous()).await;
    let mut rx = orch.subscribe();

    let groups = orch.grouped_projects().await.unwrap();
    assert_eq!(
        group_summary(&groups),
        vec![(Some("admin".to_string()), 1)]
    );

    assert_matches!(
        orch.select_category("design").await,
        Err(QueryError::Core(CoreError::NotFound { entity: "Category", .. }))
    );
    assert_matches!(
        orch.hover_category("design"),
        Err(QueryError::Core(CoreError::NotFound { .. }))
    );
    assert_matches!(
        orch.open_project(project_id(2, 1), "design"),
        Err(QueryError::Core(CoreError::NotFound { .. }))
    );

    // Nothing changed and nothing was fetched for the hidden category.
    assert_eq!(orch.active_category().as_deref(), Some("admin"));
    assert_eq!(orch.view(), View::Collapsed);
    assert!(drain(&mut rx).is_empty());
    assert!(!orch.client().projects().is_cached("design"));
    let shown: Vec<_> = orch
        .visible_projects()
        .await
        .unwrap()
        .projects
        .into_iter()
        .map(|p| p.category)
        .collect();
    assert_eq!(shown, vec!["admin"]);
}

#[tokio::test(start_paused = true)]
async fn owner_can_browse_hidden_categories() {
    let backend = backend_with_hidden_category();
    let orch = orchestrator(&backend, owner()).await;

    orch.select_category("design").await.unwrap();
    let preview = orch.visible_projects().await.unwrap();
    assert_eq!(preview.category.as_deref(), Some("design"));
    assert_eq!(preview.total, 1);
    assert_eq!(
        group_summary(&orch.grouped_projects().await.unwrap()),
        vec![
            (Some("admin".to_string()), 1),
            (Some("design".to_string()), 1),
        ]
    );
}

// ---------------------------------------------------------------------------
// Owner signals
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn add_category_request_is_owner_only() {
    let backend = backend();

    let visitor = orchestrator(&backend, AuthContext::anonymous()).await;
    assert_matches!(
        visitor.request_add_category(),
        Err(QueryError::Core(CoreError::Unauthorized(_)))
    );

    let owner = orchestrator(&backend, owner()).await;
    let mut rx = owner.subscribe();
    owner.request_add_category().unwrap();
    assert_eq!(drain(&mut rx), vec![NavigationEvent::AddCategoryRequested]);
}

#[tokio::test(start_paused = true)]
async fn refresh_picks_up_new_categories() {
    let backend = backend();
    let orch = orchestrator(&backend, owner()).await;

    orch.client()
        .mutations()
        .create_category(&folio_db::models::category::CreateCategory {
            key: "video".into(),
            name: "Video".into(),
            badge: None,
            hidden: Some(true),
        })
        .await
        .unwrap();
    orch.refresh_categories().await.unwrap();

    let keys: Vec<_> = orch.categories().into_iter().map(|c| c.key).collect();
    assert_eq!(keys, vec!["admin", "design", "writing", "video"]);
}
