use std::sync::Arc;

use pageshell::VERSION;
use pageshell::registries::ControllerRegistry;
use pageshell::shell::{
    PAGE_CONTAINER_COUNT, RouteDefinition, Router, SlotState, StaticContentSource, ViewError,
    ViewEventKind, ViewManager,
};
use pageshell::test_utils::{
    ControllerLog, RECORDING_CONTROLLER, YieldingResolver, headless_container, page_request,
    recording_registry,
};

#[test]
fn scenarios_binary_smoke_runs() {
    assert!(!VERSION.is_empty());
}

#[tokio::test]
async fn four_pages_push_the_first_out_of_the_ring() {
    let log = ControllerLog::default();
    let mut manager = ViewManager::new(headless_container(Arc::new(recording_registry(&log))));

    for url in ["/a", "/b", "/c", "/d"] {
        manager
            .load_view(&page_request(url, Some(RECORDING_CONTROLLER)))
            .await
            .expect("load");
    }

    let restore_a = manager
        .try_restore_view(&page_request("/a", None).with_back(true))
        .await;
    assert!(restore_a.is_err_and(|error| error.is_cache_miss()));

    let restore_d = manager
        .try_restore_view(&page_request("/d", None).with_back(true))
        .await
        .expect("d still cached");
    assert!(restore_d.restored);
    assert_eq!(log.destroyed(), vec!["/a"]);
    assert_eq!(
        manager.container().tree().fragment_count(),
        PAGE_CONTAINER_COUNT
    );
}

#[tokio::test]
async fn reset_then_back_rebuilds_the_page() {
    let log = ControllerLog::default();
    let mut manager = ViewManager::new(headless_container(Arc::new(recording_registry(&log))));
    manager
        .load_view(&page_request("/settings", Some(RECORDING_CONTROLLER)))
        .await
        .expect("load");
    manager
        .load_view(&page_request("/library", Some(RECORDING_CONTROLLER)))
        .await
        .expect("load");

    manager.reset();

    assert_eq!(log.destroyed(), vec!["/settings", "/library"]);
    assert_eq!(manager.container().tree().fragment_count(), 0);
    assert!(manager.current_view().is_none());
    let back = manager
        .try_restore_view(&page_request("/settings", None))
        .await;
    assert_eq!(
        back,
        Err(ViewError::NotCached {
            url: "/settings".to_string()
        })
    );
}

#[tokio::test]
async fn lifecycle_of_a_page_across_load_leave_and_return() {
    let log = ControllerLog::default();
    let mut manager = ViewManager::new(headless_container(Arc::new(recording_registry(&log))));

    manager
        .load_view(&page_request("/a", Some(RECORDING_CONTROLLER)))
        .await
        .expect("load a");
    manager
        .load_view(&page_request("/b", Some(RECORDING_CONTROLLER)))
        .await
        .expect("load b");
    manager
        .try_restore_view(&page_request("/a", None))
        .await
        .expect("restore a");

    assert_eq!(
        log.kinds_for("/a"),
        vec![
            ViewEventKind::Init,
            ViewEventKind::BeforeShow,
            ViewEventKind::Show,
            ViewEventKind::BeforeHide,
            ViewEventKind::Hide,
            ViewEventKind::BeforeShow,
            ViewEventKind::Show,
        ]
    );
    assert_eq!(log.created(), vec!["/a", "/b"]);
}

#[tokio::test]
async fn superseded_navigation_leaves_the_visible_page_alone() {
    let log = ControllerLog::default();
    let resolver = Arc::new(YieldingResolver::new(recording_registry(&log), 4));
    let mut manager = ViewManager::new(headless_container(resolver));
    manager
        .load_view(&page_request("/a", None))
        .await
        .expect("load a");
    let events = manager.subscribe();

    let slow = page_request("/b", Some(RECORDING_CONTROLLER));
    let token = slow.cancel_token();
    let (outcome, ()) = tokio::join!(manager.load_view(&slow), async move {
        tokio::task::yield_now().await;
        token.cancel();
    });

    assert_eq!(outcome, Err(ViewError::Cancelled));
    assert!(events.try_recv().is_err());
    assert_eq!(
        manager.current_view().map(|view| view.url.as_str()),
        Some("/a")
    );
    let states: Vec<SlotState> = manager
        .container()
        .slot_snapshots()
        .iter()
        .map(|slot| slot.state)
        .collect();
    assert_eq!(states, vec![SlotState::Mounted, SlotState::Empty, SlotState::Empty]);
}

#[tokio::test]
async fn routed_session_restores_and_refetches_as_the_ring_turns() {
    let registry = Arc::new(ControllerRegistry::new());
    let content = StaticContentSource::new()
        .with_page("/web/home.html", "<div data-title=\"Home\"></div>")
        .with_page("/web/movies.html", "<div data-title=\"Movies\"></div>")
        .with_page("/web/tv.html", "<div data-title=\"Shows\"></div>")
        .with_page("/web/music.html", "<div data-title=\"Music\"></div>");
    let mut router = Router::new(
        ViewManager::new(headless_container(registry.clone())),
        registry,
        Arc::new(content),
    )
    .with_base_url("/web");
    router.add_routes([
        RouteDefinition::new("home.html").with_type("home"),
        RouteDefinition::new("movies.html"),
        RouteDefinition::new("tv.html"),
        RouteDefinition::new("music.html"),
    ]);

    for path in ["#!/home.html", "/web/movies.html", "tv.html", "music.html"] {
        router.show(path).await.expect("show");
    }
    assert_eq!(router.history_len(), 4);
    assert!(router.can_go_back());

    let tv = router.back().await.expect("back").expect("transition");
    assert!(tv.restored);
    let movies = router.back().await.expect("back").expect("transition");
    assert!(movies.restored);
    let home = router.back().await.expect("back").expect("transition");
    assert!(!home.restored, "home was pushed out by music");
    assert!(!router.can_go_back());

    let cached = router.manager().container().cached_urls();
    assert!(cached.contains(&"/web/home.html".to_string()));
    assert_eq!(cached.len(), PAGE_CONTAINER_COUNT);
}

#[tokio::test]
async fn missing_route_and_missing_content_are_reported() {
    let registry = Arc::new(ControllerRegistry::new());
    let mut router = Router::new(
        ViewManager::new(headless_container(registry.clone())),
        registry,
        Arc::new(StaticContentSource::new()),
    );
    router.add_route(RouteDefinition::new("/orphan.html"));

    assert!(matches!(
        router.show("/unknown.html").await,
        Err(ViewError::RouteNotFound { .. })
    ));
    assert!(matches!(
        router.show("/orphan.html").await,
        Err(ViewError::Content { .. })
    ));
    assert!(router.current_route().is_none());
}
