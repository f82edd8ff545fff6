use chrono::{DateTime, TimeZone, Utc};
use watchmark_core::{MarkerConfig, MouseButton, MS_PER_DAY};
use watchmark_engine::{
    MarkerSession, PageLocation, PointerAction, SessionEvent, SnapshotPage, ToggleOutcome,
};
use watchmark_store::{HistoryStore, MemoryStore, Toggled, WatchedHistory, HISTORY_KEY};

fn ts(offset_ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_708_995_600_000 + offset_ms)
        .single()
        .expect("valid timestamp")
}

fn watch_page(video_id: &str) -> SnapshotPage {
    SnapshotPage::new(PageLocation::from_href(format!(
        "https://www.youtube.com/watch?v={video_id}"
    )))
}

fn backend_with_history(entries: &[(&str, DateTime<Utc>)]) -> MemoryStore {
    let mut history = WatchedHistory::new();
    for (id, at) in entries {
        history.record_visit(id, *at);
    }
    let mut store = HistoryStore::new(MemoryStore::new());
    store.persist(&history).expect("seed history");
    store.backend().clone()
}

#[test]
fn first_pass_records_current_video_and_marks_matching_containers() {
    let mut page = watch_page("abc123");
    let watched = page.push_container(
        "#items>.ytd-watch-next-secondary-results-renderer .ytd-compact-video-renderer",
        Some("https://www.youtube.com/watch?v=abc123"),
    );
    let unwatched = page.push_container(
        "#items>.ytd-watch-next-secondary-results-renderer .ytd-compact-video-renderer",
        Some("https://www.youtube.com/watch?v=zzz999"),
    );

    let mut session = MarkerSession::new(MarkerConfig::default(), MemoryStore::new());
    let report = session.run_pass(&mut page, ts(0)).expect("pass");

    assert_eq!(report.visit_recorded.as_deref(), Some("abc123"));
    assert_eq!(session.history().len(), 1);
    assert!(page.is_watched(watched));
    assert!(!page.is_watched(unwatched));

    let raw = session
        .store()
        .backend()
        .raw(HISTORY_KEY)
        .expect("persisted blob");
    assert_eq!(raw, r#"[{"id":"abc123","timestamp":1708995600000}]"#);
}

#[test]
fn revisiting_a_watched_video_does_not_touch_the_store() {
    let backend = backend_with_history(&[("abc123", ts(0))]);
    let mut page = watch_page("abc123");
    let mut session = MarkerSession::new(MarkerConfig::default(), backend);

    let report = session.run_pass(&mut page, ts(60_000)).expect("pass");
    assert_eq!(report.visit_recorded, None);
    assert_eq!(session.history().records()[0].timestamp, ts(0));
}

#[test]
fn record_older_than_max_age_is_evicted_during_a_pass() {
    let backend = backend_with_history(&[("abc123", ts(0))]);
    let mut page = SnapshotPage::new(PageLocation::from_href("https://www.youtube.com/"));
    let mut session = MarkerSession::new(MarkerConfig::default(), backend);

    let now = ts(181 * MS_PER_DAY);
    let report = session.run_pass(&mut page, now).expect("pass");

    assert_eq!(report.pruned, 1);
    assert!(!session.history().contains("abc123"));
    // the eviction reached the persisted copy
    let raw = session
        .store()
        .backend()
        .raw(HISTORY_KEY)
        .expect("persisted blob");
    assert_eq!(raw, "[]");
}

#[test]
fn zero_max_age_retains_records_forever() {
    let backend = backend_with_history(&[("abc123", ts(0))]);
    let mut page = SnapshotPage::new(PageLocation::from_href("https://www.youtube.com/"));
    let config = MarkerConfig {
        max_watched_video_age_days: 0,
        ..MarkerConfig::default()
    };
    let mut session = MarkerSession::new(config, backend);

    let report = session
        .run_pass(&mut page, ts(10_000 * MS_PER_DAY))
        .expect("pass");
    assert_eq!(report.pruned, 0);
    assert!(session.history().contains("abc123"));
}

#[test]
fn pass_on_a_listing_page_records_no_visit() {
    let mut page = SnapshotPage::new(PageLocation::from_href(
        "https://www.youtube.com/feed/subscriptions",
    ));
    let mut session = MarkerSession::new(MarkerConfig::default(), MemoryStore::new());
    let report = session.run_pass(&mut page, ts(0)).expect("pass");
    assert_eq!(report.visit_recorded, None);
    assert!(session.history().is_empty());
}

#[test]
fn manual_toggle_marks_immediately_without_prune_or_visit_recording() {
    // Seed a record already past the age limit: a toggle must not evict it,
    // and the current watch page's own id must not be recorded.
    let backend = backend_with_history(&[("stale", ts(-200 * MS_PER_DAY))]);
    let mut page = watch_page("current");
    let target = page.push_container(
        "#items>.ytd-watch-next-secondary-results-renderer .ytd-compact-video-renderer",
        Some("https://www.youtube.com/watch?v=xyz"),
    );

    let mut session = MarkerSession::new(MarkerConfig::default(), backend);
    let action = PointerAction {
        button: MouseButton::Primary,
        alt_held: true,
        target,
    };
    let outcome = session.handle_pointer(&mut page, action, ts(0)).expect("toggle");

    assert_eq!(outcome, ToggleOutcome::Toggled(Toggled::Added));
    assert!(page.is_watched(target));
    assert!(session.history().contains("xyz"));
    assert!(session.history().contains("stale"), "toggle must not prune");
    assert!(
        !session.history().contains("current"),
        "toggle must not record the current page visit"
    );
}

#[test]
fn toggling_twice_restores_membership() {
    let mut page = watch_page("current");
    let target = page.push_container(
        "#items>.ytd-grid-renderer",
        Some("https://www.youtube.com/watch?v=xyz"),
    );
    let mut session = MarkerSession::new(MarkerConfig::default(), MemoryStore::new());
    session.run_pass(&mut page, ts(0)).expect("pass");

    let action = PointerAction {
        button: MouseButton::Secondary,
        alt_held: true,
        target,
    };
    session.handle_pointer(&mut page, action, ts(10)).expect("add");
    assert!(page.is_watched(target));
    let outcome = session
        .handle_pointer(&mut page, action, ts(20))
        .expect("remove");
    assert_eq!(outcome, ToggleOutcome::Toggled(Toggled::Removed));
    assert!(!page.is_watched(target));
    assert!(!session.history().contains("xyz"));
}

#[test]
fn pointer_actions_without_modifier_or_configured_button_are_ignored() {
    let mut page = watch_page("current");
    let target = page.push_container("#items>.ytd-grid-renderer", Some("/watch?v=xyz"));
    let config = MarkerConfig {
        marker_mouse_buttons: vec![MouseButton::Primary],
        ..MarkerConfig::default()
    };
    let mut session = MarkerSession::new(config, MemoryStore::new());

    let no_alt = PointerAction {
        button: MouseButton::Primary,
        alt_held: false,
        target,
    };
    let wrong_button = PointerAction {
        button: MouseButton::Secondary,
        alt_held: true,
        target,
    };
    assert_eq!(
        session.handle_pointer(&mut page, no_alt, ts(0)).expect("no alt"),
        ToggleOutcome::Ignored
    );
    assert_eq!(
        session
            .handle_pointer(&mut page, wrong_button, ts(0))
            .expect("wrong button"),
        ToggleOutcome::Ignored
    );
    assert!(session.history().is_empty());
}

#[test]
fn toggle_before_any_pass_starts_from_the_persisted_history() {
    let backend = backend_with_history(&[("existing", ts(0))]);
    let mut page = SnapshotPage::new(PageLocation::from_href("https://www.youtube.com/"));
    let target = page.push_container("#items>.ytd-grid-renderer", Some("/watch?v=xyz"));

    let mut session = MarkerSession::new(MarkerConfig::default(), backend);
    let action = PointerAction {
        button: MouseButton::Primary,
        alt_held: true,
        target,
    };
    session.handle_pointer(&mut page, action, ts(10)).expect("toggle");
    assert!(session.history().contains("existing"));
    assert!(session.history().contains("xyz"));
}

#[test]
fn toggle_over_a_non_video_link_leaves_everything_alone() {
    let mut page = SnapshotPage::new(PageLocation::from_href("https://www.youtube.com/"));
    let target = page.push_container("#items>.ytd-grid-renderer", Some("/playlist?list=PL1"));
    let mut session = MarkerSession::new(MarkerConfig::default(), MemoryStore::new());

    let action = PointerAction {
        button: MouseButton::Primary,
        alt_held: true,
        target,
    };
    let outcome = session.handle_pointer(&mut page, action, ts(0)).expect("toggle");
    assert_eq!(outcome, ToggleOutcome::NoVideoId);
    assert!(session.history().is_empty());
}

#[test]
fn event_bursts_collapse_into_one_debounced_pass() {
    let mut page = watch_page("abc123");
    let mut session = MarkerSession::new(MarkerConfig::default(), MemoryStore::new());

    session.handle_event(SessionEvent::DocumentLoaded, ts(0));
    session.handle_event(SessionEvent::FragmentProcessed, ts(50));
    session.handle_event(
        SessionEvent::RequestCompleted {
            url: "/browse_ajax?ctoken=abc".to_string(),
        },
        ts(80),
    );

    // last trigger wins: ajax at t=80 with the 200ms base delay
    assert!(session.tick(&mut page, ts(200)).expect("tick").is_none());
    let report = session.tick(&mut page, ts(280)).expect("tick");
    assert!(report.is_some());
    // nothing left pending afterwards
    assert!(session.tick(&mut page, ts(10_000)).expect("tick").is_none());
}

#[test]
fn focus_regain_schedules_a_scan_but_repeated_focus_does_not() {
    let mut session = MarkerSession::new(MarkerConfig::default(), MemoryStore::new());

    session.handle_event(SessionEvent::WindowFocused, ts(0));
    assert_eq!(session.pending_scan_at(), None);

    session.handle_event(SessionEvent::WindowBlurred, ts(10));
    session.handle_event(SessionEvent::WindowFocused, ts(20));
    assert_eq!(session.pending_scan_at(), Some(ts(220)));
}

#[test]
fn unrelated_request_completions_schedule_nothing() {
    let mut session = MarkerSession::new(MarkerConfig::default(), MemoryStore::new());
    session.handle_event(
        SessionEvent::RequestCompleted {
            url: "https://www.youtube.com/api/stats?ver=2".to_string(),
        },
        ts(0),
    );
    assert_eq!(session.pending_scan_at(), None);
}

#[test]
fn hook_discovery_flows_into_scheduled_passes() {
    let mut page = watch_page("abc123");
    let mut session = MarkerSession::new(MarkerConfig::default(), MemoryStore::new());

    // hooks not in the tree yet
    assert!(session.poll_hooks(&page, ts(0)).is_empty());

    page.elements.push("masthead".to_string());
    let found = session.poll_hooks(&page, ts(100));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].dom_id, "masthead");
    // resolved probes stay quiet
    assert!(session.poll_hooks(&page, ts(200)).is_empty());

    // the host attached the listener and now reports a firing
    session.handle_event(SessionEvent::RendererStamped, ts(300));
    let report = session.tick(&mut page, ts(600)).expect("tick");
    assert!(report.is_some());
}

#[test]
fn install_injects_the_stylesheet_once() {
    let mut page = SnapshotPage::new(PageLocation::from_href("https://www.youtube.com/"));
    let mut session = MarkerSession::new(MarkerConfig::default(), MemoryStore::new());
    session.install(&mut page);
    session.install(&mut page);
    assert_eq!(page.stylesheets.len(), 1);
    assert!(page.stylesheets[0].contains(".watched"));
}

#[test]
fn malformed_persisted_state_self_heals_during_a_pass() {
    let backend = MemoryStore::with_value(HISTORY_KEY, "not json");
    let mut page = watch_page("abc123");
    let mut session = MarkerSession::new(MarkerConfig::default(), backend);

    let report = session.run_pass(&mut page, ts(0)).expect("pass");
    assert_eq!(report.visit_recorded.as_deref(), Some("abc123"));
    assert_eq!(session.history().len(), 1);
}

#[test]
fn context_menu_interception_follows_configuration() {
    let with_secondary = MarkerSession::new(MarkerConfig::default(), MemoryStore::new());
    assert!(with_secondary.intercepts_context_menu());

    let primary_only = MarkerSession::new(
        MarkerConfig {
            marker_mouse_buttons: vec![MouseButton::Primary],
            ..MarkerConfig::default()
        },
        MemoryStore::new(),
    );
    assert!(!primary_only.intercepts_context_menu());
}
