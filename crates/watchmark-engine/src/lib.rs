pub mod page;
pub mod reconcile;
pub mod scheduler;
pub mod snapshot;
pub mod toggle;

pub use page::{NodeId, PageLocation, PageView};
pub use reconcile::{MarkStats, Reconciler, SELECTOR_RULES, WATCHED_STYLESHEET};
pub use scheduler::{
    FocusTracker, HookProbe, HookSpec, RequestObserver, ScanScheduler, ScanTrigger,
    SchedulerConfig, DOM_HOOKS,
};
pub use snapshot::{SnapshotContainer, SnapshotPage};
pub use toggle::{PointerAction, ToggleOutcome};

use chrono::{DateTime, Utc};
use tracing::debug;
use watchmark_core::{extract_video_id, MarkerConfig};
use watchmark_store::{HistoryStore, StoreError, ValueStore, WatchedHistory};

/// Host-side occurrences fed into the session. The host owns the real
/// event wiring (listeners, network layer); the engine only classifies and
/// schedules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    DocumentLoaded,
    FragmentProcessed,
    ViewportLoaded,
    RendererStamped,
    WindowBlurred,
    WindowFocused,
    RequestCompleted { url: String },
}

/// Outcome of one full reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub pruned: usize,
    /// Video id recorded for the current page, when it is a watch page
    /// seen for the first time.
    pub visit_recorded: Option<String>,
    pub stats: MarkStats,
}

/// One marking session on one page. Wires the history store, the
/// reconciler, and the scan scheduling state together; the host drives it
/// with events, hook polls, and clock ticks.
pub struct MarkerSession<S: ValueStore> {
    config: MarkerConfig,
    store: HistoryStore<S>,
    history: WatchedHistory,
    history_loaded: bool,
    reconciler: Reconciler,
    scheduler: ScanScheduler,
    focus: FocusTracker,
    requests: RequestObserver,
    probes: Vec<HookProbe>,
    installed: bool,
}

impl<S: ValueStore> MarkerSession<S> {
    pub fn new(config: MarkerConfig, backend: S) -> Self {
        let scheduler = ScanScheduler::new(SchedulerConfig::from_marker(&config));
        Self {
            config,
            store: HistoryStore::new(backend),
            history: WatchedHistory::new(),
            history_loaded: false,
            reconciler: Reconciler::new(),
            scheduler,
            focus: FocusTracker::new(true),
            requests: RequestObserver::new(),
            probes: DOM_HOOKS.iter().copied().map(HookProbe::new).collect(),
            installed: false,
        }
    }

    /// Inject the marker stylesheet. Idempotent; called once at startup.
    pub fn install(&mut self, page: &mut dyn PageView) {
        if !self.installed {
            page.inject_stylesheet(WATCHED_STYLESHEET);
            self.installed = true;
        }
    }

    /// Classify a host event and schedule a scan when it warrants one.
    pub fn handle_event(&mut self, event: SessionEvent, now: DateTime<Utc>) {
        match event {
            SessionEvent::DocumentLoaded => {
                self.scheduler.schedule(ScanTrigger::DocumentLoaded, now)
            }
            SessionEvent::FragmentProcessed => {
                self.scheduler.schedule(ScanTrigger::FragmentProcessed, now)
            }
            SessionEvent::ViewportLoaded => {
                self.scheduler.schedule(ScanTrigger::ViewportLoaded, now)
            }
            SessionEvent::RendererStamped => {
                self.scheduler.schedule(ScanTrigger::RendererStamped, now)
            }
            SessionEvent::WindowBlurred => self.focus.note_blur(),
            SessionEvent::WindowFocused => {
                if self.focus.note_focus() {
                    self.scheduler.schedule(ScanTrigger::FocusRegained, now);
                }
            }
            SessionEvent::RequestCompleted { url } => {
                if self.requests.completed(&url) {
                    self.scheduler.schedule(ScanTrigger::AjaxCompleted, now);
                }
            }
        }
    }

    /// Drive the hook probes. Returns hooks discovered on this poll; the
    /// host attaches the corresponding listeners and feeds their events
    /// back as [`SessionEvent`]s.
    pub fn poll_hooks(&mut self, page: &dyn PageView, now: DateTime<Utc>) -> Vec<HookSpec> {
        self.probes
            .iter_mut()
            .filter_map(|probe| probe.poll(page, now))
            .collect()
    }

    /// Run the pending scan if its deadline has passed.
    pub fn tick(
        &mut self,
        page: &mut dyn PageView,
        now: DateTime<Utc>,
    ) -> Result<Option<PassReport>, StoreError> {
        match self.scheduler.claim_due(now) {
            Some(ticket) => {
                debug!(trigger = ?ticket.trigger, "running scheduled pass");
                self.run_pass(page, now).map(Some)
            }
            None => Ok(None),
        }
    }

    /// One full reconciliation pass: reload history, prune, record the
    /// current page's video (if it is one), persist when changed, and
    /// re-annotate every matched container.
    pub fn run_pass(
        &mut self,
        page: &mut dyn PageView,
        now: DateTime<Utc>,
    ) -> Result<PassReport, StoreError> {
        let mut history = self.store.load()?;
        let pruned = history.prune(now, self.config.max_watched_video_age_days);
        let mut dirty = pruned > 0;

        let mut visit_recorded = None;
        if let Some(id) = extract_video_id(&page.location().href) {
            if history.record_visit(id, now) {
                visit_recorded = Some(id.to_string());
                dirty = true;
            }
        }
        if dirty {
            self.store.persist(&history)?;
        }

        let stats = self.reconciler.mark_all(page, &history);
        self.history = history;
        self.history_loaded = true;
        Ok(PassReport {
            pruned,
            visit_recorded,
            stats,
        })
    }

    /// Manual toggle: on a qualifying pointer action over a video link,
    /// flip that video's membership, persist, and re-mark. Not a full
    /// pass: no prune, no visit recording, no history reload.
    pub fn handle_pointer(
        &mut self,
        page: &mut dyn PageView,
        action: PointerAction,
        now: DateTime<Utc>,
    ) -> Result<ToggleOutcome, StoreError> {
        if !toggle::qualifies(&action, &self.config.marker_mouse_buttons) {
            return Ok(ToggleOutcome::Ignored);
        }
        let Some(href) = page.nearest_anchor_href(action.target) else {
            return Ok(ToggleOutcome::NoAnchor);
        };
        let Some(id) = extract_video_id(&href) else {
            return Ok(ToggleOutcome::NoVideoId);
        };
        let id = id.to_string();
        // A toggle before any pass must not clobber stored history with an
        // empty in-memory one.
        if !self.history_loaded {
            self.history = self.store.load()?;
            self.history_loaded = true;
        }
        let toggled = self.history.toggle(&id, now);
        self.store.persist(&self.history)?;
        self.reconciler.mark_all(page, &self.history);
        debug!(%id, ?toggled, "manual marker toggle");
        Ok(ToggleOutcome::Toggled(toggled))
    }

    pub fn intercepts_context_menu(&self) -> bool {
        toggle::intercepts_context_menu(&self.config.marker_mouse_buttons)
    }

    pub fn pending_scan_at(&self) -> Option<DateTime<Utc>> {
        self.scheduler.pending_due_at()
    }

    pub fn history(&self) -> &WatchedHistory {
        &self.history
    }

    pub fn config(&self) -> &MarkerConfig {
        &self.config
    }

    pub fn store(&self) -> &HistoryStore<S> {
        &self.store
    }
}
