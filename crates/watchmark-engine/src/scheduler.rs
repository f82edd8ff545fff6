use crate::page::PageView;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use tracing::debug;
use watchmark_core::MarkerConfig;

/// Why a reconciliation pass was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanTrigger {
    /// The document finished loading (once per real page load).
    DocumentLoaded,
    /// The host framework reported a new content fragment processed.
    FragmentProcessed,
    /// The viewport-load hook fired.
    ViewportLoaded,
    /// The renderer-stamping hook fired.
    RendererStamped,
    /// The window regained focus after having lost it.
    FocusRegained,
    /// An asynchronous request to an ajax endpoint completed.
    AjaxCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub page_load_delay_ms: u64,
    pub content_load_delay_ms: u64,
    /// Debounce applied to the hook-driven render signals.
    pub viewport_debounce_ms: u64,
    /// Base delay for focus and ajax triggers.
    pub base_delay_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            page_load_delay_ms: 400,
            content_load_delay_ms: 600,
            viewport_debounce_ms: 300,
            base_delay_ms: 200,
        }
    }
}

impl SchedulerConfig {
    pub fn from_marker(config: &MarkerConfig) -> Self {
        Self {
            page_load_delay_ms: config.page_load_mark_delay_ms,
            content_load_delay_ms: config.content_load_mark_delay_ms,
            ..Self::default()
        }
    }

    fn delay_for(&self, trigger: ScanTrigger) -> Duration {
        let ms = match trigger {
            ScanTrigger::DocumentLoaded => self.page_load_delay_ms,
            ScanTrigger::FragmentProcessed => self.content_load_delay_ms,
            ScanTrigger::ViewportLoaded | ScanTrigger::RendererStamped => self.viewport_debounce_ms,
            ScanTrigger::FocusRegained | ScanTrigger::AjaxCompleted => self.base_delay_ms,
        };
        Duration::milliseconds(ms.min(i64::MAX as u64) as i64)
    }
}

/// A claimed scan: the trigger that won the debounce and its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTicket {
    pub trigger: ScanTrigger,
    pub scheduled_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
}

/// Debounced scan scheduling. Two states: idle, or exactly one pending
/// scan. A trigger while pending cancels and replaces the deadline rather
/// than queuing a second scan. The host drives the clock: events go in via
/// [`schedule`], and [`claim_due`] hands back the ticket once the deadline
/// has passed.
#[derive(Debug, Default)]
pub struct ScanScheduler {
    config: SchedulerConfig,
    pending: Option<ScanTicket>,
}

impl ScanScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            pending: None,
        }
    }

    pub fn schedule(&mut self, trigger: ScanTrigger, now: DateTime<Utc>) {
        let due_at = now + self.config.delay_for(trigger);
        debug!(?trigger, %due_at, rescheduled = self.pending.is_some(), "scan scheduled");
        self.pending = Some(ScanTicket {
            trigger,
            scheduled_at: now,
            due_at,
        });
    }

    pub fn claim_due(&mut self, now: DateTime<Utc>) -> Option<ScanTicket> {
        if self.pending.map(|ticket| ticket.due_at <= now)? {
            self.pending.take()
        } else {
            None
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn pending_due_at(&self) -> Option<DateTime<Utc>> {
        self.pending.map(|ticket| ticket.due_at)
    }
}

/// Focus transitions. Only a blur followed by a focus warrants a scan: the
/// video may have finished while the tab was backgrounded.
#[derive(Debug)]
pub struct FocusTracker {
    focused: bool,
}

impl FocusTracker {
    pub fn new(initially_focused: bool) -> Self {
        Self {
            focused: initially_focused,
        }
    }

    pub fn note_blur(&mut self) {
        self.focused = false;
    }

    /// Returns true when focus was actually regained (was blurred before).
    pub fn note_focus(&mut self) -> bool {
        let regained = !self.focused;
        self.focused = true;
        regained
    }
}

/// Recognizes completed asynchronous requests that signal fragment
/// navigation. Registration-style: the host's network layer reports
/// completions here; the engine never wraps host globals and never issues
/// requests of its own.
#[derive(Debug)]
pub struct RequestObserver {
    endpoint: Regex,
}

impl RequestObserver {
    pub fn new() -> Self {
        Self {
            endpoint: Regex::new(r"/\w+_ajax\?").expect("valid ajax endpoint pattern"),
        }
    }

    /// Whether this completed request URL means page content was replaced.
    pub fn completed(&self, url: &str) -> bool {
        self.endpoint.is_match(url)
    }
}

impl Default for RequestObserver {
    fn default() -> Self {
        Self::new()
    }
}

pub const HOOK_POLL_INTERVAL_MS: i64 = 100;

/// A late-appearing DOM hook: once `dom_id` exists, the host attaches a
/// listener for `event_name` and feeds `trigger` on every firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookSpec {
    pub dom_id: &'static str,
    pub event_name: &'static str,
    pub trigger: ScanTrigger,
}

/// Initialization milestones covered across both content-loading
/// architectures the host site has shipped.
pub const DOM_HOOKS: &[HookSpec] = &[
    HookSpec {
        dom_id: "visibility-monitor",
        event_name: "viewport-load",
        trigger: ScanTrigger::ViewportLoaded,
    },
    HookSpec {
        dom_id: "masthead",
        event_name: "yt-rendererstamper-finished",
        trigger: ScanTrigger::RendererStamped,
    },
];

/// Fixed-interval poll for one DOM hook. There is no event to observe for
/// "this element now exists", so the probe re-checks on a short interval
/// until found, then resolves exactly once. Cancellable.
#[derive(Debug)]
pub struct HookProbe {
    spec: HookSpec,
    next_poll_at: Option<DateTime<Utc>>,
    resolved: bool,
}

impl HookProbe {
    pub fn new(spec: HookSpec) -> Self {
        Self {
            spec,
            next_poll_at: None,
            resolved: false,
        }
    }

    /// Check for the hook element if the interval has elapsed. Returns the
    /// spec on the poll that first finds it; `None` ever after.
    pub fn poll(&mut self, page: &dyn PageView, now: DateTime<Utc>) -> Option<HookSpec> {
        if self.resolved {
            return None;
        }
        if let Some(next) = self.next_poll_at {
            if now < next {
                return None;
            }
        }
        self.next_poll_at = Some(now + Duration::milliseconds(HOOK_POLL_INTERVAL_MS));
        if page.element_exists(self.spec.dom_id) {
            self.resolved = true;
            debug!(dom_id = self.spec.dom_id, "hook element found");
            Some(self.spec)
        } else {
            None
        }
    }

    pub fn cancel(&mut self) {
        self.resolved = true;
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }
}
