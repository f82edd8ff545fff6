use crate::page::PageView;
use regex::Regex;
use tracing::debug;
use watchmark_core::extract_video_id;
use watchmark_store::WatchedHistory;

/// One structural selector describing video-item containers in a particular
/// page-layout generation, optionally gated on the location path. The table
/// is deliberately redundant across markup generations: running every
/// selector on every pass is cheap and avoids detecting which generation is
/// live. Adding a layout variant is a data change here, not a logic change.
#[derive(Debug, Clone, Copy)]
pub struct SelectorRule {
    pub selector: &'static str,
    pub path_gate: Option<&'static str>,
}

const fn rule(selector: &'static str) -> SelectorRule {
    SelectorRule {
        selector,
        path_gate: None,
    }
}

pub const SELECTOR_RULES: &[SelectorRule] = &[
    // home page
    rule(".yt-uix-shelfslider-list>.yt-shelf-grid-item"),
    // subscriptions page
    rule(".multirow-shelf>.shelf-content>.yt-shelf-grid-item"),
    // channel/user home page, legacy then current markup
    rule("#contents>.ytd-item-section-renderer>.ytd-newspaper-renderer"),
    rule("#items>.yt-horizontal-list-renderer"),
    rule("#contents>.ytd-channel-featured-content-renderer"),
    rule("#contents>.ytd-shelf-renderer>#grid-container>.ytd-expanded-shelf-contents-renderer"),
    // channel/user video page
    rule(".yt-uix-slider-list>.featured-content-item"),
    rule("#items>.ytd-grid-renderer"),
    // channel/user playlist page
    rule(".expanded-shelf>.expanded-shelf-content-list>.expanded-shelf-content-item-wrapper"),
    // channel/user playlist item page
    rule(".pl-video-list .pl-video-table .pl-video"),
    // channel/user videos page
    rule(".channels-browse-content-grid>.channels-content-item"),
    // channel/user search page; ambiguous with other browse layouts, so
    // only applied on the search sub-path
    SelectorRule {
        selector: ".ytd-browse #contents>.ytd-item-section-renderer",
        path_gate: Some(r"^/(?:channel|user)/.*?/search"),
    },
    // search page, legacy then current markup
    rule("#results>.section-list .item-section>li"),
    rule("#browse-items-primary>.browse-list-item-container"),
    rule(".ytd-search #contents>.ytd-item-section-renderer"),
    // video page sidebar, legacy then current markup
    rule(".watch-sidebar-body>.video-list>.video-list-item"),
    rule(".playlist-videos-container>.playlist-videos-list>li"),
    rule("#items>.ytd-watch-next-secondary-results-renderer .ytd-compact-video-renderer"),
];

/// Marker appearance for every known layout variant, injected once at
/// session start.
pub const WATCHED_STYLESHEET: &str = "\
/* subscription page, channel/user home page feeds */
.watched .yt-lockup-content, .watched .yt-lockup-content *,
/* channel/user home page videos, channel/user videos page */
.watched .channels-content-item,
/* video page */
.watched,
.watched .content-wrapper,
.watched>a
    { background-color: #cec }
.playlist-videos-container>.playlist-videos-list>li.watched,
.playlist-videos-container>.playlist-videos-list>li.watched>a,
.playlist-videos-container>.playlist-videos-list>li.watched .yt-ui-ellipsis
    { background-color: #030 !important }
";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MarkStats {
    pub marked: usize,
    pub unmarked: usize,
    /// Containers left untouched: no discoverable anchor, or an anchor
    /// without an extractable video id.
    pub skipped: usize,
}

/// Applies the watched marker across every layout variant of the page.
#[derive(Debug)]
pub struct Reconciler {
    gates: Vec<Option<Regex>>,
}

impl Reconciler {
    pub fn new() -> Self {
        let gates = SELECTOR_RULES
            .iter()
            .map(|rule| {
                rule.path_gate
                    .map(|gate| Regex::new(gate).expect("valid path gate pattern"))
            })
            .collect();
        Self { gates }
    }

    /// Run every selector rule against the page, marking containers whose
    /// video id is in `history` and unmarking the rest. Containers without
    /// a definitive id keep whatever state they had.
    pub fn mark_all(&self, page: &mut dyn PageView, history: &WatchedHistory) -> MarkStats {
        let path = page.location().path.clone();
        let mut stats = MarkStats::default();
        for (rule, gate) in SELECTOR_RULES.iter().zip(&self.gates) {
            if let Some(gate) = gate {
                if !gate.is_match(&path) {
                    continue;
                }
            }
            self.mark_selector(page, rule.selector, history, &mut stats);
        }
        debug!(
            marked = stats.marked,
            unmarked = stats.unmarked,
            skipped = stats.skipped,
            "reconciled page"
        );
        stats
    }

    fn mark_selector(
        &self,
        page: &mut dyn PageView,
        selector: &str,
        history: &WatchedHistory,
        stats: &mut MarkStats,
    ) {
        for node in page.query_containers(selector) {
            let Some(href) = page.first_anchor_href(node) else {
                stats.skipped += 1;
                continue;
            };
            let Some(id) = extract_video_id(&href) else {
                stats.skipped += 1;
                continue;
            };
            if history.contains(id) {
                page.set_watched_marker(node, true);
                stats.marked += 1;
            } else {
                page.set_watched_marker(node, false);
                stats.unmarked += 1;
            }
        }
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}
