use serde::{Deserialize, Serialize};

/// Opaque handle to an element inside a [`PageView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Where the page currently is. `path` gates the channel-search selector;
/// `href` is what the visit recorder extracts the current video id from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLocation {
    pub href: String,
    pub path: String,
}

impl PageLocation {
    pub fn new(href: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            path: path.into(),
        }
    }

    /// Derive the path component from a full URL. Unparseable input gets
    /// the root path; location data is advisory, never fatal.
    pub fn from_href(href: impl Into<String>) -> Self {
        let href = href.into();
        let path = url::Url::parse(&href)
            .map(|parsed| parsed.path().to_string())
            .unwrap_or_else(|_| "/".to_string());
        Self { href, path }
    }
}

/// The engine's view of the host page. The host owns selector matching and
/// the actual element tree; the engine only walks handles, reads anchor
/// hrefs, and flips the single watched marker.
pub trait PageView {
    fn location(&self) -> &PageLocation;

    /// All container elements matching a structural selector.
    fn query_containers(&self, selector: &str) -> Vec<NodeId>;

    /// Href of the first descendant anchor of a container, if any.
    fn first_anchor_href(&self, node: NodeId) -> Option<String>;

    /// Href of the node itself if it is an anchor, else of its nearest
    /// ancestor anchor.
    fn nearest_anchor_href(&self, node: NodeId) -> Option<String>;

    fn set_watched_marker(&mut self, node: NodeId, watched: bool);

    /// Whether an element with this DOM id exists yet. Hook probes poll
    /// this until the host page has built its late-appearing chrome.
    fn element_exists(&self, dom_id: &str) -> bool;

    fn inject_stylesheet(&mut self, css: &str);
}
