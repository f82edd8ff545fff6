use crate::page::{NodeId, PageLocation, PageView};
use serde::{Deserialize, Serialize};

/// One video container in a serialized page snapshot. `matches` lists the
/// structural selectors this container satisfies; selector matching itself
/// happens on the host side of the page boundary, so a snapshot records its
/// outcome instead of re-implementing a CSS engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotContainer {
    #[serde(default)]
    pub matches: Vec<String>,
    #[serde(default)]
    pub anchor_href: Option<String>,
    #[serde(default)]
    pub watched: bool,
}

/// Serde-loadable [`PageView`] implementation backing the CLI and the test
/// suites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPage {
    pub location: PageLocation,
    #[serde(default)]
    pub containers: Vec<SnapshotContainer>,
    /// DOM ids of elements present on the page, for hook probing.
    #[serde(default)]
    pub elements: Vec<String>,
    #[serde(default)]
    pub stylesheets: Vec<String>,
}

impl SnapshotPage {
    pub fn new(location: PageLocation) -> Self {
        Self {
            location,
            containers: Vec::new(),
            elements: Vec::new(),
            stylesheets: Vec::new(),
        }
    }

    /// Add a container matching `selector` whose first anchor links to
    /// `href`. Returns the new container's handle.
    pub fn push_container(&mut self, selector: &str, href: Option<&str>) -> NodeId {
        self.containers.push(SnapshotContainer {
            matches: vec![selector.to_string()],
            anchor_href: href.map(str::to_string),
            watched: false,
        });
        NodeId(self.containers.len() - 1)
    }

    pub fn container(&self, node: NodeId) -> Option<&SnapshotContainer> {
        self.containers.get(node.0)
    }

    pub fn is_watched(&self, node: NodeId) -> bool {
        self.container(node).map(|c| c.watched).unwrap_or(false)
    }
}

impl PageView for SnapshotPage {
    fn location(&self) -> &PageLocation {
        &self.location
    }

    fn query_containers(&self, selector: &str) -> Vec<NodeId> {
        self.containers
            .iter()
            .enumerate()
            .filter(|(_, container)| container.matches.iter().any(|m| m == selector))
            .map(|(index, _)| NodeId(index))
            .collect()
    }

    fn first_anchor_href(&self, node: NodeId) -> Option<String> {
        self.container(node).and_then(|c| c.anchor_href.clone())
    }

    fn nearest_anchor_href(&self, node: NodeId) -> Option<String> {
        // Snapshot nodes are containers; the container's anchor is the
        // nearest one a pointer action inside it would resolve to.
        self.first_anchor_href(node)
    }

    fn set_watched_marker(&mut self, node: NodeId, watched: bool) {
        if let Some(container) = self.containers.get_mut(node.0) {
            container.watched = watched;
        }
    }

    fn element_exists(&self, dom_id: &str) -> bool {
        self.elements.iter().any(|id| id == dom_id)
    }

    fn inject_stylesheet(&mut self, css: &str) {
        self.stylesheets.push(css.to_string());
    }
}
