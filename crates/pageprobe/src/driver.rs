//! PageDriver - Abstract Browser Automation Trait
//!
//! Components talk to the browser only through [`PageDriver`], a narrow
//! capability surface: navigation, address reads, element counting and
//! visibility, click, fill, attribute/text/computed-style reads. Bounded waits
//! are layered on top of these reads by [`crate::wait::Waiter`].
//!
//! # Implementations
//!
//! - `CdpDriver` (feature `browser`) - Chrome DevTools Protocol via chromiumoxide
//! - [`MockDriver`] - in-memory page for unit and integration tests

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};

/// Abstract driver trait for browser automation.
///
/// Element-targeting methods act on the first element the locator matches.
/// Methods that need an element fail with `ElementNotFound` when nothing
/// matches; `count`, `is_visible` and `all_text_contents` never do.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to URL
    async fn navigate(&self, url: &str) -> ProbeResult<()>;

    /// Get current URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Count matching elements
    async fn count(&self, locator: &Locator) -> ProbeResult<usize>;

    /// Whether the first match exists and is rendered visible
    async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool>;

    /// Click the first match
    async fn click(&self, locator: &Locator) -> ProbeResult<()>;

    /// Replace the value of the first matching input
    async fn fill(&self, locator: &Locator, text: &str) -> ProbeResult<()>;

    /// Read an attribute of the first match (`None` when the attribute is absent)
    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>>;

    /// Read the text content of the first match
    async fn text_content(&self, locator: &Locator) -> ProbeResult<String>;

    /// Read the text content of every match, in document order
    async fn all_text_contents(&self, locator: &Locator) -> ProbeResult<Vec<String>>;

    /// Read a computed style property of the first match
    async fn computed_style(&self, locator: &Locator, property: &str) -> ProbeResult<Option<String>>;

    /// Close the browser
    async fn close(&self) -> ProbeResult<()>;
}

// ============================================================================
// In-memory page
// ============================================================================

/// Identifier of a node in a [`FakeDom`]
pub type NodeId = usize;

type ClickHandler = Arc<dyn Fn(&mut FakeDom, NodeId) + Send + Sync>;
type NavigateHandler = Arc<dyn Fn(&mut FakeDom, &str) + Send + Sync>;
type Deferred = Box<dyn FnOnce(&mut FakeDom) + Send>;

/// A node of the in-memory page
#[derive(Debug, Clone)]
pub struct FakeNode {
    /// Lowercase tag name
    pub tag: String,
    /// Attributes, `class` included
    pub attributes: BTreeMap<String, String>,
    /// Own text
    pub text: String,
    /// Rendered visible (ancestors must be visible too)
    pub visible: bool,
    /// Computed style overrides
    pub styles: BTreeMap<String, String>,
    /// Current input value
    pub value: String,
    /// Parent node, `None` for top-level nodes
    pub parent: Option<NodeId>,
}

/// In-memory DOM with click reactions and delayed mutations.
///
/// Each driver call advances the page by one tick; mutations scheduled with
/// [`FakeDom::defer`] run once their tick count elapses, which models
/// asynchronous rendering such as carousel transitions.
pub struct FakeDom {
    url: String,
    nodes: Vec<FakeNode>,
    on_click: HashMap<NodeId, ClickHandler>,
    on_navigate: Option<NavigateHandler>,
    deferred: Vec<(u32, Deferred)>,
    context_lost: u32,
}

impl fmt::Debug for FakeDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeDom")
            .field("url", &self.url)
            .field("nodes", &self.nodes.len())
            .field("deferred", &self.deferred.len())
            .field("context_lost", &self.context_lost)
            .finish_non_exhaustive()
    }
}

impl Default for FakeDom {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

impl FakeDom {
    /// Create an empty page at `url`
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            nodes: Vec::new(),
            on_click: HashMap::new(),
            on_navigate: None,
            deferred: Vec::new(),
            context_lost: 0,
        }
    }

    /// Append a visible node under `parent`
    pub fn append(
        &mut self,
        parent: Option<NodeId>,
        tag: &str,
        attributes: &[(&str, &str)],
        text: &str,
    ) -> NodeId {
        self.nodes.push(FakeNode {
            tag: tag.to_ascii_lowercase(),
            attributes: attributes
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            text: text.to_string(),
            visible: true,
            styles: BTreeMap::new(),
            value: String::new(),
            parent,
        });
        self.nodes.len() - 1
    }

    /// Borrow a node
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&FakeNode> {
        self.nodes.get(id)
    }

    /// Current address
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Change the address without navigating
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Drop every node, click reaction and pending mutation, as a fresh
    /// document load would. The address and navigation reaction stay.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.on_click.clear();
        self.deferred.clear();
    }

    /// Set or replace an attribute
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(id) {
            let _ = node.attributes.insert(name.to_string(), value.to_string());
        }
    }

    /// Add a class if missing
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        if let Some(node) = self.nodes.get_mut(id) {
            let entry = node.attributes.entry("class".to_string()).or_default();
            if !entry.is_empty() {
                entry.push(' ');
            }
            entry.push_str(class);
        }
    }

    /// Remove a class if present
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(node) = self.nodes.get_mut(id) {
            if let Some(attr) = node.attributes.get_mut("class") {
                *attr = attr
                    .split_whitespace()
                    .filter(|c| *c != class)
                    .collect::<Vec<_>>()
                    .join(" ");
            }
        }
    }

    /// Whether a node carries a class
    #[must_use]
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.nodes.get(id).is_some_and(|n| {
            crate::markup::has_class(n.attributes.get("class").map(String::as_str), class)
        })
    }

    /// Replace a node's own text
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.text = text.to_string();
        }
    }

    /// Show or hide a node (and, through it, its descendants)
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.visible = visible;
        }
    }

    /// Set a computed style property
    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(id) {
            let _ = node.styles.insert(property.to_string(), value.to_string());
        }
    }

    /// Current value of an input
    #[must_use]
    pub fn value(&self, id: NodeId) -> &str {
        self.nodes.get(id).map_or("", |n| n.value.as_str())
    }

    /// Register a click reaction
    pub fn on_click<F>(&mut self, id: NodeId, handler: F)
    where
        F: Fn(&mut Self, NodeId) + Send + Sync + 'static,
    {
        let _ = self.on_click.insert(id, Arc::new(handler));
    }

    /// Register a navigation reaction
    pub fn on_navigate<F>(&mut self, handler: F)
    where
        F: Fn(&mut Self, &str) + Send + Sync + 'static,
    {
        self.on_navigate = Some(Arc::new(handler));
    }

    /// Schedule a mutation to run after `ticks` driver calls
    pub fn defer<F>(&mut self, ticks: u32, mutation: F)
    where
        F: FnOnce(&mut Self) + Send + 'static,
    {
        if ticks == 0 {
            mutation(self);
        } else {
            self.deferred.push((ticks, Box::new(mutation)));
        }
    }

    /// Fail the next `calls` driver calls as if the document were being
    /// swapped out under them
    pub fn lose_context(&mut self, calls: u32) {
        self.context_lost = calls;
    }

    /// Advance the page by one tick
    pub fn tick(&mut self) {
        let pending = std::mem::take(&mut self.deferred);
        let mut ready = Vec::new();
        for (ticks, mutation) in pending {
            if ticks <= 1 {
                ready.push(mutation);
            } else {
                self.deferred.push((ticks - 1, mutation));
            }
        }
        for mutation in ready {
            mutation(self);
        }
    }

    /// Whether a node and all its ancestors are visible
    #[must_use]
    pub fn is_rendered(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            match self.nodes.get(cur) {
                Some(node) if node.visible => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.nodes.get(id).and_then(|n| n.parent);
        while let Some(cur) = current {
            if cur == ancestor {
                return true;
            }
            current = self.nodes.get(cur).and_then(|n| n.parent);
        }
        false
    }

    /// Resolve a locator to node ids in document order
    #[must_use]
    pub fn find(&self, locator: &Locator) -> Vec<NodeId> {
        let mut roots: Option<Vec<NodeId>> = None;
        for segment in locator.chain() {
            let mut found: Vec<NodeId> = (0..self.nodes.len())
                .filter(|&id| {
                    let node = &self.nodes[id];
                    segment.matches(&node.tag, &node.attributes)
                        && roots
                            .as_ref()
                            .map_or(true, |r| r.iter().any(|&root| self.is_descendant_of(id, root)))
                })
                .collect();
            if let Some(n) = segment.nth_index() {
                found = found.get(n).copied().into_iter().collect();
            }
            roots = Some(found);
        }
        roots.unwrap_or_default()
    }

    /// Own text plus the text of all descendants
    #[must_use]
    pub fn text_of(&self, id: NodeId) -> String {
        let mut text = self.nodes.get(id).map(|n| n.text.clone()).unwrap_or_default();
        for child in 0..self.nodes.len() {
            if self.nodes[child].parent == Some(id) {
                text.push_str(&self.text_of(child));
            }
        }
        text
    }

    fn first(&self, locator: &Locator) -> ProbeResult<NodeId> {
        self.find(locator)
            .first()
            .copied()
            .ok_or_else(|| ProbeError::not_found("driver", locator.to_string()))
    }
}

/// Mock driver for unit testing
#[derive(Debug, Default)]
pub struct MockDriver {
    dom: Mutex<FakeDom>,
    call_history: Mutex<Vec<String>>,
}

impl MockDriver {
    /// Create a mock driver over an in-memory page
    #[must_use]
    pub fn new(dom: FakeDom) -> Self {
        Self {
            dom: Mutex::new(dom),
            call_history: Mutex::new(Vec::new()),
        }
    }

    /// Run a closure against the page without advancing it
    pub fn with_dom<T>(&self, f: impl FnOnce(&mut FakeDom) -> T) -> ProbeResult<T> {
        let mut dom = self
            .dom
            .lock()
            .map_err(|_| ProbeError::driver("mock page lock poisoned"))?;
        Ok(f(&mut dom))
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.call_history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.history().iter().any(|c| c.starts_with(method))
    }

    fn record(&self, call: String) {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(call);
        }
    }

    fn step<T>(&self, f: impl FnOnce(&mut FakeDom) -> ProbeResult<T>) -> ProbeResult<T> {
        self.with_dom(|dom| {
            dom.tick();
            if dom.context_lost > 0 {
                dom.context_lost -= 1;
                return Err(ProbeError::ContextLost {
                    message: "Execution context was destroyed".to_string(),
                });
            }
            f(dom)
        })?
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        self.record(format!("navigate:{url}"));
        self.step(|dom| {
            dom.deferred.clear();
            dom.url = url.to_string();
            if let Some(handler) = dom.on_navigate.clone() {
                handler(dom, url);
            }
            Ok(())
        })
    }

    async fn current_url(&self) -> ProbeResult<String> {
        self.step(|dom| Ok(dom.url.clone()))
    }

    async fn count(&self, locator: &Locator) -> ProbeResult<usize> {
        self.step(|dom| Ok(dom.find(locator).len()))
    }

    async fn is_visible(&self, locator: &Locator) -> ProbeResult<bool> {
        self.step(|dom| Ok(dom.find(locator).first().is_some_and(|&id| dom.is_rendered(id))))
    }

    async fn click(&self, locator: &Locator) -> ProbeResult<()> {
        self.record(format!("click:{locator}"));
        self.step(|dom| {
            let id = dom.first(locator)?;
            if !dom.is_rendered(id) {
                return Err(ProbeError::driver(format!(
                    "element not interactable: {locator}"
                )));
            }
            if let Some(handler) = dom.on_click.get(&id).cloned() {
                handler(dom, id);
            }
            Ok(())
        })
    }

    async fn fill(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        self.record(format!("fill:{locator}={text}"));
        self.step(|dom| {
            let id = dom.first(locator)?;
            if !dom.is_rendered(id) {
                return Err(ProbeError::driver(format!(
                    "element not interactable: {locator}"
                )));
            }
            if let Some(node) = dom.nodes.get_mut(id) {
                node.value = text.to_string();
            }
            Ok(())
        })
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>> {
        self.step(|dom| {
            let id = dom.first(locator)?;
            Ok(dom.nodes[id].attributes.get(name).cloned())
        })
    }

    async fn text_content(&self, locator: &Locator) -> ProbeResult<String> {
        self.step(|dom| {
            let id = dom.first(locator)?;
            Ok(dom.text_of(id))
        })
    }

    async fn all_text_contents(&self, locator: &Locator) -> ProbeResult<Vec<String>> {
        self.step(|dom| Ok(dom.find(locator).into_iter().map(|id| dom.text_of(id)).collect()))
    }

    async fn computed_style(&self, locator: &Locator, property: &str) -> ProbeResult<Option<String>> {
        self.step(|dom| {
            let id = dom.first(locator)?;
            let value = dom.nodes[id].styles.get(property).cloned();
            Ok(value.or_else(|| (property == "opacity").then(|| "1".to_string())))
        })
    }

    async fn close(&self) -> ProbeResult<()> {
        self.record("close".to_string());
        Ok(())
    }
}
