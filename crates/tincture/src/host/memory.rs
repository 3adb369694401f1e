//! A headless, in-memory document.
//!
//! [`MemoryDocument`] implements every [`Host`] capability without a
//! browser. It serves two purposes:
//!
//! - **Server rendering**: register themes against a memory document, then
//!   ship [`MemoryStyleSheet::css_text`] inside a `<style>` tag and the
//!   container's `data-theme` attribute with the page.
//! - **Testing**: drive the OS preference with [`MemoryPreference::set`] and
//!   inspect attributes and rules directly.
//!
//! Selector support is deliberately small: `#id`, `.class`, `tag`, `[attr]`
//! and `[attr="value"]`, one simple selector at a time.
//!
//! ```rust
//! use tincture::host::memory::MemoryDocument;
//! use tincture::{ColorMode, ThemeManager, ThemeManagerConfig, ThemeVariables};
//!
//! let doc = MemoryDocument::with_preference(ColorMode::Dark);
//! let manager = ThemeManager::new(&doc, ThemeManagerConfig::new()).unwrap();
//! manager.register("dark", ThemeVariables::new().set("--bg", "#000")).unwrap();
//!
//! // The "dark" theme mirrors the system preference through "default".
//! assert_eq!(manager.current_theme().unwrap().as_deref(), Some("default"));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::{ElementHandle, Host, PreferenceCallback, PreferenceWatcher, StyleSheetHandle};
use crate::error::{Result, ThemeError};
use crate::theme::ColorMode;

/// Attribute marking style elements created by a manager.
pub const STYLE_MARKER_ATTRIBUTE: &str = "data-tincture";

type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug)]
struct Node {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    rules: Vec<String>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
            parent: None,
            rules: Vec::new(),
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug)]
struct DocumentState {
    nodes: Vec<Node>,
}

impl DocumentState {
    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|child| *child != id);
        }
    }

    fn is_connected(&self, mut id: NodeId) -> bool {
        loop {
            if id == ROOT {
                return true;
            }
            match self.nodes[id].parent {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    fn find(&self, id: NodeId, selector: &SimpleSelector) -> Option<NodeId> {
        if selector.matches(&self.nodes[id]) {
            return Some(id);
        }
        self.nodes[id]
            .children
            .iter()
            .find_map(|child| self.find(*child, selector))
    }
}

/// An in-memory document with an `<html>` root.
#[derive(Clone)]
pub struct MemoryDocument {
    state: Rc<RefCell<DocumentState>>,
    preference: MemoryPreference,
}

impl MemoryDocument {
    /// Creates a document whose system preference is light.
    pub fn new() -> Self {
        Self::with_preference(ColorMode::Light)
    }

    /// Creates a document with the given initial system preference.
    pub fn with_preference(mode: ColorMode) -> Self {
        Self::from_preference(MemoryPreference::new(mode))
    }

    /// Creates a document driven by an existing preference signal.
    ///
    /// Documents built from clones of one preference all see its changes.
    pub fn from_preference(preference: MemoryPreference) -> Self {
        Self {
            state: Rc::new(RefCell::new(DocumentState {
                nodes: vec![Node::new("html")],
            })),
            preference,
        }
    }

    /// The preference signal behind this document's watchers.
    pub fn preference(&self) -> &MemoryPreference {
        &self.preference
    }

    /// The `<html>` element.
    pub fn root(&self) -> MemoryElement {
        self.element(ROOT)
    }

    /// Creates a detached element.
    pub fn create_element(&self, tag: &str) -> MemoryElement {
        let id = {
            let mut state = self.state.borrow_mut();
            state.nodes.push(Node::new(tag));
            state.nodes.len() - 1
        };
        self.element(id)
    }

    fn element(&self, id: NodeId) -> MemoryElement {
        MemoryElement {
            state: Rc::clone(&self.state),
            id,
        }
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("nodes", &self.state.borrow().nodes.len())
            .field("preference", &self.preference.get())
            .finish()
    }
}

/// A handle to one element of a [`MemoryDocument`].
#[derive(Clone)]
pub struct MemoryElement {
    state: Rc<RefCell<DocumentState>>,
    id: NodeId,
}

impl MemoryElement {
    pub fn tag_name(&self) -> String {
        self.state.borrow().nodes[self.id].tag.clone()
    }

    /// Sets an attribute, returning `self` for chaining.
    pub fn with_attribute(self, name: &str, value: &str) -> Self {
        self.write_attribute(name, value);
        self
    }

    /// Appends `child`, moving it from any previous parent.
    pub fn append_child(&self, child: &MemoryElement) {
        let mut state = self.state.borrow_mut();
        state.detach(child.id);
        state.nodes[self.id].children.push(child.id);
        state.nodes[child.id].parent = Some(self.id);
    }

    /// Inserts `child` before every existing child.
    pub fn prepend_child(&self, child: &MemoryElement) {
        let mut state = self.state.borrow_mut();
        state.detach(child.id);
        state.nodes[self.id].children.insert(0, child.id);
        state.nodes[child.id].parent = Some(self.id);
    }

    /// Detaches this element from its parent.
    pub fn remove(&self) {
        self.state.borrow_mut().detach(self.id);
    }

    pub fn children(&self) -> Vec<MemoryElement> {
        let ids = self.state.borrow().nodes[self.id].children.clone();
        ids.into_iter()
            .map(|id| MemoryElement {
                state: Rc::clone(&self.state),
                id,
            })
            .collect()
    }

    pub fn first_child(&self) -> Option<MemoryElement> {
        self.children().into_iter().next()
    }

    /// Whether the element is reachable from the document root.
    pub fn is_connected(&self) -> bool {
        self.state.borrow().is_connected(self.id)
    }

    fn write_attribute(&self, name: &str, value: &str) {
        let mut state = self.state.borrow_mut();
        let attributes = &mut state.nodes[self.id].attributes;
        match attributes.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
    }

    fn belongs_to(&self, state: &Rc<RefCell<DocumentState>>) -> bool {
        Rc::ptr_eq(&self.state, state)
    }
}

impl PartialEq for MemoryElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state) && self.id == other.id
    }
}

impl fmt::Debug for MemoryElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryElement")
            .field("id", &self.id)
            .field("tag", &self.tag_name())
            .finish()
    }
}

impl ElementHandle for MemoryElement {
    fn get_attribute(&self, name: &str) -> Option<String> {
        self.state.borrow().nodes[self.id]
            .attribute(name)
            .map(str::to_string)
    }

    fn set_attribute(&self, name: &str, value: &str) -> Result<()> {
        self.write_attribute(name, value);
        Ok(())
    }

    fn remove_attribute(&self, name: &str) -> Result<()> {
        self.state.borrow_mut().nodes[self.id]
            .attributes
            .retain(|(key, _)| key != name);
        Ok(())
    }
}

/// The rule list of a `<style>` element in a [`MemoryDocument`].
#[derive(Debug, Clone)]
pub struct MemoryStyleSheet {
    element: MemoryElement,
}

impl MemoryStyleSheet {
    /// The `<style>` element holding the rules.
    pub fn element(&self) -> &MemoryElement {
        &self.element
    }

    /// Rules in sheet order.
    pub fn rules(&self) -> Vec<String> {
        self.element.state.borrow().nodes[self.element.id].rules.clone()
    }

    /// Every rule joined by newlines, ready for a `<style>` tag.
    pub fn css_text(&self) -> String {
        self.rules().join("\n")
    }

    pub fn is_attached(&self) -> bool {
        self.element.is_connected()
    }
}

impl StyleSheetHandle for MemoryStyleSheet {
    fn insert_rule(&self, rule: &str, index: usize) -> Result<usize> {
        let rule = rule.trim();
        if !rule.ends_with('}') || !rule.contains('{') {
            return Err(ThemeError::StyleSheet(format!("not a style rule: {}", rule)));
        }
        let mut state = self.element.state.borrow_mut();
        let rules = &mut state.nodes[self.element.id].rules;
        if index > rules.len() {
            return Err(ThemeError::StyleSheet(format!(
                "rule index {} out of range (sheet has {} rules)",
                index,
                rules.len()
            )));
        }
        rules.insert(index, rule.to_string());
        Ok(index)
    }

    fn delete_rule(&self, index: usize) -> Result<()> {
        let mut state = self.element.state.borrow_mut();
        let rules = &mut state.nodes[self.element.id].rules;
        if index >= rules.len() {
            return Err(ThemeError::StyleSheet(format!(
                "rule index {} out of range (sheet has {} rules)",
                index,
                rules.len()
            )));
        }
        rules.remove(index);
        Ok(())
    }

    fn rule_count(&self) -> usize {
        self.element.state.borrow().nodes[self.element.id].rules.len()
    }

    fn detach(&self) {
        self.element.remove();
    }
}

struct PreferenceState {
    mode: ColorMode,
    subscribers: Vec<(u64, PreferenceCallback)>,
    next_id: u64,
}

/// A settable light/dark preference shared by a document's watchers.
#[derive(Clone)]
pub struct MemoryPreference {
    state: Rc<RefCell<PreferenceState>>,
}

impl MemoryPreference {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            state: Rc::new(RefCell::new(PreferenceState {
                mode,
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    pub fn get(&self) -> ColorMode {
        self.state.borrow().mode
    }

    /// Changes the preference, notifying subscribers if it differs.
    pub fn set(&self, mode: ColorMode) {
        let callbacks: Vec<PreferenceCallback> = {
            let mut state = self.state.borrow_mut();
            if state.mode == mode {
                return;
            }
            state.mode = mode;
            state
                .subscribers
                .iter()
                .map(|(_, callback)| Rc::clone(callback))
                .collect()
        };
        for callback in callbacks {
            callback(mode);
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().subscribers.len()
    }

    fn subscribe(&self, callback: PreferenceCallback) -> u64 {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.push((id, callback));
        id
    }

    fn unsubscribe(&self, id: u64) {
        self.state
            .borrow_mut()
            .subscribers
            .retain(|(existing, _)| *existing != id);
    }
}

impl fmt::Debug for MemoryPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPreference")
            .field("mode", &self.get())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// A subscription handed out by [`MemoryDocument::watch_color_scheme`].
///
/// Dropping the watcher unsubscribes it.
#[derive(Debug)]
pub struct MemoryWatcher {
    preference: MemoryPreference,
    subscriptions: Vec<u64>,
}

impl PreferenceWatcher for MemoryWatcher {
    fn current(&self) -> ColorMode {
        self.preference.get()
    }

    fn on_change(&mut self, callback: PreferenceCallback) -> Result<()> {
        let id = self.preference.subscribe(callback);
        self.subscriptions.push(id);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.preference.unsubscribe(id);
        }
    }
}

impl Drop for MemoryWatcher {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// One simple selector.
#[derive(Debug, PartialEq)]
enum SimpleSelector {
    Id(String),
    Class(String),
    Tag(String),
    Attribute { name: String, value: Option<String> },
}

impl SimpleSelector {
    fn parse(selector: &str) -> Result<Self> {
        let selector = selector.trim();
        let unsupported = || {
            ThemeError::Configuration(format!(
                "unsupported selector '{}': expected #id, .class, tag or [attr=value]",
                selector
            ))
        };
        if selector.is_empty()
            || selector
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, ',' | '>' | '+' | '~'))
                && !selector.starts_with('[')
        {
            return Err(unsupported());
        }

        let parsed = if let Some(id) = selector.strip_prefix('#') {
            SimpleSelector::Id(id.to_string())
        } else if let Some(class) = selector.strip_prefix('.') {
            SimpleSelector::Class(class.to_string())
        } else if let Some(inner) = selector
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            match inner.split_once('=') {
                Some((name, value)) => SimpleSelector::Attribute {
                    name: name.trim().to_string(),
                    value: Some(value.trim().trim_matches(|c| c == '"' || c == '\'').to_string()),
                },
                None => SimpleSelector::Attribute {
                    name: inner.trim().to_string(),
                    value: None,
                },
            }
        } else if selector.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            SimpleSelector::Tag(selector.to_ascii_lowercase())
        } else {
            return Err(unsupported());
        };

        match &parsed {
            SimpleSelector::Id(s) | SimpleSelector::Class(s) if s.is_empty() => Err(unsupported()),
            SimpleSelector::Attribute { name, .. } if name.is_empty() => Err(unsupported()),
            _ => Ok(parsed),
        }
    }

    fn matches(&self, node: &Node) -> bool {
        match self {
            SimpleSelector::Id(id) => node.attribute("id") == Some(id.as_str()),
            SimpleSelector::Class(class) => node
                .attribute("class")
                .is_some_and(|classes| classes.split_whitespace().any(|c| c == class)),
            SimpleSelector::Tag(tag) => node.tag == *tag,
            SimpleSelector::Attribute { name, value } => match (node.attribute(name), value) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            },
        }
    }
}

impl Host for MemoryDocument {
    type Element = MemoryElement;
    type Sheet = MemoryStyleSheet;
    type Watcher = MemoryWatcher;

    fn document_element(&self) -> Result<MemoryElement> {
        Ok(self.root())
    }

    fn query_selector(&self, selector: &str) -> Result<Option<MemoryElement>> {
        let selector = SimpleSelector::parse(selector)?;
        let found = self.state.borrow().find(ROOT, &selector);
        Ok(found.map(|id| self.element(id)))
    }

    fn is_valid_element(&self, element: &MemoryElement) -> bool {
        element.belongs_to(&self.state) && element.is_connected()
    }

    fn inject_style_sheet(&self, container: &MemoryElement) -> Result<MemoryStyleSheet> {
        let style = self
            .create_element("style")
            .with_attribute(STYLE_MARKER_ATTRIBUTE, "");
        container.prepend_child(&style);
        Ok(MemoryStyleSheet { element: style })
    }

    fn watch_color_scheme(&self) -> Result<MemoryWatcher> {
        Ok(MemoryWatcher {
            preference: self.preference.clone(),
            subscriptions: Vec::new(),
        })
    }
}
