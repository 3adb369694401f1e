//! Capabilities the manager needs from its environment.
//!
//! The manager never touches a DOM directly. It talks to a [`Host`], which
//! hands out three small handles:
//!
//! - [`ElementHandle`]: attribute access on the bound container
//! - [`StyleSheetHandle`]: rule insertion and deletion on the owned sheet
//! - [`PreferenceWatcher`]: the live light/dark preference signal
//!
//! The registry, merging and event logic therefore run the same way in a
//! browser (`tincture-web`), in a headless [`memory`] document, or in tests.
//!
//! ## Precondition
//!
//! One container, one manager. Two managers bound to the same container
//! race on its attribute and each inject their own sheet; this is not
//! detected.

pub mod memory;
#[cfg(not(target_arch = "wasm32"))]
pub mod native;

use std::rc::Rc;

use crate::error::Result;
use crate::theme::ColorMode;

/// Callback invoked with the new mode when the preference changes.
pub type PreferenceCallback = Rc<dyn Fn(ColorMode)>;

/// Attribute access on an element.
pub trait ElementHandle {
    fn get_attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&self, name: &str, value: &str) -> Result<()>;
    fn remove_attribute(&self, name: &str) -> Result<()>;
}

/// A style sheet owned by one manager.
///
/// Indices follow CSSOM semantics: inserting at `i` shifts rules at `i..`
/// up by one, deleting at `i` shifts later rules down by one.
pub trait StyleSheetHandle {
    /// Inserts `rule` at `index`, returning the index it landed at.
    fn insert_rule(&self, rule: &str, index: usize) -> Result<usize>;
    fn delete_rule(&self, index: usize) -> Result<()>;
    fn rule_count(&self) -> usize;
    /// Removes the sheet's element from the document.
    fn detach(&self);
}

/// A live subscription to the light/dark preference.
pub trait PreferenceWatcher {
    /// The preference right now.
    fn current(&self) -> ColorMode;
    /// Registers a callback for later changes.
    fn on_change(&mut self, callback: PreferenceCallback) -> Result<()>;
    /// Stops delivering changes. Calling it twice is harmless.
    fn unsubscribe(&mut self);
}

/// A document-like environment.
pub trait Host: 'static {
    type Element: ElementHandle + Clone + 'static;
    type Sheet: StyleSheetHandle + 'static;
    type Watcher: PreferenceWatcher + 'static;

    /// The document's top-level element.
    fn document_element(&self) -> Result<Self::Element>;

    /// The first element matching `selector`, if any.
    fn query_selector(&self, selector: &str) -> Result<Option<Self::Element>>;

    /// Whether `element` belongs to this document and is attached to it.
    fn is_valid_element(&self, element: &Self::Element) -> bool;

    /// Creates an empty style element as the first child of `container`.
    fn inject_style_sheet(&self, container: &Self::Element) -> Result<Self::Sheet>;

    /// Subscribes to `(prefers-color-scheme: light)`.
    fn watch_color_scheme(&self) -> Result<Self::Watcher>;
}
