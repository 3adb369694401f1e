//! `web-sys` implementations of the tincture host capabilities.

use tincture::host::memory::STYLE_MARKER_ATTRIBUTE;
use tincture::{
    ColorMode, ElementHandle, Host, PreferenceCallback, PreferenceWatcher, Result,
    StyleSheetHandle, ThemeError,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    CssStyleSheet, Document, Element, HtmlStyleElement, MediaQueryList, MediaQueryListEvent,
    Window,
};

/// The media query the watcher subscribes to.
pub const COLOR_SCHEME_QUERY: &str = "(prefers-color-scheme: light)";

pub(crate) fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

/// The current browser window and document.
#[derive(Debug, Clone)]
pub struct WebHost {
    window: Window,
    document: Document,
}

impl WebHost {
    /// Binds to the global `window` and its `document`.
    ///
    /// # Errors
    ///
    /// [`ThemeError::Configuration`] outside a browser main thread.
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| {
            ThemeError::Configuration("no global window: not running in a browser".to_string())
        })?;
        let document = window
            .document()
            .ok_or_else(|| ThemeError::Configuration("window has no document".to_string()))?;
        Ok(Self { window, document })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

/// An element of the host document.
#[derive(Debug, Clone, PartialEq)]
pub struct WebElement(pub Element);

impl From<Element> for WebElement {
    fn from(element: Element) -> Self {
        WebElement(element)
    }
}

impl ElementHandle for WebElement {
    fn get_attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) -> Result<()> {
        self.0.set_attribute(name, value).map_err(|err| {
            ThemeError::StyleSheet(format!("setting {} failed: {}", name, describe(&err)))
        })
    }

    fn remove_attribute(&self, name: &str) -> Result<()> {
        self.0.remove_attribute(name).map_err(|err| {
            ThemeError::StyleSheet(format!("removing {} failed: {}", name, describe(&err)))
        })
    }
}

/// A `<style>` element and its CSSOM sheet.
#[derive(Debug)]
pub struct WebStyleSheet {
    element: HtmlStyleElement,
    sheet: CssStyleSheet,
}

impl WebStyleSheet {
    pub fn element(&self) -> &HtmlStyleElement {
        &self.element
    }
}

impl StyleSheetHandle for WebStyleSheet {
    fn insert_rule(&self, rule: &str, index: usize) -> Result<usize> {
        self.sheet
            .insert_rule_with_index(rule, index as u32)
            .map(|landed| landed as usize)
            .map_err(|err| ThemeError::StyleSheet(format!("insertRule failed: {}", describe(&err))))
    }

    fn delete_rule(&self, index: usize) -> Result<()> {
        self.sheet
            .delete_rule(index as u32)
            .map_err(|err| ThemeError::StyleSheet(format!("deleteRule failed: {}", describe(&err))))
    }

    fn rule_count(&self) -> usize {
        self.sheet
            .css_rules()
            .map(|rules| rules.length() as usize)
            .unwrap_or(0)
    }

    fn detach(&self) {
        self.element.remove();
    }
}

type ChangeHandler = Closure<dyn FnMut(MediaQueryListEvent)>;

/// `change` listeners on a `(prefers-color-scheme: light)` media query.
///
/// Dropping the watcher removes its listeners.
pub struct MediaQueryWatcher {
    list: MediaQueryList,
    handlers: Vec<ChangeHandler>,
}

impl MediaQueryWatcher {
    pub fn media_query(&self) -> &MediaQueryList {
        &self.list
    }
}

impl PreferenceWatcher for MediaQueryWatcher {
    fn current(&self) -> ColorMode {
        ColorMode::from_light_match(self.list.matches())
    }

    fn on_change(&mut self, callback: PreferenceCallback) -> Result<()> {
        let handler: ChangeHandler = Closure::new(move |event: MediaQueryListEvent| {
            callback(ColorMode::from_light_match(event.matches()));
        });
        self.list
            .add_event_listener_with_callback("change", handler.as_ref().unchecked_ref())
            .map_err(|err| {
                ThemeError::Configuration(format!(
                    "could not subscribe to {}: {}",
                    COLOR_SCHEME_QUERY,
                    describe(&err)
                ))
            })?;
        self.handlers.push(handler);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        for handler in self.handlers.drain(..) {
            if let Err(err) = self
                .list
                .remove_event_listener_with_callback("change", handler.as_ref().unchecked_ref())
            {
                tracing::warn!(error = %describe(&err), "could not remove color scheme listener");
            }
        }
    }
}

impl Drop for MediaQueryWatcher {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl Host for WebHost {
    type Element = WebElement;
    type Sheet = WebStyleSheet;
    type Watcher = MediaQueryWatcher;

    fn document_element(&self) -> Result<WebElement> {
        self.document
            .document_element()
            .map(WebElement)
            .ok_or_else(|| ThemeError::Configuration("document has no root element".to_string()))
    }

    fn query_selector(&self, selector: &str) -> Result<Option<WebElement>> {
        self.document
            .query_selector(selector)
            .map(|found| found.map(WebElement))
            .map_err(|err| {
                ThemeError::Configuration(format!(
                    "invalid root selector '{}': {}",
                    selector,
                    describe(&err)
                ))
            })
    }

    fn is_valid_element(&self, element: &WebElement) -> bool {
        element.0.is_connected() && self.document.contains(Some(element.0.as_ref()))
    }

    fn inject_style_sheet(&self, container: &WebElement) -> Result<WebStyleSheet> {
        let style_error =
            |context: &str, err: JsValue| ThemeError::StyleSheet(format!("{}: {}", context, describe(&err)));

        let element: HtmlStyleElement = self
            .document
            .create_element("style")
            .map_err(|err| style_error("could not create <style>", err))?
            .dyn_into()
            .map_err(|_| ThemeError::StyleSheet("created element is not a <style>".to_string()))?;
        element
            .set_attribute(STYLE_MARKER_ATTRIBUTE, "")
            .map_err(|err| style_error("could not mark <style>", err))?;

        let first = container.0.first_child();
        container
            .0
            .insert_before(&element, first.as_ref())
            .map_err(|err| style_error("could not insert <style>", err))?;

        let sheet = element
            .sheet()
            .and_then(|sheet| sheet.dyn_into::<CssStyleSheet>().ok());
        match sheet {
            Some(sheet) => Ok(WebStyleSheet { element, sheet }),
            None => {
                element.remove();
                Err(ThemeError::StyleSheet(
                    "inserted <style> has no CSS style sheet".to_string(),
                ))
            }
        }
    }

    fn watch_color_scheme(&self) -> Result<MediaQueryWatcher> {
        let list = self
            .window
            .match_media(COLOR_SCHEME_QUERY)
            .map_err(|err| ThemeError::Configuration(format!("matchMedia failed: {}", describe(&err))))?
            .ok_or_else(|| {
                ThemeError::Configuration(format!("matchMedia returned nothing for {}", COLOR_SCHEME_QUERY))
            })?;
        Ok(MediaQueryWatcher {
            list,
            handlers: Vec::new(),
        })
    }
}
