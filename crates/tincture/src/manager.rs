//! The theme manager.
//!
//! A [`ThemeManager`] binds to one container element. It owns a style sheet
//! injected as the container's first child, holding one rule per registered
//! theme, and switches themes by writing the container's `data-theme`
//! attribute. That attribute is the only record of which theme is active.
//!
//! # Lifecycle
//!
//! ```text
//! new() ──► Active ──destroy()──► Destroyed
//!            │  ▲
//!            └──┘ register / unregister / toggle / ...
//! ```
//!
//! Construction either fully succeeds or leaves nothing behind. After
//! [`destroy`](ThemeManager::destroy), every call except `destroy`,
//! [`status`](ThemeManager::status) and
//! [`is_destroyed`](ThemeManager::is_destroyed) fails with
//! [`ThemeError::Destroyed`].
//!
//! # Following the system theme
//!
//! Unless disabled, whenever no theme is active or the synthetic
//! [`DEFAULT_THEME`] is, the manager looks for a theme named after the OS
//! preference (`"light"` or `"dark"`). If one is registered, its data is
//! re-registered as `"default"` and `"default"` is activated. If none is
//! registered, nothing happens.
//!
//! # Re-entrancy
//!
//! Events and the after-toggle hook run after internal state is released,
//! so listeners may call back into the manager, including `destroy`.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::Serialize;

use crate::config::{AfterToggleHook, RootTarget, ThemeManagerConfig};
use crate::css::{compile_rule, validate_theme_name, THEME_ATTRIBUTE};
use crate::error::{Result, ThemeError};
use crate::events::{dispatch, EventKind, Listener, ListenerSet, ThemeEvent};
use crate::host::{ElementHandle, Host, PreferenceWatcher, StyleSheetHandle};
use crate::theme::{ColorMode, ThemeRecord, ThemeRegistry, ThemeSet, ThemeVariables};

/// Name of the synthetic theme that mirrors the system preference.
pub const DEFAULT_THEME: &str = "default";

/// Label used in errors about base variables.
const BASE_VARIABLES: &str = "base variables";

/// One registered theme, as reported by [`ThemeManager::themes`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemeInfo {
    pub name: String,
    /// Effective data, base variables included.
    pub data: ThemeVariables,
    pub active: bool,
}

/// Diagnostic snapshot from [`ThemeManager::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagerStatus {
    pub destroyed: bool,
    pub theme_count: usize,
    pub current_theme: Option<String>,
    pub system_theme: ColorMode,
    pub follow_system_theme: bool,
    pub listener_count: usize,
}

struct Inner<H: Host> {
    container: H::Element,
    sheet: Option<H::Sheet>,
    watcher: Option<H::Watcher>,
    registry: ThemeRegistry,
    base: ThemeVariables,
    system_theme: ColorMode,
    follow_system_theme: bool,
    listeners: ListenerSet,
    after_toggle: Option<AfterToggleHook>,
    destroyed: bool,
}

impl<H: Host> Inner<H> {
    fn current_theme(&self) -> Option<String> {
        self.container.get_attribute(THEME_ATTRIBUTE)
    }

    fn effective(&self, name: &str) -> Option<ThemeVariables> {
        self.registry
            .get(name)
            .map(|record| self.base.merged(&record.data))
    }

    fn sheet(&self) -> Result<&H::Sheet> {
        self.sheet.as_ref().ok_or(ThemeError::Destroyed)
    }

    /// Deletes every rule and recompiles all themes in registration order.
    fn rebuild_sheet(&mut self) -> Result<()> {
        let sheet = self.sheet.as_ref().ok_or(ThemeError::Destroyed)?;
        for index in (0..sheet.rule_count()).rev() {
            sheet.delete_rule(index)?;
        }
        self.registry.renumber();
        for record in self.registry.ordered() {
            let rule = compile_rule(&record.name, &self.base.merged(&record.data));
            sheet.insert_rule(&rule, record.rule_index)?;
        }
        Ok(())
    }
}

/// Registers CSS-variable themes and switches between them.
///
/// Cloning yields another handle to the same manager.
///
/// # Example
///
/// ```rust
/// use tincture::host::memory::MemoryDocument;
/// use tincture::{ThemeManager, ThemeManagerConfig, ThemeVariables};
///
/// let doc = MemoryDocument::new();
/// let config = ThemeManagerConfig::new()
///     .with_base_variables(ThemeVariables::new().set("--font", "sans"));
/// let manager = ThemeManager::new(&doc, config)?;
///
/// manager
///     .register("light", ThemeVariables::new().set("--bg", "#fff"))?
///     .register("dark", ThemeVariables::new().set("--bg", "#000"))?
///     .toggle(Some("dark"))?;
///
/// let data = manager.theme_data(None)?.unwrap();
/// assert_eq!(data.get("--bg").unwrap().to_string(), "#000");
/// assert_eq!(data.get("--font").unwrap().to_string(), "sans");
/// # Ok::<(), tincture::ThemeError>(())
/// ```
pub struct ThemeManager<H: Host> {
    inner: Rc<RefCell<Inner<H>>>,
}

impl<H: Host> Clone for ThemeManager<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: Host> ThemeManager<H> {
    /// Binds a manager to the root described by `config`.
    ///
    /// Injects the style sheet, subscribes to the OS preference and applies
    /// the system theme if following is enabled.
    ///
    /// # Errors
    ///
    /// [`ThemeError::Configuration`] if the root cannot be resolved or the
    /// base variables are invalid; host errors from sheet injection or the
    /// preference subscription are passed through. Nothing is left attached
    /// on failure.
    pub fn new(host: &H, config: ThemeManagerConfig<H::Element>) -> Result<Self> {
        let ThemeManagerConfig {
            root,
            base_variables,
            disable_follow_system_theme,
            after_toggle,
        } = config;

        base_variables
            .check()
            .map_err(|reason| ThemeError::Configuration(format!("invalid base variables: {}", reason)))?;

        let container = match root {
            RootTarget::Document => host.document_element()?,
            RootTarget::Selector(selector) => host.query_selector(&selector)?.ok_or_else(|| {
                ThemeError::Configuration(format!("root selector '{}' matched no element", selector))
            })?,
            RootTarget::Element(element) => {
                if !host.is_valid_element(&element) {
                    return Err(ThemeError::Configuration(
                        "root element is not attached to this document".to_string(),
                    ));
                }
                element
            }
        };

        let sheet = host.inject_style_sheet(&container)?;
        let mut watcher = match host.watch_color_scheme() {
            Ok(watcher) => watcher,
            Err(err) => {
                sheet.detach();
                return Err(err);
            }
        };
        let system_theme = watcher.current();

        let inner = Rc::new(RefCell::new(Inner {
            container,
            sheet: Some(sheet),
            watcher: None,
            registry: ThemeRegistry::new(),
            base: base_variables,
            system_theme,
            follow_system_theme: !disable_follow_system_theme,
            listeners: ListenerSet::new(),
            after_toggle,
            destroyed: false,
        }));

        let weak: Weak<RefCell<Inner<H>>> = Rc::downgrade(&inner);
        let subscribed = watcher.on_change(Rc::new(move |mode: ColorMode| {
            if let Some(inner) = weak.upgrade() {
                ThemeManager { inner }.handle_system_change(mode);
            }
        }));
        inner.borrow_mut().watcher = Some(watcher);

        let manager = ThemeManager { inner };
        if let Err(err) = subscribed.and_then(|()| manager.apply_system_theme()) {
            manager.destroy();
            return Err(err);
        }

        tracing::debug!(
            %system_theme,
            follow_system_theme = !disable_follow_system_theme,
            "theme manager created"
        );
        Ok(manager)
    }

    /// Registers `name`, replacing any earlier theme with that name.
    ///
    /// `data` is stored as given; base variables are merged in on every
    /// read. Re-registering the active theme keeps it active with the new
    /// data.
    ///
    /// # Errors
    ///
    /// [`ThemeError::InvalidThemeName`], [`ThemeError::InvalidThemeData`],
    /// [`ThemeError::Destroyed`].
    pub fn register(&self, name: &str, data: ThemeVariables) -> Result<&Self> {
        self.ensure_active()?;
        validate_theme_name(name)?;
        data.check()
            .map_err(|reason| ThemeError::invalid_data(name, reason))?;

        let was_active = self.current_theme()?.as_deref() == Some(name);
        if self.has_theme(name)? {
            self.unregister(name)?;
        }

        let (effective, system_theme) = {
            let mut inner = self.inner.borrow_mut();
            let effective = inner.base.merged(&data);
            let rule_index = {
                let sheet = inner.sheet()?;
                sheet.insert_rule(&compile_rule(name, &effective), sheet.rule_count())?
            };
            inner.registry.insert(ThemeRecord {
                name: name.to_string(),
                data,
                rule_index,
            });
            tracing::debug!(theme = name, rule_index, "registered theme");
            (effective, inner.system_theme)
        };

        self.emit(ThemeEvent::ThemeRegister {
            name: name.to_string(),
            data: effective,
        });

        if was_active {
            self.toggle(Some(name))?;
        } else if name == system_theme.as_str() {
            self.apply_system_theme()?;
        }
        Ok(self)
    }

    /// Registers every theme in `set`, in set order.
    pub fn register_set(&self, set: &ThemeSet) -> Result<&Self> {
        for (name, data) in set.iter() {
            self.register(name, data.clone())?;
        }
        Ok(self)
    }

    /// Removes `name`. Unknown names are ignored.
    ///
    /// If `name` was active, no theme is active afterwards.
    pub fn unregister(&self, name: &str) -> Result<&Self> {
        self.ensure_active()?;
        let was_active = {
            let mut inner = self.inner.borrow_mut();
            let Some(rule_index) = inner.registry.get(name).map(|record| record.rule_index) else {
                return Ok(self);
            };
            inner.sheet()?.delete_rule(rule_index)?;
            inner.registry.remove(name);
            tracing::debug!(theme = name, rule_index, "unregistered theme");
            inner.current_theme().as_deref() == Some(name)
        };

        self.emit(ThemeEvent::ThemeUnregister {
            name: name.to_string(),
        });
        if was_active {
            self.toggle(None)?;
        }
        Ok(self)
    }

    /// Activates `name`, or deactivates every theme with `None`.
    ///
    /// # Errors
    ///
    /// [`ThemeError::UnknownTheme`] if `name` is not registered.
    pub fn toggle(&self, name: Option<&str>) -> Result<&Self> {
        self.ensure_active()?;
        let (data, hook) = {
            let inner = self.inner.borrow();
            let data = match name {
                Some(name) => {
                    let data = inner
                        .effective(name)
                        .ok_or_else(|| ThemeError::UnknownTheme(name.to_string()))?;
                    inner.container.set_attribute(THEME_ATTRIBUTE, name)?;
                    Some(data)
                }
                None => {
                    inner.container.remove_attribute(THEME_ATTRIBUTE)?;
                    None
                }
            };
            (data, inner.after_toggle.clone())
        };
        tracing::debug!(theme = ?name, "toggled theme");

        self.emit(ThemeEvent::ThemeChange {
            name: name.map(str::to_string),
            data: data.clone(),
        });
        if let Some(hook) = hook {
            if let Err(err) = hook(name, data.as_ref()) {
                tracing::warn!(theme = ?name, error = %err, "after-toggle hook failed");
            }
        }
        Ok(self)
    }

    /// The active theme, read from the container attribute.
    pub fn current_theme(&self) -> Result<Option<String>> {
        self.read(|inner| inner.current_theme())
    }

    /// Effective data for `name`, or for the active theme with `None`.
    pub fn theme_data(&self, name: Option<&str>) -> Result<Option<ThemeVariables>> {
        self.read(|inner| {
            let name = match name {
                Some(name) => Some(name.to_string()),
                None => inner.current_theme(),
            };
            name.and_then(|name| inner.effective(&name))
        })
    }

    /// Every registered theme in registration order.
    pub fn themes(&self) -> Result<Vec<ThemeInfo>> {
        self.read(|inner| {
            let current = inner.current_theme();
            inner
                .registry
                .ordered()
                .into_iter()
                .map(|record| ThemeInfo {
                    name: record.name.clone(),
                    data: inner.base.merged(&record.data),
                    active: current.as_deref() == Some(record.name.as_str()),
                })
                .collect()
        })
    }

    /// Registered theme names in registration order.
    pub fn theme_names(&self) -> Result<Vec<String>> {
        self.read(|inner| inner.registry.names())
    }

    pub fn has_theme(&self, name: &str) -> Result<bool> {
        self.read(|inner| inner.registry.contains(name))
    }

    /// The last OS preference seen.
    pub fn system_theme(&self) -> Result<ColorMode> {
        self.read(|inner| inner.system_theme)
    }

    /// Registers `target` as `source`'s own data overlaid with `overrides`.
    ///
    /// # Errors
    ///
    /// [`ThemeError::UnknownTheme`] if `source` is not registered.
    pub fn clone_theme(
        &self,
        source: &str,
        target: &str,
        overrides: ThemeVariables,
    ) -> Result<&Self> {
        let data = self
            .read(|inner| {
                inner
                    .registry
                    .get(source)
                    .map(|record| record.data.merged(&overrides))
            })?
            .ok_or_else(|| ThemeError::UnknownTheme(source.to_string()))?;
        self.register(target, data)
    }

    /// Overlays `patch` on the base variables and recompiles every theme.
    pub fn update_base_variables(&self, patch: ThemeVariables) -> Result<&Self> {
        self.ensure_active()?;
        patch
            .check()
            .map_err(|reason| ThemeError::invalid_data(BASE_VARIABLES, reason))?;

        let mut inner = self.inner.borrow_mut();
        inner.base.extend(&patch);
        inner.rebuild_sheet()?;
        tracing::debug!(
            variables = patch.len(),
            themes = inner.registry.len(),
            "updated base variables"
        );
        Ok(self)
    }

    /// Every compiled rule in sheet order, one per line.
    ///
    /// Matches the owned sheet, so a server can embed it in a `<style>` tag
    /// next to the container's `data-theme` attribute.
    pub fn css_text(&self) -> Result<String> {
        self.read(|inner| {
            inner
                .registry
                .ordered()
                .into_iter()
                .map(|record| compile_rule(&record.name, &inner.base.merged(&record.data)))
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    /// Subscribes `listener` to `kind`. Adding it twice has no effect.
    pub fn on(&self, kind: EventKind, listener: Listener) -> Result<&Self> {
        self.ensure_active()?;
        self.inner.borrow_mut().listeners.add(kind, listener);
        Ok(self)
    }

    /// Unsubscribes `listener` from `kind`.
    pub fn off(&self, kind: EventKind, listener: &Listener) -> Result<&Self> {
        self.ensure_active()?;
        self.inner.borrow_mut().listeners.remove(kind, listener);
        Ok(self)
    }

    /// Drops listeners for `kind`, or for every kind with `None`.
    pub fn clear_listeners(&self, kind: Option<EventKind>) -> Result<&Self> {
        self.ensure_active()?;
        self.inner.borrow_mut().listeners.clear(kind);
        Ok(self)
    }

    /// Releases the style sheet, the OS subscription and all listeners.
    ///
    /// Calling it again does nothing.
    pub fn destroy(&self) {
        let (watcher, sheet, container) = {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed {
                return;
            }
            inner.destroyed = true;
            inner.registry.clear();
            inner.listeners.clear(None);
            inner.after_toggle = None;
            (
                inner.watcher.take(),
                inner.sheet.take(),
                inner.container.clone(),
            )
        };

        if let Some(mut watcher) = watcher {
            watcher.unsubscribe();
        }
        if let Some(sheet) = sheet {
            sheet.detach();
        }
        if let Err(err) = container.remove_attribute(THEME_ATTRIBUTE) {
            tracing::warn!(error = %err, "could not clear theme attribute");
        }
        tracing::debug!("theme manager destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.borrow().destroyed
    }

    /// A diagnostic snapshot. Available after `destroy`.
    pub fn status(&self) -> ManagerStatus {
        let inner = self.inner.borrow();
        ManagerStatus {
            destroyed: inner.destroyed,
            theme_count: inner.registry.len(),
            current_theme: inner.current_theme(),
            system_theme: inner.system_theme,
            follow_system_theme: inner.follow_system_theme,
            listener_count: inner.listeners.len(),
        }
    }

    fn ensure_active(&self) -> Result<()> {
        if self.inner.borrow().destroyed {
            return Err(ThemeError::Destroyed);
        }
        Ok(())
    }

    fn read<R>(&self, f: impl FnOnce(&Inner<H>) -> R) -> Result<R> {
        let inner = self.inner.borrow();
        if inner.destroyed {
            return Err(ThemeError::Destroyed);
        }
        Ok(f(&inner))
    }

    fn emit(&self, event: ThemeEvent) {
        let listeners = self.inner.borrow().listeners.snapshot(event.kind());
        dispatch(&listeners, &event);
    }

    /// Mirrors the system theme through [`DEFAULT_THEME`] when allowed.
    fn apply_system_theme(&self) -> Result<()> {
        let mirrored = {
            let inner = self.inner.borrow();
            if inner.destroyed || !inner.follow_system_theme {
                return Ok(());
            }
            match inner.current_theme().as_deref() {
                None | Some(DEFAULT_THEME) => {}
                Some(_) => return Ok(()),
            }
            inner
                .registry
                .get(inner.system_theme.as_str())
                .map(|record| record.data.clone())
        };
        let Some(data) = mirrored else {
            return Ok(());
        };

        self.register(DEFAULT_THEME, data)?;
        if self.current_theme()?.as_deref() != Some(DEFAULT_THEME) {
            self.toggle(Some(DEFAULT_THEME))?;
        }
        Ok(())
    }

    fn handle_system_change(&self, mode: ColorMode) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed {
                return;
            }
            inner.system_theme = mode;
        }
        tracing::debug!(%mode, "system color scheme changed");

        if let Err(err) = self.apply_system_theme() {
            tracing::warn!(%mode, error = %err, "could not apply system theme");
        }
        self.emit(ThemeEvent::SystemThemeChange(mode));
    }
}

impl<H: Host> fmt::Debug for ThemeManager<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeManager")
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::listener;
    use crate::host::memory::{MemoryDocument, MemoryElement};
    use std::cell::Cell;
    use tracing_test::traced_test;

    fn vars(entries: &[(&str, &str)]) -> ThemeVariables {
        entries.iter().copied().collect()
    }

    fn manager(doc: &MemoryDocument) -> ThemeManager<MemoryDocument> {
        ThemeManager::new(doc, ThemeManagerConfig::new().without_system_theme()).unwrap()
    }

    fn record_events(
        manager: &ThemeManager<MemoryDocument>,
        kinds: &[EventKind],
    ) -> Rc<RefCell<Vec<ThemeEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let recorder = listener(move |event| {
            sink.borrow_mut().push(event.clone());
            Ok(())
        });
        for kind in kinds {
            manager.on(*kind, Rc::clone(&recorder)).unwrap();
        }
        log
    }

    #[test]
    fn test_new_injects_sheet_as_first_child() {
        let doc = MemoryDocument::new();
        let existing = doc.create_element("main");
        doc.root().append_child(&existing);

        let _manager = manager(&doc);
        let children = doc.root().children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].tag_name(), "style");
        assert_eq!(children[1], existing);
    }

    #[test]
    fn test_new_with_unmatched_selector_fails() {
        let doc = MemoryDocument::new();
        let err = ThemeManager::new(&doc, ThemeManagerConfig::new().with_selector("#nope"))
            .unwrap_err();
        assert!(matches!(err, ThemeError::Configuration(_)));
        assert!(doc.root().children().is_empty());
    }

    #[test]
    fn test_new_with_detached_element_fails() {
        let doc = MemoryDocument::new();
        let loose: MemoryElement = doc.create_element("div");
        let err = ThemeManager::new(&doc, ThemeManagerConfig::new().with_element(loose))
            .unwrap_err();
        assert!(matches!(err, ThemeError::Configuration(_)));
    }

    #[test]
    fn test_new_with_invalid_base_variables_fails() {
        let doc = MemoryDocument::new();
        let config = ThemeManagerConfig::new().with_base_variables(vars(&[("--x", "a; b")]));
        let err = ThemeManager::new(&doc, config).unwrap_err();
        assert!(matches!(err, ThemeError::Configuration(_)));
        assert_eq!(doc.preference().subscriber_count(), 0);
    }

    #[test]
    fn test_register_stores_unmerged_data() {
        let doc = MemoryDocument::new();
        let config = ThemeManagerConfig::new()
            .without_system_theme()
            .with_base_variables(vars(&[("--font", "sans")]));
        let manager = ThemeManager::new(&doc, config).unwrap();
        manager.register("dark", vars(&[("--bg", "#000")])).unwrap();

        let record = manager.inner.borrow().registry.get("dark").cloned().unwrap();
        assert_eq!(record.data, vars(&[("--bg", "#000")]));
        assert_eq!(
            manager.theme_data(Some("dark")).unwrap().unwrap(),
            vars(&[("--font", "sans"), ("--bg", "#000")])
        );
    }

    #[test]
    fn test_register_rejects_bad_input() {
        let doc = MemoryDocument::new();
        let manager = manager(&doc);
        assert!(matches!(
            manager.register("a\"b", ThemeVariables::new()),
            Err(ThemeError::InvalidThemeName { .. })
        ));
        assert!(matches!(
            manager.register("ok", vars(&[("--x", "}")])),
            Err(ThemeError::InvalidThemeData { .. })
        ));
        assert!(matches!(
            manager.register("ok", vars(&[("not a name", "1")])),
            Err(ThemeError::InvalidThemeData { .. })
        ));
        assert_eq!(manager.css_text().unwrap(), "");
    }

    #[test]
    fn test_unregister_middle_keeps_indices_consistent() {
        let doc = MemoryDocument::new();
        let manager = manager(&doc);
        for name in ["a", "b", "c"] {
            manager.register(name, vars(&[("--n", name)])).unwrap();
        }
        manager.unregister("b").unwrap();
        manager.register("b", vars(&[("--n", "b2")])).unwrap();

        let inner = manager.inner.borrow();
        assert_eq!(inner.registry.get("a").unwrap().rule_index, 0);
        assert_eq!(inner.registry.get("c").unwrap().rule_index, 1);
        assert_eq!(inner.registry.get("b").unwrap().rule_index, 2);
        assert_eq!(inner.sheet.as_ref().unwrap().rule_count(), 3);
    }

    #[test]
    fn test_replacing_active_theme_keeps_it_active() {
        let doc = MemoryDocument::new();
        let manager = manager(&doc);
        manager.register("dark", vars(&[("--bg", "#000")])).unwrap();
        manager.toggle(Some("dark")).unwrap();
        let events = record_events(&manager, &EventKind::ALL);

        manager.register("dark", vars(&[("--bg", "#111")])).unwrap();

        assert_eq!(manager.current_theme().unwrap().as_deref(), Some("dark"));
        let kinds: Vec<EventKind> = events.borrow().iter().map(ThemeEvent::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::ThemeUnregister,
                EventKind::ThemeChange,
                EventKind::ThemeRegister,
                EventKind::ThemeChange,
            ]
        );
        assert_eq!(
            events.borrow().last(),
            Some(&ThemeEvent::ThemeChange {
                name: Some("dark".to_string()),
                data: Some(vars(&[("--bg", "#111")])),
            })
        );
    }

    #[test]
    fn test_unregister_active_emits_cleared_change() {
        let doc = MemoryDocument::new();
        let manager = manager(&doc);
        manager.register("dark", ThemeVariables::new()).unwrap();
        manager.toggle(Some("dark")).unwrap();
        let events = record_events(&manager, &[EventKind::ThemeChange]);

        manager.unregister("dark").unwrap();

        assert_eq!(manager.current_theme().unwrap(), None);
        assert_eq!(
            *events.borrow(),
            vec![ThemeEvent::ThemeChange {
                name: None,
                data: None
            }]
        );
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let doc = MemoryDocument::new();
        let manager = manager(&doc);
        let events = record_events(&manager, &EventKind::ALL);
        manager.unregister("ghost").unwrap();
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_toggle_unknown_fails_and_keeps_state() {
        let doc = MemoryDocument::new();
        let manager = manager(&doc);
        manager.register("light", ThemeVariables::new()).unwrap();
        manager.toggle(Some("light")).unwrap();
        assert_eq!(
            manager.toggle(Some("neon")).unwrap_err(),
            ThemeError::UnknownTheme("neon".to_string())
        );
        assert_eq!(manager.current_theme().unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_after_toggle_hook_receives_effective_data() {
        let doc = MemoryDocument::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let config = ThemeManagerConfig::new()
            .without_system_theme()
            .with_base_variables(vars(&[("--font", "sans")]))
            .with_after_toggle(move |name, data| {
                sink.borrow_mut()
                    .push((name.map(str::to_string), data.map(ThemeVariables::len)));
                Ok(())
            });
        let manager = ThemeManager::new(&doc, config).unwrap();
        manager.register("dark", vars(&[("--bg", "#000")])).unwrap();
        manager.toggle(Some("dark")).unwrap().toggle(None).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![(Some("dark".to_string()), Some(2)), (None, None)]
        );
    }

    #[test]
    #[traced_test]
    fn test_after_toggle_hook_failure_is_logged() {
        let doc = MemoryDocument::new();
        let config = ThemeManagerConfig::new()
            .without_system_theme()
            .with_after_toggle(|_, _| anyhow::bail!("hook broke"));
        let manager = ThemeManager::new(&doc, config).unwrap();
        manager.register("dark", ThemeVariables::new()).unwrap();

        assert!(manager.toggle(Some("dark")).is_ok());
        assert!(logs_contain("after-toggle hook failed"));
        assert!(logs_contain("hook broke"));
    }

    #[test]
    #[traced_test]
    fn test_listener_failure_does_not_reach_caller() {
        let doc = MemoryDocument::new();
        let manager = manager(&doc);
        let delivered = Rc::new(Cell::new(0));
        let counter = Rc::clone(&delivered);
        manager
            .on(
                EventKind::ThemeRegister,
                listener(|_| anyhow::bail!("listener broke")),
            )
            .unwrap()
            .on(
                EventKind::ThemeRegister,
                listener(move |_| {
                    counter.set(counter.get() + 1);
                    Ok(())
                }),
            )
            .unwrap();

        assert!(manager.register("dark", ThemeVariables::new()).is_ok());
        assert_eq!(delivered.get(), 1);
        assert!(logs_contain("listener broke"));
    }

    #[test]
    fn test_listener_may_call_back_into_manager() {
        let doc = MemoryDocument::new();
        let manager = manager(&doc);
        let handle = manager.clone();
        manager
            .on(
                EventKind::ThemeRegister,
                listener(move |event| {
                    if let ThemeEvent::ThemeRegister { name, .. } = event {
                        handle.toggle(Some(name))?;
                    }
                    Ok(())
                }),
            )
            .unwrap();

        manager.register("dark", ThemeVariables::new()).unwrap();
        assert_eq!(manager.current_theme().unwrap().as_deref(), Some("dark"));
        manager.destroy();
    }

    #[test]
    fn test_listener_may_destroy_manager() {
        let doc = MemoryDocument::new();
        let manager = manager(&doc);
        let handle = manager.clone();
        manager
            .on(
                EventKind::ThemeChange,
                listener(move |_| {
                    handle.destroy();
                    Ok(())
                }),
            )
            .unwrap();
        manager.register("dark", ThemeVariables::new()).unwrap();

        manager.toggle(Some("dark")).unwrap();
        assert!(manager.is_destroyed());
        assert_eq!(manager.current_theme(), Err(ThemeError::Destroyed));
    }

    #[test]
    fn test_off_and_clear_listeners() {
        let doc = MemoryDocument::new();
        let manager = manager(&doc);
        let noop = listener(|_| Ok(()));
        manager
            .on(EventKind::ThemeChange, Rc::clone(&noop))
            .unwrap()
            .on(EventKind::ThemeChange, Rc::clone(&noop))
            .unwrap()
            .on(EventKind::ThemeRegister, Rc::clone(&noop))
            .unwrap();
        assert_eq!(manager.status().listener_count, 2);

        manager.off(EventKind::ThemeChange, &noop).unwrap();
        assert_eq!(manager.status().listener_count, 1);
        manager.clear_listeners(None).unwrap();
        assert_eq!(manager.status().listener_count, 0);
    }

    #[test]
    fn test_update_base_variables_rebuilds_sheet_in_order() {
        let doc = MemoryDocument::new();
        let manager = manager(&doc);
        manager
            .register("light", vars(&[("--bg", "#fff")]))
            .unwrap()
            .register("dark", vars(&[("--bg", "#000")]))
            .unwrap();

        manager
            .update_base_variables(vars(&[("--radius", "4px")]))
            .unwrap();

        insta::assert_snapshot!(manager.css_text().unwrap(), @r#"
        [data-theme="light"] { --radius: 4px; --bg: #fff; }
        [data-theme="dark"] { --radius: 4px; --bg: #000; }
        "#);
        let sheet = doc.root().first_child().unwrap();
        assert_eq!(sheet.tag_name(), "style");
        assert_eq!(manager.inner.borrow().sheet.as_ref().unwrap().rules().len(), 2);
    }

    #[test]
    fn test_update_base_variables_rejects_bad_patch() {
        let doc = MemoryDocument::new();
        let manager = manager(&doc);
        let err = manager
            .update_base_variables(vars(&[("--x", "{")]))
            .unwrap_err();
        assert!(matches!(err, ThemeError::InvalidThemeData { theme, .. } if theme == BASE_VARIABLES));
    }

    #[test]
    fn test_clone_theme_uses_unmerged_source() {
        let doc = MemoryDocument::new();
        let config = ThemeManagerConfig::new()
            .without_system_theme()
            .with_base_variables(vars(&[("--font", "sans")]));
        let manager = ThemeManager::new(&doc, config).unwrap();
        manager
            .register("dark", vars(&[("--bg", "#000"), ("--fg", "#eee")]))
            .unwrap();

        manager
            .clone_theme("dark", "dim", vars(&[("--fg", "#999")]))
            .unwrap();

        let record = manager.inner.borrow().registry.get("dim").cloned().unwrap();
        assert_eq!(record.data, vars(&[("--bg", "#000"), ("--fg", "#999")]));
        assert!(matches!(
            manager.clone_theme("ghost", "x", ThemeVariables::new()),
            Err(ThemeError::UnknownTheme(name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_status_snapshot() {
        let doc = MemoryDocument::with_preference(ColorMode::Dark);
        let manager = manager(&doc);
        manager.register("dark", ThemeVariables::new()).unwrap();
        manager.toggle(Some("dark")).unwrap();

        assert_eq!(
            manager.status(),
            ManagerStatus {
                destroyed: false,
                theme_count: 1,
                current_theme: Some("dark".to_string()),
                system_theme: ColorMode::Dark,
                follow_system_theme: false,
                listener_count: 0,
            }
        );
        let json = serde_json::to_value(manager.status()).unwrap();
        assert_eq!(json["system_theme"], "dark");
    }

    #[test]
    fn test_dropped_managers_release_preference_subscriptions() {
        let doc = MemoryDocument::new();
        for _ in 0..3 {
            let manager = ThemeManager::new(&doc, ThemeManagerConfig::new()).unwrap();
            manager.register("dark", ThemeVariables::new()).unwrap();
            drop(manager);
        }
        assert_eq!(doc.preference().subscriber_count(), 0);
        doc.preference().set(ColorMode::Dark);
    }

    #[test]
    fn test_register_accepts_empty_value() {
        let doc = MemoryDocument::new();
        let manager = manager(&doc);
        manager
            .register("blank", ThemeVariables::new().set("--accent", ""))
            .unwrap();
        assert_eq!(
            manager.css_text().unwrap(),
            "[data-theme=\"blank\"] { --accent: ; }"
        );
    }

    #[test]
    fn test_destroy_releases_everything() {
        let doc = MemoryDocument::new();
        let manager = ThemeManager::new(&doc, ThemeManagerConfig::new()).unwrap();
        manager.register("light", ThemeVariables::new()).unwrap();
        assert_eq!(manager.current_theme().unwrap().as_deref(), Some(DEFAULT_THEME));
        assert_eq!(doc.preference().subscriber_count(), 1);

        manager.destroy();
        manager.destroy();

        assert!(doc.root().children().is_empty());
        assert_eq!(doc.root().get_attribute(THEME_ATTRIBUTE), None);
        assert_eq!(doc.preference().subscriber_count(), 0);
        let status = manager.status();
        assert!(status.destroyed);
        assert_eq!(status.theme_count, 0);
    }

    #[test]
    fn test_system_change_after_destroy_is_ignored() {
        let doc = MemoryDocument::new();
        let manager = ThemeManager::new(&doc, ThemeManagerConfig::new()).unwrap();
        let handle = manager.clone();
        manager.destroy();
        handle.handle_system_change(ColorMode::Dark);
        assert_eq!(manager.status().system_theme, ColorMode::Light);
    }

    #[test]
    fn test_dropping_all_handles_releases_callback_target() {
        let doc = MemoryDocument::new();
        let manager = ThemeManager::new(&doc, ThemeManagerConfig::new()).unwrap();
        let weak = Rc::downgrade(&manager.inner);
        drop(manager);
        assert!(weak.upgrade().is_none());
        doc.preference().set(ColorMode::Dark);
    }
}
