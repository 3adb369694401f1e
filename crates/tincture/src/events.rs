//! Theme lifecycle notifications.
//!
//! Listeners subscribe to one [`EventKind`] and receive the matching
//! [`ThemeEvent`]:
//!
//! ```text
//! register()    → ThemeRegister { name, data }
//! unregister()  → ThemeUnregister { name }
//! toggle()      → ThemeChange { name, data }
//! OS change     → SystemThemeChange(mode)
//! ```
//!
//! Each kind holds a set of listeners: adding the same [`Listener`] twice
//! keeps one entry. Identity is the `Rc` allocation, so keep a clone of a
//! listener around if you want to remove it later.
//!
//! A listener returning `Err` is logged at warn level and skipped. Later
//! listeners still run, and the operation that emitted the event succeeds.
//! Panics are not caught.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::theme::{ColorMode, ThemeVariables};

/// The four notification channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    ThemeChange,
    SystemThemeChange,
    ThemeRegister,
    ThemeUnregister,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::ThemeChange,
        EventKind::SystemThemeChange,
        EventKind::ThemeRegister,
        EventKind::ThemeUnregister,
    ];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::ThemeChange => write!(f, "themeChange"),
            EventKind::SystemThemeChange => write!(f, "systemThemeChange"),
            EventKind::ThemeRegister => write!(f, "themeRegister"),
            EventKind::ThemeUnregister => write!(f, "themeUnregister"),
        }
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s)
            .ok_or_else(|| format!("unknown event '{}'", s))
    }
}

/// Payload delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum ThemeEvent {
    /// The active theme changed. `None` means no theme is active.
    ThemeChange {
        name: Option<String>,
        /// Effective data of the new theme.
        data: Option<ThemeVariables>,
    },
    /// The OS preference changed.
    SystemThemeChange(ColorMode),
    /// A theme was registered, with its effective data.
    ThemeRegister { name: String, data: ThemeVariables },
    ThemeUnregister { name: String },
}

impl ThemeEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ThemeEvent::ThemeChange { .. } => EventKind::ThemeChange,
            ThemeEvent::SystemThemeChange(_) => EventKind::SystemThemeChange,
            ThemeEvent::ThemeRegister { .. } => EventKind::ThemeRegister,
            ThemeEvent::ThemeUnregister { .. } => EventKind::ThemeUnregister,
        }
    }
}

/// A shared event callback.
pub type Listener = Rc<dyn Fn(&ThemeEvent) -> anyhow::Result<()>>;

/// Wraps a closure as a [`Listener`].
///
/// ```rust
/// use tincture::{listener, ThemeEvent};
///
/// let log = listener(|event: &ThemeEvent| {
///     println!("{:?}", event);
///     Ok(())
/// });
/// ```
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&ThemeEvent) -> anyhow::Result<()> + 'static,
{
    Rc::new(f)
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    // Compare data pointers only; vtable pointers may differ across codegen units.
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// Listener sets keyed by [`EventKind`].
#[derive(Clone, Default)]
pub(crate) struct ListenerSet {
    entries: Vec<(EventKind, Vec<Listener>)>,
}

impl ListenerSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds `listener` under `kind`. Returns false if it was already there.
    pub(crate) fn add(&mut self, kind: EventKind, listener: Listener) -> bool {
        let index = match self.entries.iter().position(|(k, _)| *k == kind) {
            Some(index) => index,
            None => {
                self.entries.push((kind, Vec::new()));
                self.entries.len() - 1
            }
        };
        let listeners = &mut self.entries[index].1;
        if listeners.iter().any(|existing| same_listener(existing, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Removes `listener` from `kind`. Returns false if it was not there.
    pub(crate) fn remove(&mut self, kind: EventKind, listener: &Listener) -> bool {
        let Some((_, listeners)) = self.entries.iter_mut().find(|(k, _)| *k == kind) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|existing| !same_listener(existing, listener));
        listeners.len() != before
    }

    pub(crate) fn clear(&mut self, kind: Option<EventKind>) {
        match kind {
            Some(kind) => self.entries.retain(|(k, _)| *k != kind),
            None => self.entries.clear(),
        }
    }

    /// Clones of the listeners for `kind`, in subscription order.
    ///
    /// Emitters call listeners from this snapshot after releasing any borrow
    /// of the owning state, so listeners may call back into the manager.
    pub(crate) fn snapshot(&self, kind: EventKind) -> Vec<Listener> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, listeners)| listeners.clone())
            .unwrap_or_default()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.iter().map(|(_, listeners)| listeners.len()).sum()
    }
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<(EventKind, usize)> = self
            .entries
            .iter()
            .map(|(kind, listeners)| (*kind, listeners.len()))
            .collect();
        f.debug_struct("ListenerSet").field("counts", &counts).finish()
    }
}

/// Delivers `event` to every listener in `listeners`.
pub(crate) fn dispatch(listeners: &[Listener], event: &ThemeEvent) {
    for listener in listeners {
        if let Err(err) = listener(event) {
            tracing::warn!(event = %event.kind(), error = %err, "theme event listener failed");
        }
    }
}
