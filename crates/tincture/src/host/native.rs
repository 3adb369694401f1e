//! OS color scheme detection for non-browser hosts.
//!
//! [`NativePreference`] feeds the operating system's light/dark setting
//! (queried through the `dark-light` crate) into a [`MemoryPreference`].
//! There is no OS change notification, so callers decide when to re-check
//! with [`NativePreference::poll`].
//!
//! ```rust,no_run
//! use tincture::host::native::NativePreference;
//! use tincture::{ThemeManager, ThemeManagerConfig};
//!
//! let native = NativePreference::new();
//! let doc = native.document();
//! let manager = ThemeManager::new(&doc, ThemeManagerConfig::new()).unwrap();
//!
//! // Later, e.g. on a timer:
//! native.poll();
//! ```
//!
//! For tests, swap the detector:
//!
//! ```rust
//! use tincture::host::native::NativePreference;
//! use tincture::ColorMode;
//!
//! let native = NativePreference::with_detector(|| ColorMode::Dark);
//! assert_eq!(native.preference().get(), ColorMode::Dark);
//! ```

use dark_light::{detect as detect_os_theme, Mode as OsThemeMode};

use super::memory::{MemoryDocument, MemoryPreference};
use crate::theme::ColorMode;

/// A function returning the current OS color mode.
pub type ColorModeDetector = fn() -> ColorMode;

/// The OS light/dark preference, re-read on demand.
#[derive(Debug, Clone)]
pub struct NativePreference {
    preference: MemoryPreference,
    detector: ColorModeDetector,
}

impl NativePreference {
    /// Reads the OS preference now.
    pub fn new() -> Self {
        Self::with_detector(os_color_mode)
    }

    /// Uses `detector` instead of querying the OS.
    pub fn with_detector(detector: ColorModeDetector) -> Self {
        Self {
            preference: MemoryPreference::new(detector()),
            detector,
        }
    }

    /// The signal that watchers subscribe to.
    pub fn preference(&self) -> &MemoryPreference {
        &self.preference
    }

    /// A fresh document whose watchers follow this preference.
    pub fn document(&self) -> MemoryDocument {
        MemoryDocument::from_preference(self.preference.clone())
    }

    /// Re-runs detection, notifying watchers if the mode changed.
    pub fn poll(&self) -> ColorMode {
        let mode = (self.detector)();
        if mode != self.preference.get() {
            tracing::debug!(%mode, "OS color scheme changed");
        }
        self.preference.set(mode);
        mode
    }
}

impl Default for NativePreference {
    fn default() -> Self {
        Self::new()
    }
}

/// Queries the OS, treating an unspecified or unreadable setting as light.
pub fn os_color_mode() -> ColorMode {
    match detect_os_theme() {
        Ok(OsThemeMode::Dark) => ColorMode::Dark,
        Ok(OsThemeMode::Light) | Ok(OsThemeMode::Unspecified) => ColorMode::Light,
        Err(err) => {
            tracing::warn!(error = ?err, "could not detect OS color scheme, assuming light");
            ColorMode::Light
        }
    }
}
