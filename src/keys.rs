//! Note-to-keystroke mapping
//!
//! Notes on the listen channel drive key presses: a NoteOn with velocity > 0
//! presses the key bound to that note, velocity 0 or a NoteOff releases it.
//! Turning a key id into an OS-level keystroke is the injector's business;
//! [`LogInjector`] only records what would be pressed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Per-note key bindings, keyed by note number
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct KeyMap(BTreeMap<u8, String>);

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, note: u8) -> Option<&str> {
        self.0.get(&note).map(String::as_str)
    }

    /// Bind a key, returning the previous binding
    pub fn bind(&mut self, note: u8, key: impl Into<String>) -> Option<String> {
        self.0.insert(note & 0x7F, key.into())
    }

    pub fn unbind(&mut self, note: u8) -> Option<String> {
        self.0.remove(&note)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.0.iter().map(|(&note, key)| (note, key.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Press (velocity > 0) or release (velocity 0) the key bound to `note`
    ///
    /// Unbound notes are ignored.
    pub fn trigger(&self, injector: &dyn KeystrokeInjector, note: u8, velocity: u8) {
        if let Some(key) = self.get(note) {
            injector.inject(key, velocity > 0);
        }
    }
}

impl FromIterator<(u8, String)> for KeyMap {
    fn from_iter<I: IntoIterator<Item = (u8, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Turns key ids into keystrokes
pub trait KeystrokeInjector {
    fn inject(&self, key: &str, pressed: bool);
}

/// Injector that logs instead of touching the OS input queue
#[derive(Debug, Default)]
pub struct LogInjector;

impl KeystrokeInjector for LogInjector {
    fn inject(&self, key: &str, pressed: bool) {
        if pressed {
            info!("⌨️  key down: {}", key);
        } else {
            debug!("⌨️  key up: {}", key);
        }
    }
}
