//! The persisted light/dark theme preference.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::ports::KeyValueStore;

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

pub struct ThemePreference {
    storage: Arc<dyn KeyValueStore>,
    current: Theme,
}

impl ThemePreference {
    /// Reads the stored theme, falling back to `Light` when nothing valid is stored.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let current = match storage.get(THEME_KEY) {
            Ok(Some(raw)) => Theme::parse(&raw).unwrap_or_default(),
            Ok(None) => Theme::default(),
            Err(e) => {
                warn!("Failed to load theme preference: {}", e);
                Theme::default()
            }
        };
        Self { storage, current }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    pub fn save(&mut self, theme: Theme) {
        self.current = theme;
        if let Err(e) = self.storage.set(THEME_KEY, theme.as_str()) {
            warn!("Failed to save theme preference: {}", e);
        }
    }

    pub fn toggle(&mut self) -> Theme {
        let next = self.current.toggled();
        self.save(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn theme_defaults_to_light_and_persists_changes() {
        let storage = Arc::new(MemoryStore::new());
        let mut preference = ThemePreference::load(storage.clone());
        assert_eq!(preference.current(), Theme::Light);

        assert_eq!(preference.toggle(), Theme::Dark);
        assert_eq!(storage.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
        assert_eq!(ThemePreference::load(storage).current(), Theme::Dark);
    }

    #[test]
    fn unknown_stored_values_fall_back_to_light() {
        let storage = Arc::new(MemoryStore::with_entry(THEME_KEY, "sepia"));
        assert_eq!(ThemePreference::load(storage).current(), Theme::Light);
    }
}
