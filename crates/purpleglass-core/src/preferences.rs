//! Theme, compact mode and display name, persisted in a [`KeyValueStore`].

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::storage::{KeyValueStore, StoreError, COMPACT_KEY, THEME_KEY, USERNAME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Glow,
    Midnight,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Glow => "glow",
            Theme::Midnight => "midnight",
        }
    }

    /// Anything other than `midnight` is `glow`.
    pub fn normalize(s: &str) -> Self {
        match s {
            "midnight" => Theme::Midnight,
            _ => Theme::Glow,
        }
    }

    pub fn all() -> Vec<Theme> {
        vec![Theme::Glow, Theme::Midnight]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Theme::Glow => "Glow",
            Theme::Midnight => "Midnight",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: Theme,
    pub compact: bool,
    pub display_name: Option<String>,
}

impl Preferences {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let theme = store
            .get(THEME_KEY)
            .map(|t| Theme::normalize(&t))
            .unwrap_or_default();
        let compact = store.get(COMPACT_KEY).as_deref() == Some("1");
        let display_name = store
            .get(USERNAME_KEY)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        Self {
            theme,
            compact,
            display_name,
        }
    }
}

/// Live preferences plus the store they are written through to.
pub struct PreferencesStore {
    store: Box<dyn KeyValueStore>,
    prefs: Preferences,
}

impl PreferencesStore {
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        let prefs = Preferences::load(store.as_ref());
        info!(
            theme = prefs.theme.as_str(),
            compact = prefs.compact,
            signed_in = prefs.display_name.is_some(),
            "loaded preferences"
        );
        Self { store, prefs }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn theme(&self) -> Theme {
        self.prefs.theme
    }

    pub fn compact(&self) -> bool {
        self.prefs.compact
    }

    pub fn display_name(&self) -> Option<&str> {
        self.prefs.display_name.as_deref()
    }

    pub fn set_theme(&mut self, value: &str) -> Theme {
        let theme = Theme::normalize(value);
        self.prefs.theme = theme;
        self.persist(THEME_KEY, Some(theme.as_str()));
        theme
    }

    pub fn set_compact(&mut self, compact: bool) {
        self.prefs.compact = compact;
        self.persist(COMPACT_KEY, Some(if compact { "1" } else { "0" }));
    }

    /// `None` signs the user out; `Some(name)` stores the trimmed name.
    pub fn set_user(&mut self, name: Option<&str>) {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        self.prefs.display_name = name.map(str::to_string);
        self.persist(USERNAME_KEY, name);
    }

    // Storage failures never reach the user; the in-memory value still applies.
    fn persist(&mut self, key: &str, value: Option<&str>) {
        let result: Result<(), StoreError> = match value {
            Some(v) => self.store.set(key, v),
            None => self.store.remove(key),
        };
        if let Err(e) = result {
            warn!(key, error = %e, "failed to persist preference");
        }
    }
}
