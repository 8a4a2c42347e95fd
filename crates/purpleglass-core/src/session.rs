//! Display-name gate in front of the composer.
//!
//! This is a cosmetic sign-in: a name is asked for and shown, nothing is
//! verified. The composer is usable only while a name is set.

use tracing::info;

use crate::composer::Composer;

pub const GUEST_LABEL: &str = "Guest";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Blank name; the name field keeps focus.
    Rejected,
    Accepted(String),
}

#[derive(Debug)]
pub struct SessionGate {
    state: SessionState,
    /// Single-line name field on the login overlay.
    pub name_field: Composer,
}

impl SessionGate {
    /// Initial state from a persisted display name.
    pub fn from_display_name(name: Option<&str>) -> Self {
        let state = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => SessionState::LoggedIn {
                name: name.to_string(),
            },
            None => SessionState::LoggedOut,
        };
        Self {
            state,
            name_field: Composer::new(1),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::LoggedIn { .. })
    }

    pub fn overlay_visible(&self) -> bool {
        !self.is_authenticated()
    }

    /// Mirrors the `modal-open` body class: set while the overlay is up.
    pub fn modal_open(&self) -> bool {
        self.overlay_visible()
    }

    pub fn composer_enabled(&self) -> bool {
        self.is_authenticated()
    }

    pub fn display_label(&self) -> &str {
        match &self.state {
            SessionState::LoggedIn { name } => name,
            SessionState::LoggedOut => GUEST_LABEL,
        }
    }

    pub fn submit_login(&mut self, name: &str) -> LoginOutcome {
        let name = name.trim();
        if name.is_empty() {
            return LoginOutcome::Rejected;
        }
        info!(name, "signed in");
        self.state = SessionState::LoggedIn {
            name: name.to_string(),
        };
        self.name_field.clear();
        LoginOutcome::Accepted(name.to_string())
    }

    pub fn logout(&mut self) {
        if self.is_authenticated() {
            info!("signed out");
        }
        self.state = SessionState::LoggedOut;
        self.name_field.clear();
    }
}
