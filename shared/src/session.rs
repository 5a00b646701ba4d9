//! In-memory session: who is signed in and which screen is showing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The user record returned by the auth backend. Fields other than
/// `username` are kept as-is so a richer backend needs no core change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, Value>,
}

impl Identity {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Home,
    Search,
    ImageEdit,
}

impl Screen {
    pub const ALL: [Self; 3] = [Self::Home, Self::Search, Self::ImageEdit];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Search => "Search",
            Self::ImageEdit => "Image Editor",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocialProvider {
    Google,
    GitHub,
}

impl SocialProvider {
    pub const ALL: [Self; 2] = [Self::Google, Self::GitHub];
}

impl fmt::Display for SocialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    identity: Option<Identity>,
    screen: Screen,
}

impl Session {
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.screen
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn sign_in(&mut self, identity: Identity) {
        tracing::info!(username = %identity.username, "signed in");
        self.identity = Some(identity);
        self.screen = Screen::Home;
    }

    pub fn sign_out(&mut self) {
        if let Some(identity) = self.identity.take() {
            tracing::info!(username = %identity.username, "signed out");
        }
        self.screen = Screen::Home;
    }

    /// Switches screens. Returns false while signed out.
    pub fn navigate(&mut self, screen: Screen) -> bool {
        if !self.is_authenticated() {
            tracing::debug!(?screen, "ignoring navigation while signed out");
            return false;
        }
        self.screen = screen;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_signed_out_on_home() {
        let session = Session::default();
        assert!(!session.is_authenticated());
        assert_eq!(session.screen(), Screen::Home);
    }

    #[test]
    fn sign_in_lands_on_home() {
        let mut session = Session::default();
        session.sign_in(Identity::new("ada"));
        assert_eq!(session.identity().map(|i| i.username.as_str()), Some("ada"));
        assert_eq!(session.screen(), Screen::Home);
    }

    #[test]
    fn navigation_requires_identity() {
        let mut session = Session::default();
        assert!(!session.navigate(Screen::Search));
        assert_eq!(session.screen(), Screen::Home);

        session.sign_in(Identity::new("ada"));
        assert!(session.navigate(Screen::ImageEdit));
        assert_eq!(session.screen(), Screen::ImageEdit);
    }

    #[test]
    fn sign_out_clears_identity_and_screen() {
        let mut session = Session::default();
        session.sign_in(Identity::new("ada"));
        session.navigate(Screen::Search);
        session.sign_out();
        assert!(session.identity().is_none());
        assert_eq!(session.screen(), Screen::Home);
    }

    #[test]
    fn identity_keeps_unknown_backend_fields() {
        let identity: Identity =
            serde_json::from_str(r#"{"username":"ada","email":"ada@example.com"}"#).unwrap();
        assert_eq!(identity.username, "ada");
        assert_eq!(
            identity.extra.get("email"),
            Some(&Value::String("ada@example.com".into()))
        );
    }
}
