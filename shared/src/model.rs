use serde::{Deserialize, Serialize};

use crate::capabilities::FileRef;
use crate::config::Config;
use crate::encoding::EncodedImage;
use crate::lifecycle::Lifecycle;
use crate::remote::SearchAnswer;
use crate::session::{Identity, Session, SocialProvider};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMode {
    #[default]
    Login,
    Signup,
}

impl AuthMode {
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Login => Self::Signup,
            Self::Signup => Self::Login,
        }
    }
}

/// What the in-flight auth request was started by, so the view can show the
/// right busy indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthAttempt {
    Credentials(AuthMode),
    Social(SocialProvider),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthScreen {
    pub mode: AuthMode,
    pub attempt: Option<AuthAttempt>,
    pub request: Lifecycle<Identity>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchScreen {
    pub prompt: String,
    pub request: Lifecycle<SearchAnswer>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageEditScreen {
    pub selected: Option<FileRef>,
    pub prompt: String,
    /// Reading and encoding the picked file.
    pub source: Lifecycle<EncodedImage>,
    pub edit: Lifecycle<EncodedImage>,
}

impl ImageEditScreen {
    #[must_use]
    pub fn source_image(&self) -> Option<&EncodedImage> {
        self.source.outcome().success()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub config: Config,
    pub configured: bool,
    pub session: Session,
    pub auth: AuthScreen,
    pub search: SearchScreen,
    pub image_edit: ImageEditScreen,
}

impl Model {
    /// Drops everything tied to the signed-in user. Configuration survives.
    pub fn clear_user_state(&mut self) {
        self.session.sign_out();
        self.auth = AuthScreen::default();
        self.search = SearchScreen::default();
        self.image_edit = ImageEditScreen::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_mode_toggles_back_and_forth() {
        assert_eq!(AuthMode::Login.toggle(), AuthMode::Signup);
        assert_eq!(AuthMode::Login.toggle().toggle(), AuthMode::Login);
    }

    #[test]
    fn clearing_user_state_keeps_config() {
        let mut model = Model {
            config: Config {
                search_model: "custom".into(),
                ..Config::default()
            },
            configured: true,
            ..Model::default()
        };
        model.session.sign_in(Identity::new("ada"));
        model.search.prompt = "latest F1 race".into();
        model.search.request.begin();

        model.clear_user_state();

        assert!(!model.session.is_authenticated());
        assert!(model.search.prompt.is_empty());
        assert!(model.search.request.current_ticket().is_none());
        assert!(model.configured);
        assert_eq!(model.config.search_model, "custom");
    }
}
