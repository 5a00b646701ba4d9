//! Derives the `ViewModel` from the `Model`. Pure: no capabilities, no
//! mutation. The shell renders exactly what it is given here.

use serde::{Deserialize, Serialize};

use crate::lifecycle::Outcome;
use crate::model::{AuthAttempt, AuthMode, AuthScreen, ImageEditScreen, Model, SearchScreen};
use crate::remote::{GroundingMetadata, SearchAnswer};
use crate::session::{Screen, SocialProvider};

pub const IMAGE_PLACEHOLDER: &str = "Your images will appear here";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModel {
    /// Present only while signed in.
    pub header: Option<HeaderView>,
    pub screen: ScreenView,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderView {
    pub greeting: String,
    pub nav: Vec<NavItem>,
    pub logout_label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub screen: Screen,
    pub label: String,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScreenView {
    Auth(AuthView),
    Home(HomeView),
    Search(SearchView),
    ImageEdit(ImageEditView),
}

impl Default for ScreenView {
    fn default() -> Self {
        Self::Auth(AuthView::default())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthView {
    pub title: String,
    pub subtitle: String,
    pub submit_label: String,
    pub toggle_label: String,
    pub social: Vec<SocialButton>,
    pub busy: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialButton {
    pub provider: SocialProvider,
    pub label: String,
    pub enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeView {
    pub title: String,
    pub subtitle: String,
    pub features: Vec<FeatureCard>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCard {
    pub screen: Screen,
    pub title: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchView {
    pub prompt: String,
    pub can_submit: bool,
    pub submit_label: String,
    pub error: Option<String>,
    pub result: Option<String>,
    pub sources: Vec<SourceLink>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLink {
    pub uri: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEditView {
    pub select_label: String,
    pub prompt: String,
    pub prompt_enabled: bool,
    pub can_submit: bool,
    pub submit_label: String,
    pub error: Option<String>,
    pub original: Option<String>,
    pub edited: Option<String>,
    pub edit_pending: bool,
    pub placeholder: Option<String>,
}

#[must_use]
pub fn compose(model: &Model) -> ViewModel {
    let Some(identity) = model.session.identity() else {
        return ViewModel {
            header: None,
            screen: ScreenView::Auth(auth_view(&model.auth)),
        };
    };

    let active = model.session.screen();
    let header = HeaderView {
        greeting: format!("Welcome, {}", identity.username),
        nav: Screen::ALL
            .into_iter()
            .map(|screen| NavItem {
                screen,
                label: screen.label().to_string(),
                active: screen == active,
            })
            .collect(),
        logout_label: "Logout".to_string(),
    };

    let screen = match active {
        Screen::Home => ScreenView::Home(home_view()),
        Screen::Search => ScreenView::Search(search_view(&model.search)),
        Screen::ImageEdit => ScreenView::ImageEdit(image_edit_view(&model.image_edit)),
    };

    ViewModel {
        header: Some(header),
        screen,
    }
}

fn auth_view(auth: &AuthScreen) -> AuthView {
    let busy = auth.request.is_pending();
    let pending = if busy { auth.attempt } else { None };

    let (title, subtitle, idle_label, busy_label, toggle_label) = match auth.mode {
        AuthMode::Login => (
            "Welcome Back",
            "Sign in to your account",
            "Login",
            "Logging in...",
            "Don't have an account? Sign Up",
        ),
        AuthMode::Signup => (
            "Create Account",
            "Get started with Gemini Suite",
            "Sign Up",
            "Signing up...",
            "Already have an account? Login",
        ),
    };

    let submit_label = if matches!(pending, Some(AuthAttempt::Credentials(_))) {
        busy_label
    } else {
        idle_label
    };

    let social = SocialProvider::ALL
        .into_iter()
        .map(|provider| SocialButton {
            provider,
            label: if pending == Some(AuthAttempt::Social(provider)) {
                "Connecting...".to_string()
            } else {
                format!("Continue with {provider}")
            },
            enabled: !busy,
        })
        .collect();

    AuthView {
        title: title.to_string(),
        subtitle: subtitle.to_string(),
        submit_label: submit_label.to_string(),
        toggle_label: toggle_label.to_string(),
        social,
        busy,
        error: auth.request.outcome().error_message().map(str::to_string),
    }
}

fn home_view() -> HomeView {
    HomeView {
        title: "Welcome to the Gemini Creative Suite".to_string(),
        subtitle: "Leverage the power of Gemini for cutting-edge search and image creation. \
                   Choose a tool below to get started."
            .to_string(),
        features: vec![
            FeatureCard {
                screen: Screen::Search,
                title: "Grounded Search".to_string(),
                description: "Ask complex questions and get up-to-date, accurate answers \
                              grounded in Google Search."
                    .to_string(),
            },
            FeatureCard {
                screen: Screen::ImageEdit,
                title: "AI Image Editor".to_string(),
                description: "Upload an image and use simple text prompts to perform \
                              powerful AI-driven edits."
                    .to_string(),
            },
        ],
    }
}

fn search_view(search: &SearchScreen) -> SearchView {
    let pending = search.request.is_pending();
    let answer = search.request.outcome().success();

    SearchView {
        prompt: search.prompt.clone(),
        can_submit: !pending && !search.prompt.trim().is_empty(),
        submit_label: if pending { "Searching..." } else { "Search" }.to_string(),
        error: search.request.outcome().error_message().map(str::to_string),
        result: answer.map(|a| a.text.clone()),
        sources: answer.map(source_links).unwrap_or_default(),
    }
}

/// One link per web citation. Chunks from other retrieval sources carry no
/// web location and are skipped.
#[must_use]
pub fn source_links(answer: &SearchAnswer) -> Vec<SourceLink> {
    answer
        .metadata
        .as_ref()
        .map(|GroundingMetadata { grounding_chunks, .. }| {
            grounding_chunks
                .iter()
                .filter_map(|chunk| chunk.web.as_ref())
                .filter(|web| !web.uri.is_empty())
                .map(|web| SourceLink {
                    uri: web.uri.clone(),
                    label: web
                        .title
                        .as_deref()
                        .map(str::trim)
                        .filter(|title| !title.is_empty())
                        .unwrap_or(web.uri.as_str())
                        .to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn image_edit_view(screen: &ImageEditScreen) -> ImageEditView {
    let original = screen.source_image();
    let edit_pending = screen.edit.is_pending();
    let has_image = original.is_some();

    let error = match screen.edit.outcome() {
        Outcome::Idle => screen.source.outcome().error_message(),
        outcome => outcome.error_message(),
    };

    ImageEditView {
        select_label: if has_image { "Change Image" } else { "Select an Image" }.to_string(),
        prompt: screen.prompt.clone(),
        prompt_enabled: has_image && !edit_pending,
        can_submit: has_image && !edit_pending && !screen.prompt.trim().is_empty(),
        submit_label: if edit_pending { "Generating..." } else { "Apply Edit" }.to_string(),
        error: error.map(str::to_string),
        original: original.map(|image| image.data_uri()),
        edited: screen.edit.outcome().success().map(|image| image.data_uri()),
        edit_pending,
        placeholder: (!has_image).then(|| IMAGE_PLACEHOLDER.to_string()),
    }
}
