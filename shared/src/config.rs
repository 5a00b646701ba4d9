use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::event::Secret;

pub const AUTH_BASE_URL_VAR: &str = "AUTH_API_BASE_URL";
pub const GEMINI_BASE_URL_VAR: &str = "GEMINI_API_BASE_URL";
pub const SEARCH_MODEL_VAR: &str = "GEMINI_SEARCH_MODEL";
pub const IMAGE_MODEL_VAR: &str = "GEMINI_IMAGE_MODEL";
pub const API_KEY_VAR: &str = "API_KEY";

pub const DEFAULT_AUTH_BASE_URL: &str = "http://localhost:3000/api/auth";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_SEARCH_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid base URL ({value}): {reason}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the core needs to reach its collaborators. Resolved once by the
/// shell at startup and handed over with `Event::Configure`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub auth_base_url: String,
    pub gemini_base_url: String,
    pub search_model: String,
    pub image_model: String,
    pub api_key: Secret,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            search_model: DEFAULT_SEARCH_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            api_key: Secret::new(PLACEHOLDER_API_KEY.to_string()),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key/value source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let api_key = if let Some(key) = get(API_KEY_VAR) {
            Secret::new(key)
        } else {
            tracing::warn!(
                var = API_KEY_VAR,
                "API key not set, using a placeholder; Gemini requests will be rejected"
            );
            defaults.api_key.clone()
        };

        Self {
            auth_base_url: get(AUTH_BASE_URL_VAR).unwrap_or(defaults.auth_base_url),
            gemini_base_url: get(GEMINI_BASE_URL_VAR).unwrap_or(defaults.gemini_base_url),
            search_model: get(SEARCH_MODEL_VAR).unwrap_or(defaults.search_model),
            image_model: get(IMAGE_MODEL_VAR).unwrap_or(defaults.image_model),
            api_key,
        }
        .validated()
    }

    /// Checks both base URLs and trims trailing slashes so paths can be
    /// appended verbatim.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        self.auth_base_url = validate_base_url(AUTH_BASE_URL_VAR, &self.auth_base_url)?;
        self.gemini_base_url = validate_base_url(GEMINI_BASE_URL_VAR, &self.gemini_base_url)?;
        Ok(self)
    }

    #[must_use]
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/{}", self.auth_base_url, path.trim_start_matches('/'))
    }

    #[must_use]
    pub fn generate_content_url(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.gemini_base_url)
    }
}

fn validate_base_url(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        name,
        value: value.to_string(),
        reason,
    };

    let parsed = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(value.trim_end_matches('/').to_string())
}
