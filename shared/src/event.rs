use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

use crate::capabilities::{FileReadResult, FileRef};
use crate::config::Config;
use crate::encoding::EncodedImage;
use crate::error::OperationResult;
use crate::lifecycle::Ticket;
use crate::remote::SearchAnswer;
use crate::session::{Identity, Screen, SocialProvider};

// --- Secret: redacted in Debug, wiped on Drop ---

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    #[must_use]
    pub fn new(s: String) -> Self {
        Self(s)
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

// --- Event enum: shell actions first, capability resolutions last; large variants boxed ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    /// Sent once by the shell at startup. Later ones are ignored.
    Configure(Box<Config>),

    // Auth
    AuthModeToggled,
    CredentialsSubmitted {
        username: String,
        password: Secret,
    },
    SocialLoginRequested {
        provider: SocialProvider,
    },
    LogoutRequested,

    // Navigation
    Navigate {
        screen: Screen,
    },

    // Grounded search
    SearchPromptChanged {
        prompt: String,
    },
    SearchSubmitted,

    // Image editing
    ImageSelected {
        file: FileRef,
    },
    EditPromptChanged {
        prompt: String,
    },
    EditSubmitted,

    // Capability resolutions
    AuthSettled {
        ticket: Ticket,
        result: Box<OperationResult<Identity>>,
    },
    SearchSettled {
        ticket: Ticket,
        result: Box<OperationResult<SearchAnswer>>,
    },
    ImageRead {
        ticket: Ticket,
        result: Box<FileReadResult>,
    },
    EditSettled {
        ticket: Ticket,
        result: Box<OperationResult<EncodedImage>>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Configure(_) => "configure",
            Self::AuthModeToggled => "auth_mode_toggled",
            Self::CredentialsSubmitted { .. } => "credentials_submitted",
            Self::SocialLoginRequested { .. } => "social_login_requested",
            Self::LogoutRequested => "logout_requested",
            Self::Navigate { .. } => "navigate",
            Self::SearchPromptChanged { .. } => "search_prompt_changed",
            Self::SearchSubmitted => "search_submitted",
            Self::ImageSelected { .. } => "image_selected",
            Self::EditPromptChanged { .. } => "edit_prompt_changed",
            Self::EditSubmitted => "edit_submitted",
            Self::AuthSettled { .. } => "auth_settled",
            Self::SearchSettled { .. } => "search_settled",
            Self::ImageRead { .. } => "image_read",
            Self::EditSettled { .. } => "edit_settled",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        !matches!(
            self,
            Self::Configure(_)
                | Self::AuthSettled { .. }
                | Self::SearchSettled { .. }
                | Self::ImageRead { .. }
                | Self::EditSettled { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_debug_is_redacted() {
        let s = Secret::new("super_secret".into());
        assert_eq!(format!("{s:?}"), "[REDACTED]");
    }

    #[test]
    fn secret_serializes_as_plain_string() {
        let json = serde_json::to_string(&Secret::from("pw")).unwrap();
        assert_eq!(json, r#""pw""#);
    }

    #[test]
    fn submitted_password_never_shows_in_debug() {
        let event = Event::CredentialsSubmitted {
            username: "ada".into(),
            password: Secret::from("hunter2"),
        };
        assert!(!format!("{event:?}").contains("hunter2"));
    }

    #[test]
    fn resolutions_are_not_user_initiated() {
        assert!(Event::SearchSubmitted.is_user_initiated());
        assert!(!Event::SearchSettled {
            ticket: Ticket::generate(),
            result: Box::new(Ok(SearchAnswer::default())),
        }
        .is_user_initiated());
    }

    #[test]
    fn event_size_is_reasonable() {
        // Ensure boxing keeps the enum small.
        let size = std::mem::size_of::<Event>();
        assert!(
            size <= 96,
            "Event enum is {size} bytes, box more variants"
        );
    }
}
