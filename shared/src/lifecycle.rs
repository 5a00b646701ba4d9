//! Request lifecycle shared by every screen.
//!
//! A screen owns one [`Lifecycle`] per kind of outstanding call. Each dispatch
//! gets a fresh [`Ticket`]; the ticket rides along in the capability callback
//! and comes back with the resolution. Only the current ticket may settle the
//! lifecycle, so a reply that arrives after the user moved on is dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::OperationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket(Uuid);

impl Ticket {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Outcome<T> {
    #[default]
    Idle,
    /// A local precondition failed before anything was sent.
    Rejected(String),
    Pending,
    Success(T),
    Failure(OperationError),
}

impl<T> Outcome<T> {
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    #[must_use]
    pub const fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    /// The message to show for this outcome, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Rejected(message) => Some(message),
            Self::Failure(error) => Some(&error.message),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lifecycle<T> {
    outcome: Outcome<T>,
    current: Option<Ticket>,
}

impl<T> Default for Lifecycle<T> {
    fn default() -> Self {
        Self {
            outcome: Outcome::Idle,
            current: None,
        }
    }
}

impl<T> Lifecycle<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn outcome(&self) -> &Outcome<T> {
        &self.outcome
    }

    #[must_use]
    pub const fn current_ticket(&self) -> Option<Ticket> {
        self.current
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.outcome.is_pending()
    }

    /// Starts a new cycle. Whatever was displayed before is cleared and any
    /// earlier ticket stops being current.
    pub fn begin(&mut self) -> Ticket {
        let ticket = Ticket::generate();
        if let Some(previous) = self.current.replace(ticket) {
            tracing::debug!(%previous, %ticket, "superseding outstanding request");
        }
        self.outcome = Outcome::Pending;
        ticket
    }

    pub fn reject(&mut self, message: impl Into<String>) {
        self.current = None;
        self.outcome = Outcome::Rejected(message.into());
    }

    /// Applies a resolution if `ticket` is still current. Returns whether the
    /// resolution was applied.
    pub fn settle(&mut self, ticket: Ticket, result: Result<T, OperationError>) -> bool {
        if self.current != Some(ticket) {
            tracing::debug!(%ticket, "discarding superseded resolution");
            return false;
        }
        self.current = None;
        self.outcome = match result {
            Ok(value) => Outcome::Success(value),
            Err(error) => Outcome::Failure(error),
        };
        true
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.outcome = Outcome::Idle;
    }
}
