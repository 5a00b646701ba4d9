use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::FileReadError;
use crate::encoding::EncodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A local precondition failed; nothing was sent.
    Validation,
    /// The collaborator answered with a non-success status, or never answered.
    Transport,
    /// The collaborator answered successfully but without the expected payload.
    Content,
    /// A picked file could not be read or encoded.
    Read,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Transport => "TRANSPORT_ERROR",
            Self::Content => "CONTENT_ERROR",
            Self::Read => "READ_ERROR",
        }
    }
}

/// The single error type every screen settles into. `message` is always
/// human-readable and never empty.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("{message}")]
pub struct OperationError {
    pub kind: ErrorKind,
    pub message: String,
}

impl OperationError {
    pub const GENERIC_MESSAGE: &'static str = "An unexpected error occurred.";

    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            Self::GENERIC_MESSAGE.to_string()
        } else {
            message
        };
        Self { kind, message }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    #[must_use]
    pub fn content(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Content, message)
    }

    #[must_use]
    pub fn read(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Read, message)
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl From<EncodeError> for OperationError {
    fn from(e: EncodeError) -> Self {
        Self::read(e.to_string())
    }
}

impl From<FileReadError> for OperationError {
    fn from(e: FileReadError) -> Self {
        Self::read(e.to_string())
    }
}

pub type OperationResult<T> = Result<T, OperationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_message_falls_back_to_generic_text() {
        let err = OperationError::transport("   ");
        assert_eq!(err.message, OperationError::GENERIC_MESSAGE);
        assert_eq!(err.to_string(), OperationError::GENERIC_MESSAGE);
    }

    #[test]
    fn display_is_the_bare_message() {
        let err = OperationError::content("No image data found in the response.");
        assert_eq!(err.to_string(), "No image data found in the response.");
        assert_eq!(err.code(), "CONTENT_ERROR");
    }

    #[test]
    fn encode_errors_become_read_errors() {
        let err: OperationError = EncodeError::Empty.into();
        assert_eq!(err.kind, ErrorKind::Read);
        assert!(!err.message.is_empty());
    }
}
