//! Binary payload encoding for picked images.
//!
//! The Gemini API takes image bytes as a bare base64 string and hands edited
//! images back the same way, while the shell renders images from
//! `data:<mime>;base64,<payload>` URIs. [`EncodedImage`] keeps only the
//! `(mime, payload)` pair and derives the URI on demand, so the two can never
//! drift apart.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DATA_URI_SCHEME: &str = "data:";
pub const BASE64_MARKER: &str = ";base64";

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EncodeError {
    #[error("The selected file is empty.")]
    Empty,

    #[error("Not a data URI: missing `data:<mime>;base64,` prefix.")]
    MissingPrefix,

    #[error("The data URI is not base64 encoded.")]
    NotBase64,

    #[error("Invalid base64 payload: {0}")]
    InvalidPayload(String),

    #[error("Unsupported file type: {0}. Please select an image.")]
    UnsupportedMime(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    mime_type: String,
    payload: String,
}

impl EncodedImage {
    /// Encodes raw file bytes. An empty `declared_mime` is resolved by
    /// sniffing the bytes.
    pub fn from_bytes(declared_mime: &str, bytes: &[u8]) -> Result<Self, EncodeError> {
        if bytes.is_empty() {
            return Err(EncodeError::Empty);
        }
        let mime_type = resolve_mime_type(declared_mime, bytes)?;
        Ok(Self {
            mime_type,
            payload: encode_payload(bytes),
        })
    }

    /// Parses a shell-produced `data:` URI, keeping its payload verbatim.
    pub fn from_data_uri(uri: &str) -> Result<Self, EncodeError> {
        let payload = strip_data_uri_prefix(uri)?;
        let header = &uri[DATA_URI_SCHEME.len()..uri.len() - payload.len() - 1];
        let mime = header
            .trim_end_matches(BASE64_MARKER)
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        let bytes = BASE64_STANDARD
            .decode(payload)
            .map_err(|e| EncodeError::InvalidPayload(e.to_string()))?;
        if bytes.is_empty() {
            return Err(EncodeError::Empty);
        }

        Ok(Self {
            mime_type: resolve_mime_type(&mime, &bytes)?,
            payload: payload.to_string(),
        })
    }

    /// Wraps an already encoded payload, e.g. an inline image part returned
    /// by the model.
    #[must_use]
    pub fn from_parts(mime_type: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            payload: payload.into(),
        }
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Base64 payload without any `data:` prefix.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    #[must_use]
    pub fn data_uri(&self) -> String {
        data_uri(&self.mime_type, &self.payload)
    }
}

#[must_use]
pub fn encode_payload(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

#[must_use]
pub fn data_uri(mime_type: &str, payload: &str) -> String {
    format!("{DATA_URI_SCHEME}{mime_type}{BASE64_MARKER},{payload}")
}

/// Returns the payload of a `data:<mime>;base64,<payload>` URI.
///
/// A string without the prefix is an error rather than being passed through
/// whole.
pub fn strip_data_uri_prefix(uri: &str) -> Result<&str, EncodeError> {
    let rest = uri
        .strip_prefix(DATA_URI_SCHEME)
        .ok_or(EncodeError::MissingPrefix)?;
    let (header, payload) = rest.split_once(',').ok_or(EncodeError::MissingPrefix)?;
    if !header.ends_with(BASE64_MARKER) {
        return Err(EncodeError::NotBase64);
    }
    Ok(payload)
}

/// Picks the MIME type for a selected file: the declared one when it names an
/// image, otherwise whatever the bytes look like.
pub fn resolve_mime_type(declared: &str, bytes: &[u8]) -> Result<String, EncodeError> {
    let declared = declared.trim().to_ascii_lowercase();
    if declared.is_empty() {
        return image::guess_format(bytes)
            .map(|format| format.to_mime_type().to_string())
            .map_err(|_| EncodeError::UnsupportedMime("unknown".to_string()));
    }
    if !declared.starts_with("image/") {
        return Err(EncodeError::UnsupportedMime(declared));
    }
    Ok(declared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    #[test]
    fn encodes_bytes_and_builds_uri() {
        let image = EncodedImage::from_bytes("image/png", b"hello").unwrap();
        assert_eq!(image.payload(), "aGVsbG8=");
        assert_eq!(image.data_uri(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn strips_prefix() {
        assert_eq!(
            strip_data_uri_prefix("data:image/jpeg;base64,AAAA").unwrap(),
            "AAAA"
        );
    }

    #[test]
    fn missing_prefix_is_an_error() {
        assert_eq!(
            strip_data_uri_prefix("AAAA"),
            Err(EncodeError::MissingPrefix)
        );
        assert_eq!(
            strip_data_uri_prefix("data:image/png;base64"),
            Err(EncodeError::MissingPrefix)
        );
    }

    #[test]
    fn non_base64_data_uri_is_rejected() {
        assert_eq!(
            strip_data_uri_prefix("data:text/plain,hello"),
            Err(EncodeError::NotBase64)
        );
    }

    #[test]
    fn empty_file_is_rejected() {
        assert_eq!(
            EncodedImage::from_bytes("image/png", &[]),
            Err(EncodeError::Empty)
        );
    }

    #[test]
    fn missing_mime_is_sniffed() {
        let image = EncodedImage::from_bytes("", PNG_SIGNATURE).unwrap();
        assert_eq!(image.mime_type(), "image/png");
    }

    #[test]
    fn non_image_mime_is_rejected() {
        assert_matches::assert_matches!(
            EncodedImage::from_bytes("application/pdf", b"%PDF-1.7"),
            Err(EncodeError::UnsupportedMime(mime)) if mime == "application/pdf"
        );
    }

    #[test]
    fn unrecognisable_bytes_without_mime_are_rejected() {
        assert_matches::assert_matches!(
            EncodedImage::from_bytes("", b"plain text"),
            Err(EncodeError::UnsupportedMime(_))
        );
    }

    #[test]
    fn from_data_uri_reads_mime_and_payload() {
        let image = EncodedImage::from_data_uri("data:image/webp;base64,aGVsbG8=").unwrap();
        assert_eq!(image.mime_type(), "image/webp");
        assert_eq!(image.payload(), "aGVsbG8=");
    }

    #[test]
    fn from_data_uri_rejects_garbage_payload() {
        assert_matches::assert_matches!(
            EncodedImage::from_data_uri("data:image/png;base64,!!!"),
            Err(EncodeError::InvalidPayload(_))
        );
    }

    proptest! {
        #[test]
        fn data_uri_round_trips_without_drift(bytes in proptest::collection::vec(any::<u8>(), 1..512)) {
            let encoded = EncodedImage::from_bytes("image/jpeg", &bytes).unwrap();
            let uri = encoded.data_uri();
            prop_assert_eq!(strip_data_uri_prefix(&uri).unwrap(), encoded.payload());

            let reparsed = EncodedImage::from_data_uri(&uri).unwrap();
            prop_assert_eq!(&reparsed, &encoded);
        }
    }
}
