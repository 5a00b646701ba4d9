//! Remote operations: the auth backend and the Gemini `generateContent` API.
//!
//! Every operation sends exactly one request through the `Http` capability and
//! hands the caller a fully decoded `OperationResult`. Nothing is retried,
//! batched or queued. Reply interpretation is split out into plain functions
//! over `(status, body)` so it can be exercised without a shell.

use crux_http::Http;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::encoding::{data_uri, EncodedImage};
use crate::error::{OperationError, OperationResult};
use crate::event::Secret;
use crate::session::{Identity, SocialProvider};

pub const API_KEY_HEADER: &str = "x-goog-api-key";
pub const NO_IMAGE_MESSAGE: &str = "No image data found in the response.";
const FALLBACK_IMAGE_MIME: &str = "image/png";

pub type HttpReply = crux_http::Result<crux_http::Response<Vec<u8>>>;

/// Names the call a reply belongs to, for error messages and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteOp {
    Login,
    Signup,
    SocialLogin(SocialProvider),
    GroundedSearch,
    EditImage,
}

impl RemoteOp {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Signup => "signup",
            Self::SocialLogin(_) => "social_login",
            Self::GroundedSearch => "grounded_search",
            Self::EditImage => "edit_image",
        }
    }

    /// Used when the collaborator failed without saying why.
    #[must_use]
    pub fn fallback_message(self) -> String {
        match self {
            Self::Login => "Login failed.".into(),
            Self::Signup => "Signup failed.".into(),
            Self::SocialLogin(provider) => format!("Social login with {provider} failed."),
            Self::GroundedSearch => "Failed to fetch search results from Gemini API.".into(),
            Self::EditImage => "Failed to edit image using Gemini API.".into(),
        }
    }
}

// --- Auth wire types ---

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: Secret,
}

impl Credentials {
    pub const REQUIRED_MESSAGE: &'static str = "Username and password are required.";

    /// Both fields must be present. Whitespace-only usernames count as
    /// missing; passwords are taken verbatim.
    pub fn new(username: impl Into<String>, password: Secret) -> OperationResult<Self> {
        let username = username.into();
        if username.trim().is_empty() || password.is_empty() {
            return Err(OperationError::validation(Self::REQUIRED_MESSAGE));
        }
        Ok(Self { username, password })
    }
}

#[derive(Serialize)]
struct SocialLoginRequest {
    provider: SocialProvider,
}

// --- Gemini wire types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
struct GoogleSearch {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

/// Citations attached to a grounded answer, passed through as the model sent
/// them. Chunks without a `web` source are the renderer's concern.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub web_search_queries: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebSource>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSource {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchAnswer {
    pub text: String,
    pub metadata: Option<GroundingMetadata>,
}

/// Error bodies from either collaborator: `{"message": ...}` from the auth
/// backend, `{"error": {"message": ...}}` from Gemini.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<NestedError>,
}

#[derive(Deserialize)]
struct NestedError {
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or_else(|| self.error.and_then(|e| e.message))
            .filter(|m| !m.trim().is_empty())
    }
}

// --- Operations ---

pub fn login<Ev, F>(
    http: &Http<Ev>,
    config: &Config,
    credentials: &Credentials,
    make_event: F,
) -> OperationResult<()>
where
    Ev: 'static,
    F: FnOnce(OperationResult<Identity>) -> Ev + Send + 'static,
{
    post_json(
        http,
        &config.auth_url("login"),
        None,
        credentials,
        RemoteOp::Login,
        decode_identity,
        make_event,
    )
}

pub fn signup<Ev, F>(
    http: &Http<Ev>,
    config: &Config,
    credentials: &Credentials,
    make_event: F,
) -> OperationResult<()>
where
    Ev: 'static,
    F: FnOnce(OperationResult<Identity>) -> Ev + Send + 'static,
{
    post_json(
        http,
        &config.auth_url("signup"),
        None,
        credentials,
        RemoteOp::Signup,
        decode_identity,
        make_event,
    )
}

pub fn social_login<Ev, F>(
    http: &Http<Ev>,
    config: &Config,
    provider: SocialProvider,
    make_event: F,
) -> OperationResult<()>
where
    Ev: 'static,
    F: FnOnce(OperationResult<Identity>) -> Ev + Send + 'static,
{
    post_json(
        http,
        &config.auth_url("social"),
        None,
        &SocialLoginRequest { provider },
        RemoteOp::SocialLogin(provider),
        decode_identity,
        make_event,
    )
}

pub fn grounded_search<Ev, F>(
    http: &Http<Ev>,
    config: &Config,
    prompt: &str,
    make_event: F,
) -> OperationResult<()>
where
    Ev: 'static,
    F: FnOnce(OperationResult<SearchAnswer>) -> Ev + Send + 'static,
{
    post_json(
        http,
        &config.generate_content_url(&config.search_model),
        Some(&config.api_key),
        &search_request(prompt),
        RemoteOp::GroundedSearch,
        decode_search,
        make_event,
    )
}

pub fn edit_image<Ev, F>(
    http: &Http<Ev>,
    config: &Config,
    image: &EncodedImage,
    prompt: &str,
    make_event: F,
) -> OperationResult<()>
where
    Ev: 'static,
    F: FnOnce(OperationResult<EncodedImage>) -> Ev + Send + 'static,
{
    post_json(
        http,
        &config.generate_content_url(&config.image_model),
        Some(&config.api_key),
        &edit_request(image, prompt),
        RemoteOp::EditImage,
        decode_edited_image,
        make_event,
    )
}

fn search_request(prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![Part::Text {
                text: prompt.to_string(),
            }],
        }],
        tools: vec![Tool {
            google_search: GoogleSearch {},
        }],
        generation_config: None,
    }
}

fn edit_request(image: &EncodedImage, prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: image.mime_type().to_string(),
                        data: image.payload().to_string(),
                    },
                },
                Part::Text {
                    text: prompt.to_string(),
                },
            ],
        }],
        tools: Vec::new(),
        generation_config: Some(GenerationConfig {
            response_modalities: vec!["IMAGE"],
        }),
    }
}

fn post_json<Ev, B, T, F>(
    http: &Http<Ev>,
    url: &str,
    api_key: Option<&Secret>,
    body: &B,
    op: RemoteOp,
    decode: fn(&[u8]) -> OperationResult<T>,
    make_event: F,
) -> OperationResult<()>
where
    Ev: 'static,
    B: Serialize,
    T: 'static,
    F: FnOnce(OperationResult<T>) -> Ev + Send + 'static,
{
    let mut builder = http.post(url).body_json(body).map_err(|e| {
        OperationError::validation(format!("{} ({e})", op.fallback_message()))
    })?;
    if let Some(key) = api_key {
        builder = builder.header(API_KEY_HEADER, key.expose());
    }

    tracing::info!(op = op.name(), url, "dispatching remote operation");
    builder.send(move |reply| make_event(settle(op, reply, decode)));
    Ok(())
}

/// Turns whatever the `Http` capability resolved with into the operation's
/// result. A status error still carries the reply, so it is read the same way
/// as a non-2xx response; only a reply that never arrived is a transport
/// failure.
pub fn settle<T>(
    op: RemoteOp,
    reply: HttpReply,
    decode: fn(&[u8]) -> OperationResult<T>,
) -> OperationResult<T> {
    match reply {
        Ok(mut response) => {
            let status = u16::from(response.status());
            let body = response.take_body().unwrap_or_default();
            interpret(op, status, &body, decode)
        }
        Err(crux_http::Error::Http(err)) => {
            interpret(op, u16::from(err.code), err.body.as_deref().unwrap_or_default(), decode)
        }
        Err(e) => {
            tracing::warn!(op = op.name(), error = %e, "remote operation failed in transport");
            Err(OperationError::transport(format!(
                "{} ({e})",
                op.fallback_message()
            )))
        }
    }
}

pub fn interpret<T>(
    op: RemoteOp,
    status: u16,
    body: &[u8],
    decode: fn(&[u8]) -> OperationResult<T>,
) -> OperationResult<T> {
    if (200..300).contains(&status) {
        return decode(body);
    }
    let error = error_from_reply(op, status, body);
    tracing::warn!(op = op.name(), status, message = %error.message, "remote operation rejected");
    Err(error)
}

/// Message for a non-success reply: the body's own message if it has one,
/// the operation's fallback if the body parses without one, and a status
/// template if the body is not JSON at all.
#[must_use]
pub fn error_from_reply(op: RemoteOp, status: u16, body: &[u8]) -> OperationError {
    let message = match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => parsed
            .into_message()
            .unwrap_or_else(|| op.fallback_message()),
        Err(_) => format!("Request failed with status {status}"),
    };
    OperationError::transport(message)
}

pub fn decode_identity(body: &[u8]) -> OperationResult<Identity> {
    serde_json::from_slice(body).map_err(|e| {
        OperationError::content(format!(
            "Unexpected response from the authentication service ({e})."
        ))
    })
}

pub fn decode_search(body: &[u8]) -> OperationResult<SearchAnswer> {
    let response = parse_generate_content(body)?;
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| OperationError::content("The model returned no answer."))?;

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    Ok(SearchAnswer {
        text,
        metadata: candidate.grounding_metadata,
    })
}

/// Returns the first inline image among the first candidate's parts.
pub fn decode_edited_image(body: &[u8]) -> OperationResult<EncodedImage> {
    let response = parse_generate_content(body)?;
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .into_iter()
        .flat_map(|content| content.parts)
        .find_map(|part| part.inline_data.filter(|data| !data.data.is_empty()))
        .ok_or_else(|| OperationError::content(NO_IMAGE_MESSAGE))
        .and_then(|data| {
            let mime = if data.mime_type.is_empty() {
                FALLBACK_IMAGE_MIME
            } else {
                data.mime_type.as_str()
            };
            // Same parser as shell-supplied URIs: the payload must be base64.
            EncodedImage::from_data_uri(&data_uri(mime, &data.data)).map_err(|e| {
                OperationError::content(format!("The model returned an unusable image ({e})."))
            })
        })
}

fn parse_generate_content(body: &[u8]) -> OperationResult<GenerateContentResponse> {
    serde_json::from_slice(body).map_err(|e| {
        OperationError::content(format!("Unexpected response from Gemini API ({e})."))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn credentials_require_both_fields() {
        let err = Credentials::new("ada", Secret::from("")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "Username and password are required.");
        assert!(Credentials::new("   ", Secret::from("pw")).is_err());
        assert!(Credentials::new("ada", Secret::from("pw")).is_ok());
    }

    #[test]
    fn credentials_serialize_as_plain_json() {
        let credentials = Credentials::new("ada", Secret::from("pw")).unwrap();
        assert_eq!(
            serde_json::to_value(&credentials).unwrap(),
            json!({ "username": "ada", "password": "pw" })
        );
    }

    #[test]
    fn social_request_names_provider() {
        let request = SocialLoginRequest {
            provider: SocialProvider::GitHub,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "provider": "GitHub" })
        );
    }

    #[test]
    fn unauthorized_reply_uses_backend_message() {
        let result = interpret(
            RemoteOp::Login,
            401,
            &body(json!({ "message": "bad credentials" })),
            decode_identity,
        );
        assert_matches!(result, Err(e) if e.message == "bad credentials" && e.kind == ErrorKind::Transport);
    }

    #[test]
    fn unparsable_error_body_uses_status_template() {
        let result = interpret(RemoteOp::Login, 500, b"<html>oops</html>", decode_identity);
        assert_matches!(result, Err(e) if e.message == "Request failed with status 500");
    }

    #[test]
    fn json_error_without_message_uses_operation_fallback() {
        let err = error_from_reply(
            RemoteOp::SocialLogin(SocialProvider::Google),
            403,
            &body(json!({ "code": 7 })),
        );
        assert_eq!(err.message, "Social login with Google failed.");
    }

    #[test]
    fn gemini_error_shape_is_understood() {
        let err = error_from_reply(
            RemoteOp::GroundedSearch,
            400,
            &body(json!({ "error": { "code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT" } })),
        );
        assert_eq!(err.message, "API key not valid.");
    }

    #[test]
    fn successful_login_decodes_identity() {
        let identity = interpret(
            RemoteOp::Login,
            200,
            &body(json!({ "username": "ada" })),
            decode_identity,
        )
        .unwrap();
        assert_eq!(identity.username, "ada");
    }

    #[test]
    fn success_without_identity_is_a_content_error() {
        let result = interpret(RemoteOp::Signup, 201, &body(json!({ "ok": true })), decode_identity);
        assert_matches!(result, Err(e) if e.kind == ErrorKind::Content);
    }

    #[test]
    fn search_joins_text_and_passes_metadata_through() {
        let answer = decode_search(&body(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Max " }, { "text": "Verstappen won." }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://f1.example/race", "title": "Race report" } },
                        { "retrievedContext": { "uri": "gs://bucket/doc" } }
                    ]
                }
            }]
        })))
        .unwrap();

        assert_eq!(answer.text, "Max Verstappen won.");
        let metadata = answer.metadata.unwrap();
        assert_eq!(metadata.grounding_chunks.len(), 2);
        assert!(metadata.grounding_chunks[1].web.is_none());
    }

    #[test]
    fn search_without_metadata_is_fine() {
        let answer = decode_search(&body(json!({
            "candidates": [{ "content": { "parts": [{ "text": "42" }] } }]
        })))
        .unwrap();
        assert_eq!(answer.text, "42");
        assert!(answer.metadata.is_none());
    }

    #[test]
    fn search_without_candidates_is_a_content_error() {
        assert_matches!(
            decode_search(&body(json!({ "candidates": [] }))),
            Err(e) if e.kind == ErrorKind::Content
        );
    }

    #[test]
    fn edit_returns_first_inline_image() {
        let image = decode_edited_image(&body(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Here you go" },
                { "inlineData": { "mimeType": "image/png", "data": "AAAA" } },
                { "inlineData": { "mimeType": "image/jpeg", "data": "BBBB" } }
            ] } }]
        })))
        .unwrap();
        assert_eq!(image.data_uri(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn edit_with_corrupt_image_payload_is_a_content_error() {
        let err = decode_edited_image(&body(json!({
            "candidates": [{ "content": { "parts": [
                { "inlineData": { "mimeType": "image/png", "data": "not base64!" } }
            ] } }]
        })))
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Content);
        assert!(err.message.starts_with("The model returned an unusable image"));
    }

    #[test]
    fn edit_without_image_part_is_distinct_from_transport_failure() {
        let err = decode_edited_image(&body(json!({
            "candidates": [{ "content": { "parts": [{ "text": "I can't do that" }] } }]
        })))
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Content);
        assert_eq!(err.message, NO_IMAGE_MESSAGE);
    }

    #[test]
    fn edit_request_carries_image_then_prompt() {
        let image = EncodedImage::from_parts("image/jpeg", "QUJD");
        let request = serde_json::to_value(edit_request(&image, "Add a retro filter")).unwrap();
        assert_eq!(
            request,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "inlineData": { "mimeType": "image/jpeg", "data": "QUJD" } },
                        { "text": "Add a retro filter" }
                    ]
                }],
                "generationConfig": { "responseModalities": ["IMAGE"] }
            })
        );
    }

    #[test]
    fn search_request_enables_google_search_tool() {
        let request = serde_json::to_value(search_request("Who won the latest F1 race?")).unwrap();
        assert_eq!(request["tools"], json!([{ "googleSearch": {} }]));
        assert!(request.get("generationConfig").is_none());
    }
}
