//! Submitted-token extraction.
//!
//! Pulls the token field out of a request according to its declared content
//! type. Bodies that must be read for decoding are buffered and then
//! rebuilt onto the request, so the downstream handler always observes an
//! unconsumed stream. That restoration is part of the verifier's contract,
//! not an implementation detail.

use axum::body::{Body, to_bytes};
use axum::http::Request;
use axum::http::header::CONTENT_TYPE;

/// Cap on buffered request bodies.
///
/// The raw body is consumed here before any extractor-level limit (such as
/// axum's `DefaultBodyLimit`) gets a chance to apply, so the cap has to be
/// enforced at this layer. A submission larger than this cannot carry a
/// valid token and is treated as having none.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Outcome of pulling the token field out of a request.
///
/// The carried strings are never empty; an empty extracted value collapses
/// to `Empty` so that an empty submission can never match anything, not
/// even an empty stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SubmittedToken {
    Empty,
    Form(String),
    Json(String),
}

impl SubmittedToken {
    pub(crate) fn value(&self) -> Option<&str> {
        match self {
            SubmittedToken::Empty => None,
            SubmittedToken::Form(v) | SubmittedToken::Json(v) => Some(v),
        }
    }

    fn form(value: Option<String>) -> Self {
        match value {
            Some(v) if !v.is_empty() => SubmittedToken::Form(v),
            _ => SubmittedToken::Empty,
        }
    }

    fn json(value: Option<String>) -> Self {
        match value {
            Some(v) if !v.is_empty() => SubmittedToken::Json(v),
            _ => SubmittedToken::Empty,
        }
    }
}

/// Extract the named token field from the request.
///
/// Dispatch on `Content-Type`:
/// - `application/x-www-form-urlencoded`: read the field from the decoded
///   body.
/// - `application/json`: read the field from a decoded top-level object,
///   coercing non-string values to their JSON text. Malformed JSON yields
///   `Empty` silently.
/// - anything else (or no content type): read the field from the query
///   string; the body is not touched.
///
/// The returned request always carries a readable body.
pub(crate) async fn submitted_token(
    request: Request<Body>,
    field: &str,
) -> (Request<Body>, SubmittedToken) {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_owned();

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let (request, bytes) = buffer_body(request).await;
        let token = bytes.as_deref().and_then(|b| form_field(b, field));
        (request, SubmittedToken::form(token))
    } else if content_type.starts_with("application/json") {
        let (request, bytes) = buffer_body(request).await;
        let token = bytes.as_deref().and_then(|b| json_field(b, field));
        (request, SubmittedToken::json(token))
    } else {
        let token = request
            .uri()
            .query()
            .and_then(|query| form_field(query.as_bytes(), field));
        (request, SubmittedToken::form(token))
    }
}

/// Read the whole body and put a fresh one built from the buffer back onto
/// the request. Returns `None` bytes when the body cannot be read or
/// exceeds [`MAX_BODY_BYTES`]; the request then carries an empty body.
async fn buffer_body(request: Request<Body>) -> (Request<Body>, Option<axum::body::Bytes>) {
    let (parts, body) = request.into_parts();
    match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => {
            let request = Request::from_parts(parts, Body::from(bytes.clone()));
            (request, Some(bytes))
        }
        Err(error) => {
            tracing::debug!(error = %error, "failed to buffer request body");
            (Request::from_parts(parts, Body::empty()), None)
        }
    }
}

fn form_field(bytes: &[u8], field: &str) -> Option<String> {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(bytes)
        .ok()?
        .into_iter()
        .find(|(name, _)| name == field)
        .map(|(_, value)| value)
}

fn json_field(bytes: &[u8], field: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    match value.get(field)? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn request(content_type: Option<&str>, uri: &str, body: &str) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        builder.body(Body::from(body.to_owned())).unwrap()
    }

    async fn body_string(request: Request<Body>) -> String {
        let bytes = to_bytes(request.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn form_body_field() {
        let req = request(
            Some("application/x-www-form-urlencoded"),
            "/submit",
            "name=banana&token=abc123",
        );
        let (req, token) = submitted_token(req, "token").await;
        assert_eq!(token, SubmittedToken::Form("abc123".to_string()));
        assert_eq!(body_string(req).await, "name=banana&token=abc123");
    }

    #[tokio::test]
    async fn form_body_missing_field() {
        let req = request(
            Some("application/x-www-form-urlencoded"),
            "/submit",
            "name=banana",
        );
        let (_, token) = submitted_token(req, "token").await;
        assert_eq!(token, SubmittedToken::Empty);
    }

    #[tokio::test]
    async fn form_body_empty_value_is_empty() {
        let req = request(
            Some("application/x-www-form-urlencoded"),
            "/submit",
            "token=",
        );
        let (_, token) = submitted_token(req, "token").await;
        assert_eq!(token, SubmittedToken::Empty);
    }

    #[tokio::test]
    async fn json_body_field_restores_body() {
        let req = request(
            Some("application/json"),
            "/submit",
            r#"{"token": "abc123", "comment": "hi"}"#,
        );
        let (req, token) = submitted_token(req, "token").await;
        assert_eq!(token, SubmittedToken::Json("abc123".to_string()));
        assert_eq!(
            body_string(req).await,
            r#"{"token": "abc123", "comment": "hi"}"#
        );
    }

    #[tokio::test]
    async fn json_non_string_value_is_stringified() {
        let req = request(Some("application/json"), "/submit", r#"{"token": 42}"#);
        let (_, token) = submitted_token(req, "token").await;
        assert_eq!(token, SubmittedToken::Json("42".to_string()));
    }

    #[tokio::test]
    async fn malformed_json_yields_empty() {
        let req = request(Some("application/json"), "/submit", "{not json");
        let (req, token) = submitted_token(req, "token").await;
        assert_eq!(token, SubmittedToken::Empty);
        // The (invalid) body is still intact for downstream consumers.
        assert_eq!(body_string(req).await, "{not json");
    }

    #[tokio::test]
    async fn other_content_type_reads_query_string() {
        let req = request(Some("text/plain"), "/submit?token=abc123", "raw payload");
        let (req, token) = submitted_token(req, "token").await;
        assert_eq!(token, SubmittedToken::Form("abc123".to_string()));
        assert_eq!(body_string(req).await, "raw payload");
    }

    #[tokio::test]
    async fn oversized_body_yields_empty() {
        let body = format!("token=abc123&pad={}", "a".repeat(MAX_BODY_BYTES));
        let req = request(
            Some("application/x-www-form-urlencoded"),
            "/submit",
            &body,
        );
        let (_, token) = submitted_token(req, "token").await;
        assert_eq!(token, SubmittedToken::Empty);
    }

    #[tokio::test]
    async fn no_content_type_no_query_is_empty() {
        let req = request(None, "/submit", "");
        let (_, token) = submitted_token(req, "token").await;
        assert_eq!(token, SubmittedToken::Empty);
    }
}
