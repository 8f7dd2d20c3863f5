//! CSRF protection configuration.

use std::fmt;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use regex::Regex;

/// Default token length in characters.
pub const DEFAULT_TOKEN_LENGTH: usize = 32;

/// Default form/session field name for the token.
pub const DEFAULT_TOKEN_NAME: &str = "token";

/// Default bound on distinct per-path tokens held in one session.
pub const DEFAULT_MAX_TOKENS: usize = 20;

/// Handler invoked when verification fails.
///
/// Receives the rejected request, body restored, and produces the
/// client-visible response.
pub type FailureHandler = Arc<dyn Fn(Request) -> Response + Send + Sync>;

/// Immutable CSRF configuration.
///
/// Built once with the `with_*` methods and handed to
/// [`CsrfProtect`](crate::CsrfProtect) at construction. Nothing reads
/// process-global state; two middlewares with different configurations can
/// coexist in one router.
#[derive(Clone)]
pub struct CsrfConfig {
    /// Length of generated tokens.
    pub token_length: usize,
    /// Form field, JSON field, and session key holding the token.
    pub token_name: String,
    /// Use one token (keyed `"/"`) for the whole session instead of one
    /// per path.
    pub single_token: bool,
    /// Bound on distinct per-path tokens; exceeding it wipes the map.
    pub max_tokens: usize,
    /// Paths matching any of these patterns bypass verification entirely.
    pub exempt_patterns: Vec<Regex>,
    /// Invalidate a token after its first successful match.
    pub clear_after_use: bool,
    /// Response builder for rejected requests.
    pub on_failure: FailureHandler,
}

impl CsrfConfig {
    pub fn new() -> Self {
        Self {
            token_length: DEFAULT_TOKEN_LENGTH,
            token_name: DEFAULT_TOKEN_NAME.to_string(),
            single_token: false,
            max_tokens: DEFAULT_MAX_TOKENS,
            exempt_patterns: Vec::new(),
            clear_after_use: false,
            on_failure: Arc::new(default_failure_handler),
        }
    }

    /// Set the length of generated tokens.
    pub fn with_token_length(mut self, length: usize) -> Self {
        self.token_length = length;
        self
    }

    /// Set the field name used in forms, JSON bodies, and the session.
    pub fn with_token_name(mut self, name: impl Into<String>) -> Self {
        self.token_name = name.into();
        self
    }

    /// Share one token across the whole session instead of one per path.
    pub fn with_single_token(mut self, single: bool) -> Self {
        self.single_token = single;
        self
    }

    /// Set the bound on distinct per-path tokens per session.
    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = max;
        self
    }

    /// Exclude paths matching any of the given patterns from verification.
    pub fn with_exempt_patterns(mut self, patterns: impl IntoIterator<Item = Regex>) -> Self {
        self.exempt_patterns = patterns.into_iter().collect();
        self
    }

    /// Invalidate tokens after their first successful match.
    pub fn with_clear_after_use(mut self, clear: bool) -> Self {
        self.clear_after_use = clear;
        self
    }

    /// Replace the default failure response.
    pub fn with_failure_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(Request) -> Response + Send + Sync + 'static,
    {
        self.on_failure = Arc::new(handler);
        self
    }
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CsrfConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsrfConfig")
            .field("token_length", &self.token_length)
            .field("token_name", &self.token_name)
            .field("single_token", &self.single_token)
            .field("max_tokens", &self.max_tokens)
            .field("exempt_patterns", &self.exempt_patterns)
            .field("clear_after_use", &self.clear_after_use)
            .finish_non_exhaustive()
    }
}

/// Default rejection: a bare 400 with a short plain-text body.
fn default_failure_handler(_request: Request) -> Response {
    (StatusCode::BAD_REQUEST, "Bad Request 400").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CsrfConfig::default();
        assert_eq!(config.token_length, 32);
        assert_eq!(config.token_name, "token");
        assert!(!config.single_token);
        assert_eq!(config.max_tokens, 20);
        assert!(config.exempt_patterns.is_empty());
        assert!(!config.clear_after_use);
    }

    #[test]
    fn builder_methods() {
        let config = CsrfConfig::new()
            .with_token_length(64)
            .with_token_name("_csrf")
            .with_single_token(true)
            .with_max_tokens(5)
            .with_clear_after_use(true);

        assert_eq!(config.token_length, 64);
        assert_eq!(config.token_name, "_csrf");
        assert!(config.single_token);
        assert_eq!(config.max_tokens, 5);
        assert!(config.clear_after_use);
    }

    #[test]
    fn default_failure_response_is_400() {
        let request = Request::new(axum::body::Body::empty());
        let response = default_failure_handler(request);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
