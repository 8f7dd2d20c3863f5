//! Request-handling entry point.
//!
//! [`protect`] plugs into `axum::middleware::from_fn_with_state` and sits
//! inside a `SessionManagerLayer`, which must run first so the session is
//! available on the request.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use tower_sessions::Session;

use crate::classify;
use crate::config::CsrfConfig;
use crate::origin;
use crate::verify;

/// State for the [`protect`] middleware.
///
/// Wraps the immutable configuration in an `Arc`; clone freely.
#[derive(Debug, Clone)]
pub struct CsrfProtect {
    config: Arc<CsrfConfig>,
}

impl CsrfProtect {
    pub fn new(config: CsrfConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The configuration this middleware was built with. Handlers use this
    /// to mint page tokens with the same token name and mode.
    pub fn config(&self) -> &CsrfConfig {
        &self.config
    }
}

/// Middleware guarding state-changing requests.
///
/// Per request: an exempt path forwards untouched; a secure request with a
/// missing or cross-origin referer is rejected; a safe method forwards;
/// anything else must carry a token matching the session's stored value
/// for the request path (or the referer path). Exactly one of the next
/// handler and the failure handler runs.
pub async fn protect(
    State(csrf): State<CsrfProtect>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let config = csrf.config();
    let path = request.uri().path().to_owned();

    if classify::is_exempt(config, &path) {
        tracing::debug!(path = %path, "path exempt from CSRF verification");
        return next.run(request).await;
    }

    if origin::is_secure(request.uri(), request.headers())
        && !origin::validate_secure_origin(request.uri(), request.headers())
    {
        tracing::debug!(path = %path, "secure request failed origin check");
        return fail(config, request);
    }

    if classify::is_safe_method(request.method()) {
        return next.run(request).await;
    }

    let Some(session) = request.extensions().get::<Session>().cloned() else {
        tracing::warn!(path = %path, "no session on request; is SessionManagerLayer installed?");
        return fail(config, request);
    };

    let (request, valid) = verify::verify_request(request, &session, config).await;
    if valid {
        next.run(request).await
    } else {
        tracing::debug!(path = %path, "token verification failed");
        fail(config, request)
    }
}

fn fail(config: &CsrfConfig, request: Request<Body>) -> Response {
    // The failure handler gets the whole request, body included, so it can
    // inspect or forward what the client sent.
    (config.on_failure)(request)
}
