//! Token verification.
//!
//! Compares the submitted token against the session's stored token for the
//! request path, falling back to the path named by the `Referer` header.
//! The fallback tolerates a form rendered at one URL posting to another,
//! such as a login form at `/loginform` submitting to `/login`.

use axum::body::Body;
use axum::http::{Request, header};
use subtle::ConstantTimeEq;
use tower_sessions::Session;

use crate::config::CsrfConfig;
use crate::error::CsrfError;
use crate::extract::{self, SubmittedToken};
use crate::origin;
use crate::store::{self, TokenMap};

/// Verify the submitted token against the session's stored tokens.
///
/// The request comes back with its body intact regardless of outcome, so
/// the downstream handler (or the failure handler) can still read it. A
/// session backend failure is logged and fails the request closed.
pub(crate) async fn verify_request(
    request: Request<Body>,
    session: &Session,
    config: &CsrfConfig,
) -> (Request<Body>, bool) {
    let lookup_path = if config.single_token {
        "/".to_owned()
    } else {
        request.uri().path().to_owned()
    };

    let (request, submitted) = extract::submitted_token(request, &config.token_name).await;
    let fallback_path = referer_path(&request);

    match check(session, config, &lookup_path, fallback_path, &submitted).await {
        Ok(valid) => (request, valid),
        Err(error) => {
            tracing::warn!(error = %error, path = %lookup_path, "session error during token verification");
            (request, false)
        }
    }
}

async fn check(
    session: &Session,
    config: &CsrfConfig,
    lookup_path: &str,
    fallback_path: Option<String>,
    submitted: &SubmittedToken,
) -> Result<bool, CsrfError> {
    let Some(mut map) = store::load_map(session, config).await? else {
        tracing::debug!(path = %lookup_path, "no token map in session");
        return Ok(false);
    };

    let mut valid = match submitted.value() {
        Some(value) => stored_matches(&map, lookup_path, value),
        None => false,
    };

    if !valid {
        if let (Some(value), Some(referer)) = (submitted.value(), fallback_path) {
            valid = stored_matches(&map, &referer, value);
            if valid {
                tracing::debug!(path = %lookup_path, referer = %referer, "token matched via referer path");
            }
        }
    }

    // Single-use tokens: drop the entry for this path whether or not the
    // comparison succeeded, so a failed guess also burns the token.
    if config.clear_after_use && map.remove(lookup_path).is_some() {
        store::save_map(session, config, &map).await?;
    }

    Ok(valid)
}

/// Constant-time comparison against the stored token at `path`.
fn stored_matches(map: &TokenMap, path: &str, submitted: &str) -> bool {
    map.get(path)
        .is_some_and(|stored| bool::from(stored.as_bytes().ct_eq(submitted.as_bytes())))
}

/// Path portion of the `Referer` header: the substring after the request's
/// own host. `None` when the referer or host is absent, the host does not
/// occur in the referer, or nothing follows it.
fn referer_path(request: &Request<Body>) -> Option<String> {
    let referer = request
        .headers()
        .get(header::REFERER)?
        .to_str()
        .ok()?;
    let host = origin::request_host(request.uri(), request.headers())?;
    let start = referer.find(&host)? + host.len();
    match referer.get(start..) {
        Some(path) if !path.is_empty() => Some(path.to_owned()),
        _ => None,
    }
}
