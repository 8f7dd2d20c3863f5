//! Same-origin validation for secure requests.
//!
//! A network attacker who can coerce a cross-origin https request must not
//! reach the token comparison at all, so secure requests are required to
//! carry a parseable, same-origin `Referer` before any token is looked at.

use axum::http::{HeaderMap, Uri, header};
use url::Url;

/// Whether the request should be treated as TLS-secured.
///
/// Behind a reverse proxy the URI scheme rarely survives TLS termination,
/// so a trusted `X-Forwarded-Proto` header is honored in addition to the
/// scheme itself.
pub(crate) fn is_secure(uri: &Uri, headers: &HeaderMap) -> bool {
    if uri.scheme_str() == Some("https") {
        return true;
    }
    headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
}

/// Host of the request: the URI authority when absolute, else the `Host`
/// header. Includes the port when one is present.
pub(crate) fn request_host(uri: &Uri, headers: &HeaderMap) -> Option<String> {
    if let Some(authority) = uri.authority() {
        return Some(authority.to_string());
    }
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Check the `Referer` of a secure request against the request's own
/// origin (scheme plus host).
///
/// Fails closed: a missing, empty, or unparsable referer cannot be
/// verified and is treated as a mismatch. Relative referers fail URL
/// parsing and land in the same bucket.
pub(crate) fn validate_secure_origin(uri: &Uri, headers: &HeaderMap) -> bool {
    let Some(referer) = headers.get(header::REFERER).and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    let Ok(referer_url) = Url::parse(referer) else {
        return false;
    };
    let Some(host) = request_host(uri, headers) else {
        return false;
    };
    let referer_host = match (referer_url.host_str(), referer_url.port()) {
        (Some(h), Some(p)) => format!("{h}:{p}"),
        (Some(h), None) => h.to_string(),
        (None, _) => return false,
    };
    // The request is only checked here when it is secure, so the referer
    // must share the https scheme as well as the host.
    referer_url.scheme() == "https" && referer_host == host
}
