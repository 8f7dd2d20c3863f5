//! Request classification: safe methods and exempt paths.

use axum::http::Method;

use crate::config::CsrfConfig;

/// Methods assumed side-effect free; they bypass token verification.
pub(crate) fn is_safe_method(method: &Method) -> bool {
    *method == Method::GET
        || *method == Method::HEAD
        || *method == Method::OPTIONS
        || *method == Method::TRACE
}

/// Whether the path matches any configured exemption pattern.
pub(crate) fn is_exempt(config: &CsrfConfig, path: &str) -> bool {
    config.exempt_patterns.iter().any(|re| re.is_match(path))
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use regex::Regex;

    use super::*;

    #[test]
    fn safe_methods() {
        assert!(is_safe_method(&Method::GET));
        assert!(is_safe_method(&Method::HEAD));
        assert!(is_safe_method(&Method::OPTIONS));
        assert!(is_safe_method(&Method::TRACE));
        assert!(!is_safe_method(&Method::POST));
        assert!(!is_safe_method(&Method::PUT));
        assert!(!is_safe_method(&Method::DELETE));
        assert!(!is_safe_method(&Method::PATCH));
    }

    #[test]
    fn exempt_path_matching() {
        let config = CsrfConfig::new().with_exempt_patterns(vec![
            Regex::new("^/webhooks/").unwrap(),
            Regex::new("^/static/.*\\.css$").unwrap(),
        ]);

        assert!(is_exempt(&config, "/webhooks/github"));
        assert!(is_exempt(&config, "/static/site.css"));
        assert!(!is_exempt(&config, "/static/site.js"));
        assert!(!is_exempt(&config, "/login"));
    }

    #[test]
    fn no_patterns_means_nothing_exempt() {
        let config = CsrfConfig::new();
        assert!(!is_exempt(&config, "/"));
    }
}
