//! Session-bound per-path CSRF protection for axum.
//!
//! Implements the synchronizer-token pattern over `tower-sessions`: each
//! rendered page embeds a secret token bound to its path and the user's
//! session, and every state-changing request must echo that token back.
//!
//! The middleware supports:
//! - Per-path tokens (or a single session-wide token)
//! - Bounded per-session token storage with full-reset eviction
//! - Form-encoded and JSON submissions, with the request body restored for
//!   downstream handlers
//! - Referer-path fallback for forms whose action differs from the page
//!   that rendered them
//! - Origin validation of secure requests
//! - Regex-based path exemptions and a configurable failure handler
//!
//! ## Usage
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use csrf_guard::{CsrfConfig, CsrfProtect, protect};
//! use tower_sessions::{MemoryStore, SessionManagerLayer};
//!
//! let csrf = CsrfProtect::new(CsrfConfig::default());
//! let app: Router = Router::new()
//!     .route("/", get(page).post(submit))
//!     .layer(axum::middleware::from_fn_with_state(csrf.clone(), protect))
//!     .layer(SessionManagerLayer::new(MemoryStore::default()))
//!     .with_state(csrf);
//! ```
//!
//! Handlers mint tokens with [`page_token`] (or [`path_token`] when the
//! form posts somewhere other than the page's own URL) and embed them as a
//! hidden field named after `CsrfConfig::token_name`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod store;

mod classify;
mod extract;
mod origin;
mod token;
mod verify;

pub use config::{CsrfConfig, FailureHandler};
pub use error::CsrfError;
pub use middleware::{CsrfProtect, protect};
pub use store::{clear_tokens, page_token, path_token};
