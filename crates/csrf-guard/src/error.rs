//! Library error types.

use thiserror::Error;

/// Errors surfaced by the token store.
///
/// Verification itself never errors; every failure mode collapses into a
/// rejected request. Only the session backend can fail in a way callers of
/// the token API need to see.
#[derive(Debug, Error)]
pub enum CsrfError {
    #[error("session store error")]
    Session(#[from] tower_sessions::session::Error),
}
