//! Per-session token storage.
//!
//! The session holds a single entry under the configured token name: a map
//! from request path to token. The map is created lazily on first use,
//! wiped wholesale when inserting a new path would outgrow `max_tokens`,
//! and removed entirely by [`clear_tokens`]. Mutations are written back
//! with `Session::insert`; the surrounding `SessionManagerLayer` persists
//! them when the response is written.

use std::collections::HashMap;

use tower_sessions::Session;

use crate::config::CsrfConfig;
use crate::error::CsrfError;
use crate::token;

/// Map from request path to token, as persisted in the session.
pub(crate) type TokenMap = HashMap<String, String>;

/// Load the session's token map, if one exists.
pub(crate) async fn load_map(
    session: &Session,
    config: &CsrfConfig,
) -> Result<Option<TokenMap>, CsrfError> {
    Ok(session.get::<TokenMap>(&config.token_name).await?)
}

/// Write the token map back to the session.
pub(crate) async fn save_map(
    session: &Session,
    config: &CsrfConfig,
    map: &TokenMap,
) -> Result<(), CsrfError> {
    session.insert(&config.token_name, map).await?;
    Ok(())
}

/// Token for the current page, for embedding as a hidden form field.
///
/// With `single_token` every page shares the `"/"` entry; otherwise each
/// distinct path gets its own token. Repeated calls for the same path
/// return the same token until a clearing match or [`clear_tokens`].
pub async fn page_token(
    session: &Session,
    config: &CsrfConfig,
    request_path: &str,
) -> Result<String, CsrfError> {
    let path = if config.single_token { "/" } else { request_path };
    fetch_or_insert(session, config, path).await
}

/// Token bound to an explicit path, ignoring `single_token`.
///
/// Use when the form's action differs from the page that renders it and
/// the token should be keyed to the future action.
pub async fn path_token(
    session: &Session,
    config: &CsrfConfig,
    path: &str,
) -> Result<String, CsrfError> {
    fetch_or_insert(session, config, path).await
}

/// Remove every token from the session. Call after a privilege change
/// such as login or logout. A no-op when no tokens exist.
pub async fn clear_tokens(session: &Session, config: &CsrfConfig) -> Result<(), CsrfError> {
    session.remove::<TokenMap>(&config.token_name).await?;
    Ok(())
}

async fn fetch_or_insert(
    session: &Session,
    config: &CsrfConfig,
    path: &str,
) -> Result<String, CsrfError> {
    let mut map = load_map(session, config).await?.unwrap_or_default();

    if let Some(existing) = map.get(path) {
        return Ok(existing.clone());
    }

    // Inserting a new path past the bound wipes the whole map rather than
    // evicting one entry. The session payload stays bounded at the cost of
    // invalidating every other pending form.
    if map.len() >= config.max_tokens {
        tracing::debug!(limit = config.max_tokens, "token map full, resetting");
        map.clear();
    }

    let fresh = token::generate(config.token_length);
    map.insert(path.to_owned(), fresh.clone());
    save_map(session, config, &map).await?;

    Ok(fresh)
}
