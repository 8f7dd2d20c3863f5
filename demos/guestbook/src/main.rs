//! Guestbook example: per-path CSRF tokens over an in-memory session store.
//!
//! The page renders two forms posting to `/`: one embeds the hidden token
//! minted by csrf-guard, the other omits it and is rejected. Tokens are
//! single-use here, so reloading after a submission regenerates the token.

use std::collections::HashMap;

use anyhow::Result;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};
use csrf_guard::{CsrfConfig, CsrfProtect, page_token, protect};
use regex::Regex;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = CsrfConfig::default()
        .with_clear_after_use(true)
        .with_exempt_patterns(vec![Regex::new("^/static/")?])
        .with_failure_handler(invalid_token);
    let csrf = CsrfProtect::new(config);

    let session_layer = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);

    let app = Router::new()
        .route("/", get(show_page).post(sign))
        .layer(axum::middleware::from_fn_with_state(csrf.clone(), protect))
        .layer(session_layer)
        .with_state(csrf);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    info!("listening on http://127.0.0.1:3000/");
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,csrf_guard=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn show_page(State(csrf): State<CsrfProtect>, session: Session) -> Result<Html<String>, AppError> {
    let token = page_token(&session, csrf.config(), "/").await?;
    Ok(Html(render_page(&token, None)))
}

async fn sign(
    State(csrf): State<CsrfProtect>,
    session: Session,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Html<String>, AppError> {
    // clear_after_use consumed the matched token; mint a fresh one.
    let token = page_token(&session, csrf.config(), "/").await?;
    Ok(Html(render_page(&token, fields.get("name").map(String::as_str))))
}

/// Failure handler: a friendlier page than the default bare 400.
fn invalid_token(_request: Request) -> Response {
    (
        StatusCode::FORBIDDEN,
        Html(
            r#"Your token <strong>expired</strong>, click <a href="javascript:void(0)" onclick="window.history.back()">here</a> to try again."#,
        ),
    )
        .into_response()
}

fn render_page(token: &str, name: Option<&str>) -> String {
    let greeting = match name {
        Some(name) if !name.is_empty() => {
            let name = escape(name);
            format!("<p>Your name: {name}</p><p>Tip: try to reload the page...</p>")
        }
        _ => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<body>
{greeting}
<form action="/" method="POST">
  <label for="name">Enter your name:</label>
  <input type="text" name="name" id="name">
  <input type="hidden" name="token" value="{token}">
  <input type="submit" value="Submit with token">
</form>
<form action="/" method="POST">
  <label for="num">Type in a number:</label>
  <input type="text" name="num" id="num">
  <!-- No token here, so this form is rejected. -->
  <input type="submit" value="Submit without token">
</form>
</body>
</html>
"#
    )
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Thin wrapper so handler errors become 500s without unwraps.
struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "handler error");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
