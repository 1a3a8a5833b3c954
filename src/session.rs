use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::debug;

use crate::error::AppError;

pub const USER_ID_KEY: &str = "user_id";
pub const USERNAME_KEY: &str = "username";
const FLASH_KEY: &str = "_flashes";

/// One queued flash message; consumed by the next rendered page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flash {
    pub message: String,
    pub category: String,
}

/// Authenticated-user attributes held in the session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: i32,
    pub username: String,
}

pub async fn flash(session: &Session, message: &str, category: &str) -> Result<(), AppError> {
    let mut queued: Vec<Flash> = session.get(FLASH_KEY).await?.unwrap_or_default();
    queued.push(Flash {
        message: message.to_string(),
        category: category.to_string(),
    });
    session.insert(FLASH_KEY, queued).await?;
    Ok(())
}

/// Drain the flash queue; each message is shown exactly once.
pub async fn take_flashes(session: &Session) -> Result<Vec<Flash>, AppError> {
    Ok(session.remove(FLASH_KEY).await?.unwrap_or_default())
}

pub async fn current_user(session: &Session) -> Result<Option<AuthSession>, AppError> {
    let user_id: Option<i32> = session.get(USER_ID_KEY).await?;
    let username: Option<String> = session.get(USERNAME_KEY).await?;
    Ok(match (user_id, username) {
        (Some(user_id), Some(username)) => Some(AuthSession { user_id, username }),
        _ => None,
    })
}

/// Establish an authenticated session. The id is cycled so a pre-login
/// session id cannot be fixated onto the authenticated one.
pub async fn log_in(session: &Session, user_id: i32, username: &str) -> Result<(), AppError> {
    session.cycle_id().await?;
    session.insert(USER_ID_KEY, user_id).await?;
    session.insert(USERNAME_KEY, username).await?;
    debug!(user_id, username, "session established");
    Ok(())
}

pub async fn log_out(session: &Session) -> Result<(), AppError> {
    session.clear().await;
    Ok(())
}

/// Middleware guarding protected routes: unauthenticated requests are sent
/// to the login form, carrying the originally requested path so login can
/// redirect back.
pub async fn require_login(session: Session, request: Request, next: Next) -> Response {
    match current_user(&session).await {
        Ok(Some(_)) => next.run(request).await,
        Ok(None) => {
            if let Err(e) = flash(&session, "Please log in to access this page.", "error").await {
                return e.into_response();
            }
            let wanted = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            Redirect::to(&format!("/login?next={}", encode_next(wanted))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Percent-encode the characters that would split the `next` value out of
/// the login redirect's own query string.
fn encode_next(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            '%' => out.push_str("%25"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            '#' => out.push_str("%23"),
            _ => out.push(c),
        }
    }
    out
}

/// Accept only same-site redirect targets; anything else falls back to "/".
pub fn safe_next_path(next: Option<&str>) -> String {
    match next {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.contains("://") =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}
