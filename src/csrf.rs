use axum::{
    http::{header::REFERER, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use time::OffsetDateTime;
use tower_sessions::Session;
use tracing::warn;

use crate::error::AppError;
use crate::session;

pub const TOKEN_LENGTH: usize = 64;
const SESSION_KEY: &str = "_csrf_token";
const ALLOWED_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    value: String,
    issued_at: i64,
}

impl StoredToken {
    fn is_fresh(&self, now: i64, ttl_secs: i64) -> bool {
        now - self.issued_at <= ttl_secs
    }

    fn matches(&self, submitted: &str, now: i64, ttl_secs: i64) -> bool {
        self.is_fresh(now, ttl_secs) && token_eq(&self.value, submitted)
    }
}

/// Constant-time comparison so the check's duration reveals nothing about
/// how much of the token an attacker has guessed.
fn token_eq(stored: &str, submitted: &str) -> bool {
    stored.as_bytes().ct_eq(submitted.as_bytes()).into()
}

fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LENGTH)
        .map(|_| ALLOWED_CHARS[rng.gen_range(0..ALLOWED_CHARS.len())] as char)
        .collect()
}

/// Return the session's CSRF token, minting a new one when absent or past
/// its lifetime. Embedded in every form as a hidden field.
pub async fn issue(session: &Session, ttl_secs: i64) -> Result<String, AppError> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    if let Some(stored) = session.get::<StoredToken>(SESSION_KEY).await? {
        if stored.is_fresh(now, ttl_secs) {
            return Ok(stored.value);
        }
    }
    let token = StoredToken {
        value: generate(),
        issued_at: now,
    };
    session.insert(SESSION_KEY, &token).await?;
    Ok(token.value)
}

/// Check a submitted token against the session's. Rejects missing, stale,
/// and mismatched tokens alike.
pub async fn verify(session: &Session, submitted: &str, ttl_secs: i64) -> Result<bool, AppError> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    match session.get::<StoredToken>(SESSION_KEY).await? {
        Some(stored) => Ok(stored.matches(submitted, now, ttl_secs)),
        None => Ok(false),
    }
}

/// Response for a failed CSRF check: flash a message and send the user back
/// to the referring page when authenticated, otherwise to the login form.
pub async fn failure_redirect(session: &Session, headers: &HeaderMap) -> Response {
    warn!("csrf token missing or invalid");
    if let Err(e) = session::flash(
        session,
        "CSRF token missing or invalid. Please try again.",
        "error",
    )
    .await
    {
        return e.into_response();
    }
    let authenticated = matches!(session::current_user(session).await, Ok(Some(_)));
    if authenticated {
        let back = headers
            .get(REFERER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("/");
        Redirect::to(back).into_response()
    } else {
        Redirect::to("/login").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_use_allowed_charset() {
        let token = generate();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.bytes().all(|b| ALLOWED_CHARS.contains(&b)));
    }

    #[test]
    fn generated_tokens_differ() {
        assert_ne!(generate(), generate());
    }

    #[test]
    fn token_eq_compares_full_contents() {
        assert!(token_eq("abc123", "abc123"));
        assert!(!token_eq("abc123", "abc124"));
        assert!(!token_eq("abc123", "abc"));
        assert!(!token_eq("", "abc123"));
    }

    #[test]
    fn token_matches_within_lifetime() {
        let stored = StoredToken {
            value: "abc".into(),
            issued_at: 1000,
        };
        assert!(stored.matches("abc", 1000 + 3600, 3600));
        assert!(!stored.matches("abc", 1000 + 3601, 3600));
        assert!(!stored.matches("other", 1001, 3600));
    }
}
