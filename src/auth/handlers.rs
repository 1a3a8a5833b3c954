use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginForm, NextQuery, RegisterForm},
        password::{hash_password, verify_password},
        repo::User,
    },
    csrf,
    error::AppError,
    extract::Form,
    render, session,
    state::AppState,
    validate,
};

const INVALID_LOGIN_MESSAGE: &str = "Invalid username or password.";

/// Collapse the unknown-user and wrong-password cases into a single result
/// so both fall through to the same user-visible message.
fn credentials_valid(user: Option<&User>, password: &str) -> bool {
    match user {
        Some(user) => verify_password(password, &user.password_hash).unwrap_or(false),
        None => false,
    }
}

fn collision_reason(existing: &User, username: &str) -> &'static str {
    if existing.username == username {
        "Username already exists. Please choose a different one."
    } else {
        "Email already registered. Please use a different email."
    }
}

async fn render_register(
    state: &AppState,
    session: &Session,
    username: &str,
    email: &str,
) -> Result<Response, AppError> {
    let mut ctx = render::base_context(session).await?;
    ctx.insert(
        "csrf_token",
        &csrf::issue(session, state.config.csrf_token_ttl_secs).await?,
    );
    ctx.insert("form_username", username);
    ctx.insert("form_email", email);
    Ok(render::page("auth/register.html", &ctx)?.into_response())
}

async fn render_login(
    state: &AppState,
    session: &Session,
    username: &str,
    next: Option<&str>,
) -> Result<Response, AppError> {
    let mut ctx = render::base_context(session).await?;
    ctx.insert(
        "csrf_token",
        &csrf::issue(session, state.config.csrf_token_ttl_secs).await?,
    );
    ctx.insert("form_username", username);
    ctx.insert("next", &next);
    Ok(render::page("auth/login.html", &ctx)?.into_response())
}

#[instrument(skip(state, session))]
pub async fn register_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    render_register(&state, &session, "", "").await
}

#[instrument(skip(state, session, headers, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if !csrf::verify(&session, &form.csrf_token, state.config.csrf_token_ttl_secs).await? {
        return Ok(csrf::failure_redirect(&session, &headers).await);
    }

    let mut errors = Vec::new();
    let username = match validate::username(&form.username) {
        Ok(v) => Some(v),
        Err(reason) => {
            errors.push(reason);
            None
        }
    };
    let email = match validate::email(&form.email, 120) {
        Ok(v) => Some(v),
        Err(reason) => {
            errors.push(reason);
            None
        }
    };
    if let Err(reason) = validate::password(&form.password) {
        errors.push(reason);
    }
    if !errors.is_empty() {
        for reason in &errors {
            session::flash(&session, reason, "error").await?;
        }
        return render_register(&state, &session, &form.username, &form.email).await;
    }
    let (username, email) = (username.unwrap_or_default(), email.unwrap_or_default());

    match User::find_by_username_or_email(&state.db, &username, &email).await {
        Ok(Some(existing)) => {
            let reason = collision_reason(&existing, &username);
            warn!(username = %username, "registration collision");
            session::flash(&session, reason, "error").await?;
            return render_register(&state, &session, &form.username, &form.email).await;
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "registration lookup failed");
            session::flash(
                &session,
                "An error occurred during registration. Please try again.",
                "error",
            )
            .await?;
            return render_register(&state, &session, &form.username, &form.email).await;
        }
    }

    let hash = match hash_password(&form.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "hash_password failed");
            session::flash(
                &session,
                "An error occurred during registration. Please try again.",
                "error",
            )
            .await?;
            return render_register(&state, &session, &form.username, &form.email).await;
        }
    };

    match User::create(&state.db, &username, &email, &hash).await {
        Ok(user) => {
            info!(user_id = user.id, username = %user.username, "user registered");
            session::flash(
                &session,
                "Registration successful! You can now log in.",
                "success",
            )
            .await?;
            Ok(Redirect::to("/login").into_response())
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            session::flash(
                &session,
                "An error occurred during registration. Please try again.",
                "error",
            )
            .await?;
            render_register(&state, &session, &form.username, &form.email).await
        }
    }
}

#[instrument(skip(state, session))]
pub async fn login_page(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<NextQuery>,
) -> Result<Response, AppError> {
    render_login(&state, &session, "", query.next.as_deref()).await
}

#[instrument(skip(state, session, headers, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<NextQuery>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if !csrf::verify(&session, &form.csrf_token, state.config.csrf_token_ttl_secs).await? {
        return Ok(csrf::failure_redirect(&session, &headers).await);
    }

    let mut errors = Vec::new();
    let username = match validate::login_username(&form.username) {
        Ok(v) => v,
        Err(reason) => {
            errors.push(reason);
            String::new()
        }
    };
    if form.password.is_empty() {
        errors.push("Password is required".to_string());
    }
    if !errors.is_empty() {
        for reason in &errors {
            session::flash(&session, reason, "error").await?;
        }
        return render_login(&state, &session, &form.username, query.next.as_deref()).await;
    }

    let user = match User::find_by_username(&state.db, &username).await {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "login lookup failed");
            session::flash(
                &session,
                "An error occurred during login. Please try again.",
                "error",
            )
            .await?;
            return render_login(&state, &session, &form.username, query.next.as_deref()).await;
        }
    };

    let verified = credentials_valid(user.as_ref(), &form.password);

    if let (Some(user), true) = (user, verified) {
        session::log_in(&session, user.id, &user.username).await?;
        session::flash(&session, "Login successful!", "success").await?;
        info!(user_id = user.id, username = %user.username, "user logged in");
        let target = session::safe_next_path(query.next.as_deref());
        Ok(Redirect::to(&target).into_response())
    } else {
        warn!(username = %username, "invalid login");
        session::flash(&session, INVALID_LOGIN_MESSAGE, "error").await?;
        render_login(&state, &session, &form.username, query.next.as_deref()).await
    }
}

#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Response, AppError> {
    session::log_out(&session).await?;
    session::flash(&session, "You have been logged out.", "success").await?;
    Ok(Redirect::to("/login").into_response())
}

/// Public landing page; authenticated visitors go straight to the app.
#[instrument(skip(session))]
pub async fn welcome(session: Session) -> Result<Response, AppError> {
    if session::current_user(&session).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let ctx = render::base_context(&session).await?;
    Ok(render::page("welcome.html", &ctx)?.into_response())
}

#[instrument(skip(session))]
pub async fn public_landing(session: Session) -> Result<Response, AppError> {
    let ctx = render::base_context(&session).await?;
    Ok(render::page("welcome.html", &ctx)?.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn account(username: &str, email: &str, password: &str) -> User {
        User {
            id: 1,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password).unwrap(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn unknown_user_and_wrong_password_are_indistinguishable() {
        let user = account("ana_99", "ana@x.com", "Ledger1@pw");
        // Both failure cases collapse to the same value, which feeds the
        // single INVALID_LOGIN_MESSAGE branch.
        assert!(!credentials_valid(None, "Ledger1@pw"));
        assert!(!credentials_valid(Some(&user), "Wrong1@pw"));
        assert!(credentials_valid(Some(&user), "Ledger1@pw"));
        assert_eq!(INVALID_LOGIN_MESSAGE, "Invalid username or password.");
    }

    #[test]
    fn collision_reason_targets_the_colliding_field() {
        let existing = account("ana_99", "ana@x.com", "Ledger1@pw");
        assert!(collision_reason(&existing, "ana_99").starts_with("Username already exists"));
        assert!(collision_reason(&existing, "other_user").starts_with("Email already registered"));
    }
}
