use axum::{
    routing::get,
    Router,
};

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod password;
pub mod repo;

/// Public routes: account creation, session start/end, landing pages.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/register",
            get(handlers::register_page).post(handlers::register),
        )
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route("/welcome", get(handlers::welcome))
        .route("/public", get(handlers::public_landing))
}
