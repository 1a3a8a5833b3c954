use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{session, state::AppState};

mod dto;
pub mod handlers;
pub mod repo;

/// Protected routes; every one sits behind the login guard.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::index).post(handlers::create))
        .route("/home", get(handlers::home))
        .route("/delete/:sno", post(handlers::delete))
        .route(
            "/update/:sno",
            get(handlers::update_page).post(handlers::update),
        )
        .route_layer(middleware::from_fn(session::require_login))
}
