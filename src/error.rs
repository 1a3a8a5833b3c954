use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// Application error surfaced as a rendered error page.
///
/// Internal detail is logged server-side and never reaches the response body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("bad request")]
    BadRequest,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Session(#[from] tower_sessions::session::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Session(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn template(&self) -> &'static str {
        match self.status() {
            StatusCode::BAD_REQUEST => "errors/400.html",
            StatusCode::FORBIDDEN => "errors/403.html",
            StatusCode::NOT_FOUND => "errors/404.html",
            _ => "errors/500.html",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        match crate::render::error_page(self.template()) {
            Ok(body) => (status, body).into_response(),
            Err(e) => {
                error!(error = %e, "error page render failed");
                status.into_response()
            }
        }
    }
}

/// Fallback for unknown routes.
pub async fn not_found() -> AppError {
    AppError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_to_template_mapping() {
        assert_eq!(AppError::BadRequest.template(), "errors/400.html");
        assert_eq!(AppError::Forbidden.template(), "errors/403.html");
        assert_eq!(AppError::NotFound.template(), "errors/404.html");
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).template(),
            "errors/500.html"
        );
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).template(),
            "errors/500.html"
        );
    }

    #[test]
    fn internal_errors_do_not_leak_detail() {
        let body = crate::render::error_page("errors/500.html").unwrap();
        assert!(!body.0.contains("boom"));
        assert!(body.0.contains("500"));
    }
}
