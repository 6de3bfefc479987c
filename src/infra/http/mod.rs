pub mod api;
mod middleware;
mod pages;
mod public;
pub mod session;
mod state;

pub use api::rate_limit::LoginRateLimiter;
pub use middleware::RequestContext;
pub use session::SessionConfig;
pub use state::AppState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::application::error::HttpError;
use crate::application::repos::RepoError;

use middleware::{log_responses, require_session, set_request_context};

/// Map a repository error to a consistent HTTP error response for page surfaces.
pub fn repo_error_to_http(source: &'static str, err: RepoError) -> HttpError {
    match err {
        RepoError::Duplicate { constraint } => {
            HttpError::new(source, StatusCode::CONFLICT, "Duplicate record", constraint)
        }
        RepoError::NotFound => HttpError::new(
            source,
            StatusCode::NOT_FOUND,
            "Resource not found",
            "resource not found",
        ),
        RepoError::InvalidInput { message } => {
            HttpError::new(source, StatusCode::BAD_REQUEST, "Invalid input", message)
        }
        RepoError::Integrity { message } => HttpError::new(
            source,
            StatusCode::CONFLICT,
            "Integrity constraint violated",
            message,
        ),
        RepoError::Conflict { message } => HttpError::new(
            source,
            StatusCode::CONFLICT,
            "Post was changed by another request, reload and try again",
            message,
        ),
        RepoError::Timeout => HttpError::new(
            source,
            StatusCode::SERVICE_UNAVAILABLE,
            "Database timeout",
            "Database timeout",
        ),
        RepoError::Persistence(message) => HttpError::new(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Persistence error",
            message,
        ),
    }
}

/// Full application router. `body_limit` caps request bodies, uploads included.
pub fn build_router(state: AppState, body_limit: usize) -> Router {
    let pages = Router::new()
        .route("/", get(pages::index))
        .route("/login", get(pages::login_form).post(pages::login_submit))
        .route("/logout", post(pages::logout))
        .route("/dashboard/admin", get(pages::admin_dashboard))
        .route(
            "/dashboard/admin/users/{id}",
            get(pages::admin_user_detail),
        )
        .route("/dashboard/user", get(pages::user_dashboard));

    let public = Router::new()
        .route("/healthz", get(public::healthz))
        .route("/images/{*path}", get(public::serve_image));

    pages
        .merge(public)
        .merge(api::build_api_router())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
