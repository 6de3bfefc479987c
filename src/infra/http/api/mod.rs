pub mod error;
pub mod handlers;
pub mod models;
pub mod rate_limit;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::infra::http::state::AppState;

/// JSON routes. Session and role checks happen in the shared gate layer.
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/me", get(handlers::me))
        .route("/api/auth/password", post(handlers::change_password))
        .route("/api/upload", post(handlers::upload_image))
        .route("/api/upload/base64", post(handlers::upload_base64))
        .route(
            "/api/admin/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/api/admin/users/{id}",
            get(handlers::get_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/api/admin/users/{id}/posts", get(handlers::list_user_posts))
        .route(
            "/api/admin/posts",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route("/api/admin/posts/counts", get(handlers::post_counts))
        .route(
            "/api/admin/posts/{id}",
            get(handlers::get_post)
                .patch(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route(
            "/api/admin/posts/{id}/status",
            post(handlers::update_post_status),
        )
        .route("/api/admin/posts/{id}/posted", post(handlers::mark_posted))
        .route(
            "/api/user/posts",
            get(handlers::list_own_posts).post(handlers::create_own_post),
        )
        .route("/api/user/posts/counts", get(handlers::own_post_counts))
        .route(
            "/api/user/posts/{id}",
            patch(handlers::update_own_post).delete(handlers::delete_own_post),
        )
        .route(
            "/api/user/posts/{id}/approve",
            post(handlers::approve_own_post),
        )
        .route(
            "/api/user/posts/{id}/disapprove",
            post(handlers::disapprove_own_post),
        )
        .route(
            "/api/user/posts/{id}/image",
            post(handlers::attach_own_post_image),
        )
}
