//! Admin user management handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::admin::users::UpdateUserCommand;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{
    PostResponse, UserCreateRequest, UserResponse, UserUpdateRequest,
};
use crate::infra::http::state::AppState;

use super::{PostListQuery, posts_to_api, users_to_api};

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.users.list_users().await.map_err(users_to_api)?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.get_user(id).await.map_err(users_to_api)?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<UserCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .create_user(&payload.username, payload.role)
        .await
        .map_err(users_to_api)?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .update_user(UpdateUserCommand {
            id,
            username: payload.username,
            role: payload.role,
        })
        .await
        .map_err(users_to_api)?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.users.delete_user(id).await.map_err(users_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_user_posts(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PostListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state
        .posts
        .list_posts_by_user(id, &query.into_filter())
        .await
        .map_err(posts_to_api)?;

    let posts: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();
    Ok(Json(posts))
}
