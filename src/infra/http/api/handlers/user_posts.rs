//! Handlers for the logged-in user's own posts

use axum::Json;
use axum::extract::{Extension, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::auth::SessionUser;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{
    DisapproveRequest, OwnPostCreateRequest, PostResponse, PostStatusCountsResponse,
    PostUpdateRequest, new_post_from_owner, post_patch,
};
use crate::infra::http::state::AppState;

use super::uploads::read_file_field;
use super::{PostListQuery, posts_to_api, repo_to_api};

pub async fn list_own_posts(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<PostListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state
        .user_posts
        .list_own_posts(&user, &query.into_filter())
        .await
        .map_err(repo_to_api)?;

    let posts: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();
    Ok(Json(posts))
}

pub async fn own_post_counts(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, ApiError> {
    let counts = state
        .user_posts
        .own_status_counts(&user)
        .await
        .map_err(repo_to_api)?;
    Ok(Json(PostStatusCountsResponse::from(counts)))
}

pub async fn create_own_post(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(payload): Json<OwnPostCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .user_posts
        .create_own_post(&user, new_post_from_owner(payload))
        .await
        .map_err(posts_to_api)?;

    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

pub async fn update_own_post(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .user_posts
        .update_own_post(&user, id, post_patch(payload))
        .await
        .map_err(posts_to_api)?;

    Ok(Json(PostResponse::from(post)))
}

pub async fn delete_own_post(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .user_posts
        .delete_own_post(&user, id)
        .await
        .map_err(posts_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn approve_own_post(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .user_posts
        .approve_post(&user, id)
        .await
        .map_err(posts_to_api)?;
    Ok(Json(PostResponse::from(post)))
}

pub async fn disapprove_own_post(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DisapproveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .user_posts
        .disapprove_post(&user, id, payload.comment)
        .await
        .map_err(posts_to_api)?;
    Ok(Json(PostResponse::from(post)))
}

pub async fn attach_own_post_image(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_file_field(multipart).await?;
    let post = state
        .user_posts
        .attach_image(&user, id, upload)
        .await
        .map_err(posts_to_api)?;
    Ok(Json(PostResponse::from(post)))
}
