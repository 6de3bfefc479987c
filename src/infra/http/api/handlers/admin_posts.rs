//! Admin post handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::admin::posts::{
    CreatePostCommand, UpdatePostCommand, UpdatePostStatusCommand,
};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{
    PostCreateRequest, PostResponse, PostStatusCountsResponse, PostStatusRequest,
    PostUpdateRequest, new_post_from_admin, post_patch, review_decision,
};
use crate::infra::http::state::AppState;

use super::{PostListQuery, posts_to_api, repo_to_api};

#[derive(Debug, Default, Deserialize)]
pub struct CountsQuery {
    pub user_id: Option<Uuid>,
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state
        .posts
        .list_all_posts(&query.into_filter())
        .await
        .map_err(repo_to_api)?;

    let posts: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();
    Ok(Json(posts))
}

pub async fn post_counts(
    State(state): State<AppState>,
    Query(query): Query<CountsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let counts = state
        .posts
        .status_counts(query.user_id)
        .await
        .map_err(repo_to_api)?;
    Ok(Json(PostStatusCountsResponse::from(counts)))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.get_post(id).await.map_err(posts_to_api)?;
    Ok(Json(PostResponse::from(post)))
}

pub async fn create_post(
    State(state): State<AppState>,
    Json(payload): Json<PostCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = payload.user_id;
    let post = state
        .posts
        .create_post(CreatePostCommand {
            user_id,
            post: new_post_from_admin(payload),
        })
        .await
        .map_err(posts_to_api)?;

    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .posts
        .update_post(UpdatePostCommand {
            id,
            patch: post_patch(payload),
        })
        .await
        .map_err(posts_to_api)?;

    Ok(Json(PostResponse::from(post)))
}

pub async fn update_post_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .posts
        .update_post_status(UpdatePostStatusCommand {
            id,
            decision: review_decision(payload),
        })
        .await
        .map_err(posts_to_api)?;

    Ok(Json(PostResponse::from(post)))
}

pub async fn mark_posted(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.mark_posted(id).await.map_err(posts_to_api)?;
    Ok(Json(PostResponse::from(post)))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.posts.delete_post(id).await.map_err(posts_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
