//! Image upload handlers

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::images::{ImageError, ImageUpload};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{Base64UploadRequest, UploadResponse};
use crate::infra::http::state::AppState;

use super::image_to_api;

/// Pull the `file` field out of a multipart body.
pub(crate) async fn read_file_field(mut multipart: Multipart) -> Result<ImageUpload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request("Invalid multipart payload", Some(err.to_string())))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().map(|s| s.to_string());
            let content_type = field.content_type().map(|s| s.to_string());
            let data = field.bytes().await.map_err(|err| {
                ApiError::bad_request("Failed to read upload", Some(err.to_string()))
            })?;
            if data.is_empty() {
                break;
            }
            return Ok(ImageUpload {
                filename,
                content_type,
                data,
            });
        }
    }

    Err(image_to_api(ImageError::Missing))
}

pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_file_field(multipart).await?;
    let stored = state.images.upload(upload).await.map_err(image_to_api)?;

    Ok((StatusCode::CREATED, Json(UploadResponse::from(stored))))
}

pub async fn upload_base64(
    State(state): State<AppState>,
    Json(payload): Json<Base64UploadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.data.trim().is_empty() {
        return Err(image_to_api(ImageError::Missing));
    }

    let stored = state
        .images
        .upload_data_uri(&payload.data, payload.filename)
        .await
        .map_err(image_to_api)?;

    Ok((StatusCode::CREATED, Json(UploadResponse::from(stored))))
}
