//! API handlers organized by resource type.
//!
//! Helper functions for error conversion are defined here and shared across modules.

mod admin_posts;
mod admin_users;
mod auth;
mod uploads;
mod user_posts;

pub use admin_posts::*;
pub use admin_users::*;
pub use auth::*;
pub use uploads::*;
pub use user_posts::*;

// ----- Shared query structs -----

use serde::{Deserialize, Deserializer};

use crate::domain::entities::PostFilter;
use crate::domain::types::PostStatus;

#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub status: Option<PostStatus>,
    pub social: Option<String>,
    pub search: Option<String>,
}

/// Dashboard forms submit `status=` for "all statuses".
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<PostStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => {
            PostStatus::deserialize(serde::de::value::StrDeserializer::<D::Error>::new(value))
                .map(Some)
        }
    }
}

impl PostListQuery {
    pub fn into_filter(self) -> PostFilter {
        let non_blank = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        PostFilter {
            status: self.status,
            social: non_blank(self.social),
            search: non_blank(self.search),
        }
    }
}

// ----- Shared error conversions -----

use axum::http::StatusCode;

use crate::application::admin::users::AdminUserError;
use crate::application::auth::AuthError;
use crate::application::images::ImageError;
use crate::application::posts::PostWorkflowError;
use crate::application::repos::RepoError;
use crate::domain::posts::WorkflowError;

use super::error::{ApiError, codes};

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("Resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Conflict { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::CONFLICT,
            "Post was changed by another request, reload and try again",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(message),
        ),
    }
}

pub(crate) fn auth_to_api(err: AuthError) -> ApiError {
    match err {
        AuthError::MissingCredentials | AuthError::MissingPasswords => {
            ApiError::bad_request(err.to_string(), None)
        }
        AuthError::InvalidCredentials => ApiError::new(
            StatusCode::UNAUTHORIZED,
            codes::INVALID_CREDENTIALS,
            err.to_string(),
            None,
        ),
        AuthError::IncorrectPassword => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_CREDENTIALS,
            err.to_string(),
            None,
        ),
        AuthError::UnknownUser => ApiError::not_found(err.to_string()),
        AuthError::Domain(domain) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            domain.to_string(),
            None,
        ),
        AuthError::Password(password) => ApiError::internal(password.to_string()),
        AuthError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn users_to_api(err: AdminUserError) -> ApiError {
    match err {
        AdminUserError::Invalid(domain) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            domain.to_string(),
            None,
        ),
        AdminUserError::DuplicateUsername => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            err.to_string(),
            None,
        ),
        AdminUserError::NotFound => ApiError::not_found(err.to_string()),
        AdminUserError::NothingToUpdate => ApiError::bad_request(err.to_string(), None),
        AdminUserError::Password(password) => ApiError::internal(password.to_string()),
        AdminUserError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn posts_to_api(err: PostWorkflowError) -> ApiError {
    match err {
        PostWorkflowError::Invalid(domain) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            domain.to_string(),
            None,
        ),
        PostWorkflowError::Workflow(
            workflow @ (WorkflowError::CommentRequired | WorkflowError::RejectionCommentRequired),
        ) => ApiError::bad_request(workflow.to_string(), None),
        PostWorkflowError::Workflow(workflow) => ApiError::new(
            StatusCode::CONFLICT,
            codes::INVALID_TRANSITION,
            workflow.to_string(),
            None,
        ),
        PostWorkflowError::NotFound | PostWorkflowError::OwnerNotFound => {
            ApiError::not_found(err.to_string())
        }
        PostWorkflowError::Forbidden { .. } => ApiError::forbidden(err.to_string()),
        PostWorkflowError::Image(image) => image_to_api(image),
        PostWorkflowError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn image_to_api(err: ImageError) -> ApiError {
    match err {
        ImageError::TooLarge { .. } => ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            codes::UPLOAD,
            err.to_string(),
            None,
        ),
        ImageError::Missing
        | ImageError::NotAnImage
        | ImageError::Undecodable
        | ImageError::InvalidEncoding => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::UPLOAD,
            err.to_string(),
            None,
        ),
        ImageError::Store(repo) => repo_to_api(repo),
    }
}
