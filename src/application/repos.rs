//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{
    PostContent, PostFilter, PostRecord, PostStatusCounts, PostWithOwner, UserRecord, UserSummary,
};
use crate::domain::types::{PostStatus, Role};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("stale write: {message}")]
    Conflict { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    /// A guarded post write found the row gone or in another status.
    pub fn stale_post(id: Uuid, expected: PostStatus) -> Self {
        Self::Conflict {
            message: format!("post {id} is no longer \"{expected}\""),
        }
    }
}

/// Which posts a listing may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostListScope {
    All,
    Owner(Uuid),
    /// The owner's posts minus drafts, which are still with the admin.
    OwnerSubmitted(Uuid),
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub role: Role,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct UpdateUserParams {
    pub id: Uuid,
    pub username: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub user_id: Uuid,
    pub content: PostContent,
    pub image_url: Option<String>,
    pub status: PostStatus,
}

/// Full replacement of the mutable columns of a post.
///
/// The write only lands while the stored status still equals
/// `expected_status`; otherwise it fails with [`RepoError::Conflict`].
#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub expected_status: PostStatus,
    pub content: PostContent,
    pub image_url: Option<String>,
    pub status: PostStatus,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostStatusParams {
    pub id: Uuid,
    pub expected_status: PostStatus,
    pub status: PostStatus,
    pub comment: Option<String>,
    pub posted_at: Option<OffsetDateTime>,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;

    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<UserRecord>, RepoError>;

    /// Newest first.
    async fn list_users(&self) -> Result<Vec<UserSummary>, RepoError>;
}

#[async_trait]
pub trait UsersWriteRepo: Send + Sync {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;

    async fn update_user(&self, params: UpdateUserParams) -> Result<UserRecord, RepoError>;

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), RepoError>;

    /// Removes the user together with every post they own.
    async fn delete_user(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn find_post(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;

    /// Newest first.
    async fn list_posts(
        &self,
        scope: PostListScope,
        filter: &PostFilter,
    ) -> Result<Vec<PostWithOwner>, RepoError>;

    async fn count_posts_by_status(
        &self,
        owner: Option<Uuid>,
    ) -> Result<PostStatusCounts, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post_status(
        &self,
        params: UpdatePostStatusParams,
    ) -> Result<PostRecord, RepoError>;

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;
}

/// Object storage for post images, addressed by `<bucket>/<name>` keys.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put_object(&self, key: &str, data: Bytes) -> Result<(), RepoError>;

    async fn get_object(&self, key: &str) -> Result<Option<Bytes>, RepoError>;

    /// Missing objects are not an error.
    async fn delete_object(&self, key: &str) -> Result<(), RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
