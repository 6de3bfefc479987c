use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::images::ImageService;
use crate::application::passwords::{PasswordError, PasswordHasher};
use crate::application::repos::{
    CreateUserParams, PostListScope, PostsRepo, RepoError, UpdateUserParams, UsersRepo,
    UsersWriteRepo,
};
use crate::domain::entities::{PostFilter, UserSummary};
use crate::domain::error::DomainError;
use crate::domain::types::Role;
use crate::domain::users::{normalize_username, validate_new_password};

#[derive(Debug, Error)]
pub enum AdminUserError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("Username already exists")]
    DuplicateUsername,
    #[error("User not found")]
    NotFound,
    #[error("No fields to update")]
    NothingToUpdate,
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for AdminUserError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate { .. } => Self::DuplicateUsername,
            RepoError::NotFound => Self::NotFound,
            other => Self::Repo(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpdateUserCommand {
    pub id: Uuid,
    pub username: Option<String>,
    pub role: Option<Role>,
}

#[derive(Clone)]
pub struct AdminUserService {
    reader: Arc<dyn UsersRepo>,
    writer: Arc<dyn UsersWriteRepo>,
    posts: Arc<dyn PostsRepo>,
    images: Arc<ImageService>,
    hasher: PasswordHasher,
    default_password: String,
}

impl AdminUserService {
    pub fn new(
        reader: Arc<dyn UsersRepo>,
        writer: Arc<dyn UsersWriteRepo>,
        posts: Arc<dyn PostsRepo>,
        images: Arc<ImageService>,
        hasher: PasswordHasher,
        default_password: impl Into<String>,
    ) -> Self {
        Self {
            reader,
            writer,
            posts,
            images,
            hasher,
            default_password: default_password.into(),
        }
    }

    /// New accounts get the configured default password.
    pub async fn create_user(
        &self,
        username: &str,
        role: Role,
    ) -> Result<UserSummary, AdminUserError> {
        let password = self.default_password.clone();
        self.create_user_with_password(username, role, &password)
            .await
    }

    pub async fn create_user_with_password(
        &self,
        username: &str,
        role: Role,
        password: &str,
    ) -> Result<UserSummary, AdminUserError> {
        let username = normalize_username(username)?;
        validate_new_password(password)?;

        if self.reader.find_user_by_username(&username).await?.is_some() {
            return Err(AdminUserError::DuplicateUsername);
        }

        let password_hash = self.hasher.hash(password).await?;
        let user = self
            .writer
            .create_user(CreateUserParams {
                username,
                role,
                password_hash,
            })
            .await?;

        info!(
            target = "postdesk::admin::users",
            user_id = %user.id,
            role = user.role.as_str(),
            "user created"
        );
        Ok(UserSummary::from(user))
    }

    pub async fn update_user(
        &self,
        command: UpdateUserCommand,
    ) -> Result<UserSummary, AdminUserError> {
        if command.username.is_none() && command.role.is_none() {
            return Err(AdminUserError::NothingToUpdate);
        }

        let existing = self
            .reader
            .find_user(command.id)
            .await?
            .ok_or(AdminUserError::NotFound)?;

        let username = command
            .username
            .as_deref()
            .map(normalize_username)
            .transpose()?;

        if let Some(candidate) = username.as_deref()
            && candidate != existing.username
            && self.reader.find_user_by_username(candidate).await?.is_some()
        {
            return Err(AdminUserError::DuplicateUsername);
        }

        let updated = self
            .writer
            .update_user(UpdateUserParams {
                id: existing.id,
                username,
                role: command.role,
            })
            .await?;

        Ok(UserSummary::from(updated))
    }

    /// Posts go with the user; their images are removed afterwards.
    pub async fn delete_user(&self, id: Uuid) -> Result<(), AdminUserError> {
        if self.reader.find_user(id).await?.is_none() {
            return Err(AdminUserError::NotFound);
        }

        let owned = self
            .posts
            .list_posts(PostListScope::Owner(id), &PostFilter::default())
            .await?;

        self.writer.delete_user(id).await?;

        for entry in &owned {
            self.images.discard(entry.post.image_url.as_deref()).await;
        }

        info!(
            target = "postdesk::admin::users",
            user_id = %id,
            posts = owned.len(),
            "user deleted"
        );
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummary>, AdminUserError> {
        Ok(self.reader.list_users().await?)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<UserSummary, AdminUserError> {
        self.reader
            .find_user(id)
            .await?
            .map(UserSummary::from)
            .ok_or(AdminUserError::NotFound)
    }
}
