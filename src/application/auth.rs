//! Credential checks and password changes.

use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;
use uuid::Uuid;

use crate::application::passwords::{PasswordError, PasswordHasher};
use crate::application::repos::{RepoError, UsersRepo, UsersWriteRepo};
use crate::domain::entities::UserRecord;
use crate::domain::error::DomainError;
use crate::domain::types::Role;
use crate::domain::users::validate_new_password;

/// Identity carried by the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub role: Role,
    pub username: String,
}

impl From<&UserRecord> for SessionUser {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            role: user.role,
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username and password are required")]
    MissingCredentials,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Current password and new password are required")]
    MissingPasswords,
    #[error("Current password is incorrect")]
    IncorrectPassword,
    #[error("User not found")]
    UnknownUser,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Verified against when the username is unknown, so both failures cost one
/// bcrypt check.
const UNKNOWN_USER_PASSWORD: &str = "postdesk-unknown-user";

#[derive(Clone)]
pub struct AuthService {
    reader: Arc<dyn UsersRepo>,
    writer: Arc<dyn UsersWriteRepo>,
    hasher: PasswordHasher,
    unknown_user_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    pub fn new(
        reader: Arc<dyn UsersRepo>,
        writer: Arc<dyn UsersWriteRepo>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            reader,
            writer,
            hasher,
            unknown_user_hash: Arc::new(OnceCell::new()),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<SessionUser, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let Some(user) = self.reader.find_user_by_username(username).await? else {
            let hash = self
                .unknown_user_hash
                .get_or_try_init(|| self.hasher.hash(UNKNOWN_USER_PASSWORD))
                .await?;
            self.hasher.verify(password, hash).await?;
            counter!("postdesk_login_total", "outcome" => "unknown_user").increment(1);
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &user.password_hash).await? {
            counter!("postdesk_login_total", "outcome" => "bad_password").increment(1);
            return Err(AuthError::InvalidCredentials);
        }

        counter!("postdesk_login_total", "outcome" => "success").increment(1);
        info!(
            target = "postdesk::auth",
            user_id = %user.id,
            role = user.role.as_str(),
            "user logged in"
        );
        Ok(SessionUser::from(&user))
    }

    /// The stored account behind a session cookie, with its current role and
    /// username; `None` once the account is gone.
    pub async fn resolve_session(
        &self,
        session: &SessionUser,
    ) -> Result<Option<SessionUser>, AuthError> {
        let user = self.reader.find_user(session.id).await?;
        Ok(user.as_ref().map(SessionUser::from))
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if current_password.is_empty() || new_password.is_empty() {
            return Err(AuthError::MissingPasswords);
        }
        validate_new_password(new_password)?;

        let user = self
            .reader
            .find_user(user_id)
            .await?
            .ok_or(AuthError::UnknownUser)?;

        if !self
            .hasher
            .verify(current_password, &user.password_hash)
            .await?
        {
            return Err(AuthError::IncorrectPassword);
        }

        let hash = self.hasher.hash(new_password).await?;
        self.writer.update_password_hash(user.id, &hash).await?;

        info!(
            target = "postdesk::auth",
            user_id = %user.id,
            "password changed"
        );
        Ok(())
    }
}
