use uuid::Uuid;

use crate::application::posts::{PostWorkflowError, load_post};
use crate::application::repos::{PostListScope, RepoError};
use crate::domain::entities::{PostFilter, PostRecord, PostStatusCounts, PostWithOwner};

use super::service::AdminPostService;

impl AdminPostService {
    pub async fn list_all_posts(
        &self,
        filter: &PostFilter,
    ) -> Result<Vec<PostWithOwner>, RepoError> {
        self.reader.list_posts(PostListScope::All, filter).await
    }

    pub async fn list_posts_by_user(
        &self,
        user_id: Uuid,
        filter: &PostFilter,
    ) -> Result<Vec<PostRecord>, PostWorkflowError> {
        if self.users.find_user(user_id).await?.is_none() {
            return Err(PostWorkflowError::OwnerNotFound);
        }

        let posts = self
            .reader
            .list_posts(PostListScope::Owner(user_id), filter)
            .await?;
        Ok(posts.into_iter().map(|entry| entry.post).collect())
    }

    pub async fn get_post(&self, id: Uuid) -> Result<PostRecord, PostWorkflowError> {
        load_post(self.reader.as_ref(), id).await
    }

    /// Per-status totals, optionally restricted to one owner.
    pub async fn status_counts(&self, owner: Option<Uuid>) -> Result<PostStatusCounts, RepoError> {
        self.reader.count_posts_by_status(owner).await
    }
}
