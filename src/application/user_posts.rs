//! Posts seen from the owning user's side.

use std::sync::Arc;

use uuid::Uuid;

use crate::application::auth::SessionUser;
use crate::application::images::{ImageService, ImageUpload};
use crate::application::posts::{
    NewPost, PostPatch, PostWorkflowError, load_post, record_transition, superseded_image,
};
use crate::application::repos::{
    CreatePostParams, PostListScope, PostsRepo, PostsWriteRepo, RepoError, UpdatePostStatusParams,
};
use crate::domain::entities::{PostFilter, PostRecord, PostStatusCounts};
use crate::domain::posts::PostLifecycle;
use crate::domain::types::{PostStatus, ReviewDecision};

#[derive(Clone)]
pub struct UserPostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    images: Arc<ImageService>,
}

impl UserPostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        images: Arc<ImageService>,
    ) -> Self {
        Self {
            reader,
            writer,
            images,
        }
    }

    /// The user's posts without drafts, newest first.
    pub async fn list_own_posts(
        &self,
        user: &SessionUser,
        filter: &PostFilter,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let posts = self
            .reader
            .list_posts(PostListScope::OwnerSubmitted(user.id), filter)
            .await?;
        Ok(posts.into_iter().map(|entry| entry.post).collect())
    }

    pub async fn own_status_counts(&self, user: &SessionUser) -> Result<PostStatusCounts, RepoError> {
        self.reader.count_posts_by_status(Some(user.id)).await
    }

    pub async fn create_own_post(
        &self,
        user: &SessionUser,
        post: NewPost,
    ) -> Result<PostRecord, PostWorkflowError> {
        let (content, image_url) = post.into_parts()?;
        let status = PostStatus::initial(image_url.is_some());

        let created = self
            .writer
            .create_post(CreatePostParams {
                user_id: user.id,
                content,
                image_url,
                status,
            })
            .await?;
        Ok(created)
    }

    pub async fn update_own_post(
        &self,
        user: &SessionUser,
        id: Uuid,
        patch: PostPatch,
    ) -> Result<PostRecord, PostWorkflowError> {
        let existing = self.owned_post(user, id, "update").await?;
        existing.status.ensure_owner_editable()?;

        let params = patch.apply(&existing)?;
        let updated = self.writer.update_post(params).await?;

        record_transition(updated.id, existing.status, updated.status, &user.username);
        self.images
            .discard(superseded_image(&existing, &updated))
            .await;

        Ok(updated)
    }

    pub async fn delete_own_post(
        &self,
        user: &SessionUser,
        id: Uuid,
    ) -> Result<(), PostWorkflowError> {
        let existing = self.owned_post(user, id, "delete").await?;
        existing.status.ensure_owner_editable()?;

        self.writer.delete_post(existing.id).await?;
        self.images.discard(existing.image_url.as_deref()).await;
        Ok(())
    }

    pub async fn approve_post(
        &self,
        user: &SessionUser,
        id: Uuid,
    ) -> Result<PostRecord, PostWorkflowError> {
        self.review_own_post(user, id, ReviewDecision::Approve, "approve")
            .await
    }

    pub async fn disapprove_post(
        &self,
        user: &SessionUser,
        id: Uuid,
        comment: Option<String>,
    ) -> Result<PostRecord, PostWorkflowError> {
        self.review_own_post(user, id, ReviewDecision::Reject { comment }, "disapprove")
            .await
    }

    /// Store the image and attach it in one step; the stored object is
    /// dropped again if the post cannot take it.
    pub async fn attach_image(
        &self,
        user: &SessionUser,
        id: Uuid,
        upload: ImageUpload,
    ) -> Result<PostRecord, PostWorkflowError> {
        let existing = self.owned_post(user, id, "update").await?;
        existing.status.ensure_owner_editable()?;

        let stored = self.images.upload(upload).await?;
        match self
            .update_own_post(user, id, PostPatch::with_image(stored.url.clone()))
            .await
        {
            Ok(post) => Ok(post),
            Err(err) => {
                self.images.discard(Some(&stored.url)).await;
                Err(err)
            }
        }
    }

    async fn review_own_post(
        &self,
        user: &SessionUser,
        id: Uuid,
        decision: ReviewDecision,
        action: &'static str,
    ) -> Result<PostRecord, PostWorkflowError> {
        let existing = self.owned_post(user, id, action).await?;
        let outcome = existing.status.review(decision)?;

        let updated = self
            .writer
            .update_post_status(UpdatePostStatusParams {
                id: existing.id,
                expected_status: existing.status,
                status: outcome.status,
                comment: outcome.comment,
                posted_at: None,
            })
            .await?;

        record_transition(updated.id, existing.status, updated.status, &user.username);
        Ok(updated)
    }

    async fn owned_post(
        &self,
        user: &SessionUser,
        id: Uuid,
        action: &'static str,
    ) -> Result<PostRecord, PostWorkflowError> {
        let post = load_post(self.reader.as_ref(), id).await?;
        if post.user_id != user.id {
            return Err(PostWorkflowError::Forbidden { action });
        }
        Ok(post)
    }
}
