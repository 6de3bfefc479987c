use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::posts::{
    PostWorkflowError, load_post, record_transition, superseded_image,
};
use crate::application::repos::{CreatePostParams, UpdatePostStatusParams};
use crate::domain::entities::PostRecord;
use crate::domain::posts::{PostLifecycle, WorkflowError};
use crate::domain::types::PostStatus;

use super::service::{ACTOR, AdminPostService};
use super::types::{CreatePostCommand, UpdatePostCommand, UpdatePostStatusCommand};

impl AdminPostService {
    /// Admin-created posts always start as drafts, image or not.
    pub async fn create_post(
        &self,
        command: CreatePostCommand,
    ) -> Result<PostRecord, PostWorkflowError> {
        let (content, image_url) = command.post.into_parts()?;

        if self.users.find_user(command.user_id).await?.is_none() {
            return Err(PostWorkflowError::OwnerNotFound);
        }

        let post = self
            .writer
            .create_post(CreatePostParams {
                user_id: command.user_id,
                content,
                image_url,
                status: PostStatus::Draft,
            })
            .await?;

        Ok(post)
    }

    pub async fn update_post(
        &self,
        command: UpdatePostCommand,
    ) -> Result<PostRecord, PostWorkflowError> {
        let existing = load_post(self.reader.as_ref(), command.id).await?;
        existing.status.ensure_mutable()?;

        let params = command.patch.apply(&existing)?;
        let updated = self.writer.update_post(params).await?;

        record_transition(updated.id, existing.status, updated.status, ACTOR);
        self.images
            .discard(superseded_image(&existing, &updated))
            .await;

        Ok(updated)
    }

    pub async fn update_post_status(
        &self,
        command: UpdatePostStatusCommand,
    ) -> Result<PostRecord, PostWorkflowError> {
        let existing = load_post(self.reader.as_ref(), command.id).await?;
        let outcome = existing
            .status
            .review(command.decision)
            .map_err(WorkflowError::for_admin)?;

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

        record_transition(updated.id, existing.status, updated.status, ACTOR);
        Ok(updated)
    }

    pub async fn mark_posted(&self, id: Uuid) -> Result<PostRecord, PostWorkflowError> {
        let existing = load_post(self.reader.as_ref(), id).await?;
        let status = existing.status.mark_posted()?;

        let updated = self
            .writer
            .update_post_status(UpdatePostStatusParams {
                id: existing.id,
                expected_status: existing.status,
                status,
                comment: existing.comment.clone(),
                posted_at: Some(OffsetDateTime::now_utc()),
            })
            .await?;

        record_transition(updated.id, existing.status, updated.status, ACTOR);
        Ok(updated)
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<(), PostWorkflowError> {
        let existing = load_post(self.reader.as_ref(), id).await?;
        existing.status.ensure_mutable()?;

        self.writer.delete_post(existing.id).await?;
        self.images.discard(existing.image_url.as_deref()).await;
        Ok(())
    }
}
