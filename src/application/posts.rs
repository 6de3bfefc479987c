//! Pieces shared by the admin and owner post services.

use metrics::counter;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::images::ImageError;
use crate::application::repos::{PostsRepo, RepoError, UpdatePostParams};
use crate::domain::entities::{PostContent, PostRecord};
use crate::domain::error::DomainError;
use crate::domain::posts::{PostLifecycle, WorkflowError, normalize_image_url};
use crate::domain::types::PostStatus;

#[derive(Debug, Error)]
pub enum PostWorkflowError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("Post not found")]
    NotFound,
    #[error("User not found")]
    OwnerNotFound,
    #[error("You don't have permission to {action} this post")]
    Forbidden { action: &'static str },
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Content of a post about to be created.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub heading: String,
    pub caption: String,
    pub hookline: String,
    pub cta: String,
    pub hashtags: Vec<String>,
    pub social: Vec<String>,
    pub image_url: Option<String>,
}

impl NewPost {
    pub(crate) fn into_parts(self) -> Result<(PostContent, Option<String>), DomainError> {
        let content = PostContent {
            heading: self.heading,
            caption: self.caption,
            hookline: self.hookline,
            cta: self.cta,
            hashtags: self.hashtags,
            social: self.social,
        }
        .normalized()?;
        Ok((content, normalize_image_url(self.image_url)))
    }
}

/// Partial edit. `image_url: Some("")` removes the image.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub heading: Option<String>,
    pub caption: Option<String>,
    pub hookline: Option<String>,
    pub cta: Option<String>,
    pub hashtags: Option<Vec<String>>,
    pub social: Option<Vec<String>>,
    pub image_url: Option<String>,
}

impl PostPatch {
    pub fn with_image(url: impl Into<String>) -> Self {
        Self {
            image_url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Merge the patch onto `post` and work out the resulting status.
    pub(crate) fn apply(self, post: &PostRecord) -> Result<UpdatePostParams, DomainError> {
        let mut content = post.content();
        if let Some(heading) = self.heading {
            content.heading = heading;
        }
        if let Some(caption) = self.caption {
            content.caption = caption;
        }
        if let Some(hookline) = self.hookline {
            content.hookline = hookline;
        }
        if let Some(cta) = self.cta {
            content.cta = cta;
        }
        if let Some(hashtags) = self.hashtags {
            content.hashtags = hashtags;
        }
        if let Some(social) = self.social {
            content.social = social;
        }
        let content = content.normalized()?;

        let image_url = match self.image_url {
            Some(url) => normalize_image_url(Some(url)),
            None => post.image_url.clone(),
        };

        let outcome = post
            .status
            .after_edit(post.has_image(), image_url.is_some());
        let comment = if outcome.clear_comment {
            None
        } else {
            post.comment.clone()
        };

        Ok(UpdatePostParams {
            id: post.id,
            expected_status: post.status,
            content,
            image_url,
            status: outcome.status,
            comment,
        })
    }
}

pub(crate) async fn load_post(
    reader: &dyn PostsRepo,
    id: Uuid,
) -> Result<PostRecord, PostWorkflowError> {
    reader
        .find_post(id)
        .await?
        .ok_or(PostWorkflowError::NotFound)
}

/// The previous image URL when an update replaced or dropped it.
pub(crate) fn superseded_image<'a>(before: &'a PostRecord, after: &PostRecord) -> Option<&'a str> {
    match before.image_url.as_deref() {
        Some(old) if after.image_url.as_deref() != Some(old) => Some(old),
        _ => None,
    }
}

pub(crate) fn record_transition(post_id: Uuid, from: PostStatus, to: PostStatus, actor: &str) {
    if from == to {
        return;
    }
    counter!(
        "postdesk_post_transition_total",
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
    info!(
        target = "postdesk::posts",
        post_id = %post_id,
        from = from.as_str(),
        to = to.as_str(),
        actor = actor,
        "post status changed"
    );
}
