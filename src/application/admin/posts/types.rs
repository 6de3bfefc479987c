use uuid::Uuid;

use crate::application::posts::{NewPost, PostPatch};
use crate::domain::types::ReviewDecision;

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub user_id: Uuid,
    pub post: NewPost,
}

#[derive(Debug, Clone)]
pub struct UpdatePostCommand {
    pub id: Uuid,
    pub patch: PostPatch,
}

#[derive(Debug, Clone)]
pub struct UpdatePostStatusCommand {
    pub id: Uuid,
    pub decision: ReviewDecision,
}
