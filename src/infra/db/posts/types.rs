use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{PostRecord, PostWithOwner};
use crate::domain::types::PostStatus;

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: Uuid,
    pub(crate) user_id: Uuid,
    pub(crate) heading: String,
    pub(crate) caption: String,
    pub(crate) hookline: String,
    pub(crate) cta: String,
    pub(crate) hashtags: Vec<String>,
    pub(crate) social: Vec<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) status: PostStatus,
    pub(crate) comment: Option<String>,
    pub(crate) posted_at: Option<OffsetDateTime>,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            heading: row.heading,
            caption: row.caption,
            hookline: row.hookline,
            cta: row.cta,
            hashtags: row.hashtags,
            social: row.social,
            image_url: row.image_url,
            status: row.status,
            comment: row.comment,
            posted_at: row.posted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PostWithOwnerRow {
    #[sqlx(flatten)]
    pub(crate) post: PostRow,
    pub(crate) owner_username: String,
}

impl From<PostWithOwnerRow> for PostWithOwner {
    fn from(row: PostWithOwnerRow) -> Self {
        Self {
            post: row.post.into(),
            owner_username: row.owner_username,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct StatusCountRow {
    pub(crate) status: PostStatus,
    pub(crate) count: i64,
}
