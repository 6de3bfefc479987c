//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::{PostStatus, Role};

/// Stored account. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub created_at: OffsetDateTime,
}

impl From<UserRecord> for UserSummary {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            role: record.role,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub heading: String,
    pub caption: String,
    pub hookline: String,
    pub cta: String,
    pub hashtags: Vec<String>,
    pub social: Vec<String>,
    pub image_url: Option<String>,
    pub status: PostStatus,
    pub comment: Option<String>,
    pub posted_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl PostRecord {
    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }

    pub fn content(&self) -> PostContent {
        PostContent {
            heading: self.heading.clone(),
            caption: self.caption.clone(),
            hookline: self.hookline.clone(),
            cta: self.cta.clone(),
            hashtags: self.hashtags.clone(),
            social: self.social.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostWithOwner {
    pub post: PostRecord,
    pub owner_username: String,
}

/// Editable text fields of a post, already normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContent {
    pub heading: String,
    pub caption: String,
    pub hookline: String,
    pub cta: String,
    pub hashtags: Vec<String>,
    pub social: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub social: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PostStatusCounts {
    pub draft: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub posted: u64,
}

impl PostStatusCounts {
    pub fn total(&self) -> u64 {
        self.draft + self.pending + self.approved + self.rejected + self.posted
    }

    pub fn add(&mut self, status: PostStatus, count: u64) {
        match status {
            PostStatus::Draft => self.draft += count,
            PostStatus::Pending => self.pending += count,
            PostStatus::Approved => self.approved += count,
            PostStatus::Rejected => self.rejected += count,
            PostStatus::Posted => self.posted += count,
        }
    }

    pub fn get(&self, status: PostStatus) -> u64 {
        match status {
            PostStatus::Draft => self.draft,
            PostStatus::Pending => self.pending,
            PostStatus::Approved => self.approved,
            PostStatus::Rejected => self.rejected,
            PostStatus::Posted => self.posted,
        }
    }
}
