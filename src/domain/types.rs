//! Shared domain enumerations aligned with persisted database enums.
//!
//! `Role` and `PostStatus` live in the API types crate so clients and the
//! server agree on their wire form; the `sqlx` feature maps them onto the
//! `user_role` and `post_status` Postgres enums.

pub use postdesk_api_types::{PostStatus, Role};

/// Decision taken while reviewing a pending post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject { comment: Option<String> },
}

impl ReviewDecision {
    pub fn target(&self) -> PostStatus {
        match self {
            ReviewDecision::Approve => PostStatus::Approved,
            ReviewDecision::Reject { .. } => PostStatus::Rejected,
        }
    }
}
