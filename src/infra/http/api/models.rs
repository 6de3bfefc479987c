//! Conversions between application records and the wire types.

pub use postdesk_api_types::{
    Base64UploadRequest, ChangePasswordRequest, DisapproveRequest, LoginRequest, MessageResponse,
    OwnPostCreateRequest, PostCreateRequest, PostResponse, PostStatusCountsResponse,
    PostStatusRequest, PostUpdateRequest, ReviewStatus, SessionResponse, UploadResponse,
    UserCreateRequest, UserResponse, UserUpdateRequest,
};

use crate::application::auth::SessionUser;
use crate::application::images::StoredImage;
use crate::application::posts::{NewPost, PostPatch};
use crate::domain::entities::{PostRecord, PostStatusCounts, PostWithOwner, UserSummary};
use crate::domain::types::ReviewDecision;

impl From<&SessionUser> for SessionResponse {
    fn from(user: &SessionUser) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

impl From<UserSummary> for UserResponse {
    fn from(user: UserSummary) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

impl From<PostRecord> for PostResponse {
    fn from(post: PostRecord) -> Self {
        Self {
            id: post.id,
            user_id: post.user_id,
            heading: post.heading,
            caption: post.caption,
            hookline: post.hookline,
            cta: post.cta,
            hashtags: post.hashtags,
            social: post.social,
            image_url: post.image_url,
            status: post.status,
            comment: post.comment,
            posted_at: post.posted_at,
            created_at: post.created_at,
            updated_at: post.updated_at,
            owner_username: None,
        }
    }
}

impl From<PostWithOwner> for PostResponse {
    fn from(entry: PostWithOwner) -> Self {
        Self {
            owner_username: Some(entry.owner_username),
            ..Self::from(entry.post)
        }
    }
}

impl From<PostStatusCounts> for PostStatusCountsResponse {
    fn from(counts: PostStatusCounts) -> Self {
        Self {
            total: counts.total(),
            draft: counts.draft,
            pending: counts.pending,
            approved: counts.approved,
            rejected: counts.rejected,
            posted: counts.posted,
        }
    }
}

impl From<StoredImage> for UploadResponse {
    fn from(image: StoredImage) -> Self {
        Self {
            url: image.url,
            name: image.name,
            content_type: image.content_type,
            size_bytes: image.size_bytes,
            width: image.width,
            height: image.height,
            checksum: image.checksum,
        }
    }
}

pub(crate) fn new_post_from_admin(request: PostCreateRequest) -> NewPost {
    NewPost {
        heading: request.heading,
        caption: request.caption,
        hookline: request.hookline,
        cta: request.cta,
        hashtags: request.hashtags,
        social: request.social,
        image_url: request.image_url,
    }
}

pub(crate) fn new_post_from_owner(request: OwnPostCreateRequest) -> NewPost {
    NewPost {
        heading: request.heading,
        caption: request.caption,
        hookline: request.hookline,
        cta: request.cta,
        hashtags: request.hashtags,
        social: request.social,
        image_url: request.image_url,
    }
}

pub(crate) fn post_patch(request: PostUpdateRequest) -> PostPatch {
    PostPatch {
        heading: request.heading,
        caption: request.caption,
        hookline: request.hookline,
        cta: request.cta,
        hashtags: request.hashtags,
        social: request.social,
        image_url: request.image_url,
    }
}

pub(crate) fn review_decision(request: PostStatusRequest) -> ReviewDecision {
    match request.status {
        ReviewStatus::Approved => ReviewDecision::Approve,
        ReviewStatus::Rejected => ReviewDecision::Reject {
            comment: request.comment,
        },
    }
}
