//! Post lifecycle rules.
//!
//! `draft -> pending -> approved | rejected`, `approved -> posted`. Content
//! edits can move a post back into review; posted posts are frozen.

use thiserror::Error;

use crate::domain::entities::PostContent;
use crate::domain::error::DomainError;
use crate::domain::types::{PostStatus, ReviewDecision};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error(
        "Cannot update status. Post is currently \"{current}\". Only pending posts can be approved or rejected."
    )]
    NotPending { current: PostStatus },
    #[error("Comment is required for disapproval")]
    CommentRequired,
    #[error("A comment is required when rejecting a post")]
    RejectionCommentRequired,
    #[error(
        "Cannot mark as posted. Post is currently \"{current}\". Only approved posts can be marked as posted."
    )]
    NotApproved { current: PostStatus },
    #[error("Posted posts can no longer be changed")]
    Immutable,
    #[error("Post is currently \"{current}\" and can no longer be changed")]
    Locked { current: PostStatus },
}

impl WorkflowError {
    /// Same rule, worded for the admin reviewing on the owner's behalf.
    pub fn for_admin(self) -> Self {
        match self {
            WorkflowError::CommentRequired => WorkflowError::RejectionCommentRequired,
            other => other,
        }
    }
}

/// Status and comment handling after a content edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOutcome {
    pub status: PostStatus,
    pub clear_comment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub status: PostStatus,
    pub comment: Option<String>,
}

pub trait PostLifecycle: Sized {
    /// Status of a post created by its owner.
    fn initial(has_image: bool) -> Self;

    fn after_edit(self, had_image: bool, has_image: bool) -> EditOutcome;

    fn review(self, decision: ReviewDecision) -> Result<ReviewOutcome, WorkflowError>;

    fn mark_posted(self) -> Result<Self, WorkflowError>;

    /// Any change at all, by anyone.
    fn ensure_mutable(self) -> Result<(), WorkflowError>;

    /// Edits and deletions made by the owning user.
    fn ensure_owner_editable(self) -> Result<(), WorkflowError>;
}

impl PostLifecycle for PostStatus {
    fn initial(has_image: bool) -> Self {
        if has_image {
            PostStatus::Pending
        } else {
            PostStatus::Draft
        }
    }

    fn after_edit(self, had_image: bool, has_image: bool) -> EditOutcome {
        if !has_image {
            return EditOutcome {
                status: PostStatus::Draft,
                clear_comment: self == PostStatus::Rejected,
            };
        }

        if self == PostStatus::Rejected {
            return EditOutcome {
                status: PostStatus::Pending,
                clear_comment: true,
            };
        }

        if !had_image {
            return EditOutcome {
                status: PostStatus::Pending,
                clear_comment: false,
            };
        }

        EditOutcome {
            status: self,
            clear_comment: false,
        }
    }

    fn review(self, decision: ReviewDecision) -> Result<ReviewOutcome, WorkflowError> {
        if self != PostStatus::Pending {
            return Err(WorkflowError::NotPending { current: self });
        }

        match decision {
            ReviewDecision::Approve => Ok(ReviewOutcome {
                status: PostStatus::Approved,
                comment: None,
            }),
            ReviewDecision::Reject { comment } => {
                let trimmed = comment
                    .as_deref()
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .ok_or(WorkflowError::CommentRequired)?;
                Ok(ReviewOutcome {
                    status: PostStatus::Rejected,
                    comment: Some(trimmed.to_string()),
                })
            }
        }
    }

    fn mark_posted(self) -> Result<Self, WorkflowError> {
        match self {
            PostStatus::Approved => Ok(PostStatus::Posted),
            current => Err(WorkflowError::NotApproved { current }),
        }
    }

    fn ensure_mutable(self) -> Result<(), WorkflowError> {
        match self {
            PostStatus::Posted => Err(WorkflowError::Immutable),
            _ => Ok(()),
        }
    }

    fn ensure_owner_editable(self) -> Result<(), WorkflowError> {
        match self {
            PostStatus::Draft | PostStatus::Pending | PostStatus::Rejected => Ok(()),
            PostStatus::Posted => Err(WorkflowError::Immutable),
            current => Err(WorkflowError::Locked { current }),
        }
    }
}

impl PostContent {
    /// Trim every field and reject empty required text.
    pub fn normalized(self) -> Result<Self, DomainError> {
        Ok(Self {
            heading: required(self.heading, "Heading")?,
            caption: required(self.caption, "Caption")?,
            hookline: required(self.hookline, "Hookline")?,
            cta: required(self.cta, "CTA")?,
            hashtags: normalize_list(self.hashtags),
            social: normalize_list(self.social),
        })
    }
}

/// A blank image URL means the post carries no image.
pub fn normalize_image_url(value: Option<String>) -> Option<String> {
    value.and_then(|url| {
        let trimmed = url.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn required(value: String, label: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{label} is required")));
    }
    Ok(trimmed.to_string())
}

fn normalize_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content() -> PostContent {
        PostContent {
            heading: "  Launch day ".into(),
            caption: "caption".into(),
            hookline: "hook".into(),
            cta: "Buy now".into(),
            hashtags: vec![" #rust ".into(), "".into(), "   ".into()],
            social: vec!["instagram".into(), " x ".into()],
        }
    }

    #[test]
    fn owner_posts_start_pending_only_with_an_image() {
        assert_eq!(PostStatus::initial(true), PostStatus::Pending);
        assert_eq!(PostStatus::initial(false), PostStatus::Draft);
    }

    #[test]
    fn removing_the_image_returns_to_draft() {
        let outcome = PostStatus::Approved.after_edit(true, false);
        assert_eq!(outcome.status, PostStatus::Draft);
        assert!(!outcome.clear_comment);

        let outcome = PostStatus::Rejected.after_edit(true, false);
        assert_eq!(outcome.status, PostStatus::Draft);
        assert!(outcome.clear_comment);
    }

    #[test]
    fn editing_a_rejected_post_resubmits_it() {
        let outcome = PostStatus::Rejected.after_edit(true, true);
        assert_eq!(
            outcome,
            EditOutcome {
                status: PostStatus::Pending,
                clear_comment: true
            }
        );
    }

    #[test]
    fn attaching_an_image_to_a_draft_submits_it() {
        let outcome = PostStatus::Draft.after_edit(false, true);
        assert_eq!(outcome.status, PostStatus::Pending);
    }

    #[test]
    fn text_edits_keep_the_current_status() {
        for status in [PostStatus::Pending, PostStatus::Approved] {
            let outcome = status.after_edit(true, true);
            assert_eq!(outcome.status, status);
            assert!(!outcome.clear_comment);
        }
    }

    #[test]
    fn review_only_accepts_pending_posts() {
        let err = PostStatus::Approved
            .review(ReviewDecision::Approve)
            .expect_err("approved posts cannot be reviewed");
        assert_eq!(
            err.to_string(),
            "Cannot update status. Post is currently \"approved\". Only pending posts can be approved or rejected."
        );
    }

    #[test]
    fn status_is_checked_before_the_comment() {
        let err = PostStatus::Draft
            .review(ReviewDecision::Reject { comment: None })
            .expect_err("drafts cannot be reviewed");
        assert_eq!(
            err,
            WorkflowError::NotPending {
                current: PostStatus::Draft
            }
        );

        let err = PostStatus::Pending
            .review(ReviewDecision::Reject {
                comment: Some("   ".into()),
            })
            .expect_err("blank comment");
        assert_eq!(err, WorkflowError::CommentRequired);
        assert_eq!(
            err.for_admin().to_string(),
            "A comment is required when rejecting a post"
        );
    }

    #[test]
    fn approval_clears_the_comment() {
        let outcome = PostStatus::Pending
            .review(ReviewDecision::Approve)
            .expect("approve");
        assert_eq!(outcome.status, PostStatus::Approved);
        assert_eq!(outcome.comment, None);
    }

    #[test]
    fn rejection_requires_a_comment() {
        let err = PostStatus::Pending
            .review(ReviewDecision::Reject {
                comment: Some("   ".into()),
            })
            .expect_err("blank comment");
        assert_eq!(err, WorkflowError::CommentRequired);

        let outcome = PostStatus::Pending
            .review(ReviewDecision::Reject {
                comment: Some("  too blurry ".into()),
            })
            .expect("reject");
        assert_eq!(outcome.status, PostStatus::Rejected);
        assert_eq!(outcome.comment.as_deref(), Some("too blurry"));
    }

    #[test]
    fn only_approved_posts_can_be_posted() {
        assert_eq!(PostStatus::Approved.mark_posted(), Ok(PostStatus::Posted));
        assert_eq!(
            PostStatus::Pending.mark_posted(),
            Err(WorkflowError::NotApproved {
                current: PostStatus::Pending
            })
        );
    }

    #[test]
    fn owners_cannot_touch_approved_or_posted_posts() {
        assert!(PostStatus::Rejected.ensure_owner_editable().is_ok());
        assert_eq!(
            PostStatus::Approved.ensure_owner_editable(),
            Err(WorkflowError::Locked {
                current: PostStatus::Approved
            })
        );
        assert_eq!(
            PostStatus::Posted.ensure_owner_editable(),
            Err(WorkflowError::Immutable)
        );
        assert_eq!(PostStatus::Posted.ensure_mutable(), Err(WorkflowError::Immutable));
    }

    #[test]
    fn normalisation_trims_fields_and_drops_empty_tags() {
        let normalized = content().normalized().expect("valid content");
        assert_eq!(normalized.heading, "Launch day");
        assert_eq!(normalized.hashtags, vec!["#rust".to_string()]);
        assert_eq!(normalized.social, vec!["instagram".to_string(), "x".to_string()]);
    }

    #[test]
    fn normalisation_rejects_blank_required_fields() {
        let mut blank = content();
        blank.cta = "  ".into();
        let err = blank.normalized().expect_err("blank cta");
        assert_eq!(err.to_string(), "CTA is required");
    }

    #[test]
    fn blank_image_urls_mean_no_image() {
        assert_eq!(normalize_image_url(Some("   ".into())), None);
        assert_eq!(
            normalize_image_url(Some(" /images/post-images/a.png ".into())).as_deref(),
            Some("/images/post-images/a.png")
        );
    }
}
