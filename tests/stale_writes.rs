mod support;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use postdesk::application::admin::posts::{
    AdminPostService, UpdatePostCommand, UpdatePostStatusCommand,
};
use postdesk::application::images::{ImageService, ImageSettings};
use postdesk::application::posts::{PostPatch, PostWorkflowError};
use postdesk::application::repos::{
    CreatePostParams, PostListScope, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
    UpdatePostStatusParams,
};
use postdesk::domain::entities::{
    PostContent, PostFilter, PostRecord, PostStatusCounts, PostWithOwner,
};
use postdesk::domain::types::{PostStatus, ReviewDecision};

use support::{MemoryBlobStore, MemoryRepo, TestApp};

/// Serves the post as it was when captured, like a request that read it
/// just before another request changed it.
struct SnapshotReader {
    inner: Arc<MemoryRepo>,
    snapshot: PostRecord,
}

#[async_trait]
impl PostsRepo for SnapshotReader {
    async fn find_post(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        if id == self.snapshot.id {
            return Ok(Some(self.snapshot.clone()));
        }
        self.inner.find_post(id).await
    }

    async fn list_posts(
        &self,
        scope: PostListScope,
        filter: &PostFilter,
    ) -> Result<Vec<PostWithOwner>, RepoError> {
        self.inner.list_posts(scope, filter).await
    }

    async fn count_posts_by_status(
        &self,
        owner: Option<Uuid>,
    ) -> Result<PostStatusCounts, RepoError> {
        self.inner.count_posts_by_status(owner).await
    }
}

fn content(heading: &str) -> PostContent {
    PostContent {
        heading: heading.to_string(),
        caption: "caption".to_string(),
        hookline: "hook".to_string(),
        cta: "Shop now".to_string(),
        hashtags: vec!["#launch".to_string()],
        social: vec!["instagram".to_string()],
    }
}

async fn seed(app: &TestApp, status: PostStatus) -> PostRecord {
    app.repo
        .create_post(CreatePostParams {
            user_id: app.alice.id,
            content: content("Original"),
            image_url: Some("/images/post-images/a.png".to_string()),
            status,
        })
        .await
        .expect("seed post")
}

fn service_reading(app: &TestApp, snapshot: PostRecord) -> AdminPostService {
    let reader = Arc::new(SnapshotReader {
        inner: app.repo.clone(),
        snapshot,
    });
    let images = Arc::new(ImageService::new(
        Arc::new(MemoryBlobStore::default()),
        ImageSettings {
            public_base_url: "/images".into(),
            bucket: "post-images".into(),
            max_bytes: 1024 * 1024,
        },
    ));
    AdminPostService::new(reader, app.repo.clone(), app.repo.clone(), images)
}

#[tokio::test]
async fn writes_against_a_changed_status_are_rejected() {
    let app = TestApp::new().await;
    let post = seed(&app, PostStatus::Approved).await;

    app.repo
        .update_post_status(UpdatePostStatusParams {
            id: post.id,
            expected_status: PostStatus::Approved,
            status: PostStatus::Posted,
            comment: None,
            posted_at: Some(time::OffsetDateTime::now_utc()),
        })
        .await
        .expect("mark posted");

    let err = app
        .repo
        .update_post(UpdatePostParams {
            id: post.id,
            expected_status: PostStatus::Approved,
            content: content("Edited"),
            image_url: None,
            status: PostStatus::Draft,
            comment: None,
        })
        .await
        .expect_err("stale edit");
    assert!(matches!(err, RepoError::Conflict { .. }), "{err:?}");

    let stored = app.repo.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PostStatus::Posted);
    assert_eq!(stored.heading, "Original");
    assert!(stored.posted_at.is_some());
}

#[tokio::test]
async fn admin_edit_racing_mark_posted_keeps_the_post_frozen() {
    let app = TestApp::new().await;
    let approved = seed(&app, PostStatus::Approved).await;
    let service = service_reading(&app, approved.clone());

    // Another request publishes the post after ours loaded it.
    app.repo
        .update_post_status(UpdatePostStatusParams {
            id: approved.id,
            expected_status: PostStatus::Approved,
            status: PostStatus::Posted,
            comment: None,
            posted_at: Some(time::OffsetDateTime::now_utc()),
        })
        .await
        .expect("mark posted");

    let err = service
        .update_post(UpdatePostCommand {
            id: approved.id,
            patch: PostPatch {
                heading: Some("Edited".to_string()),
                ..PostPatch::default()
            },
        })
        .await
        .expect_err("edit after publish");
    assert!(
        matches!(err, PostWorkflowError::Repo(RepoError::Conflict { .. })),
        "{err:?}"
    );

    let stored = app.repo.find_post(approved.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PostStatus::Posted);
    assert_eq!(stored.heading, "Original");
    assert!(stored.posted_at.is_some());
}

#[tokio::test]
async fn review_racing_another_review_loses() {
    let app = TestApp::new().await;
    let pending = seed(&app, PostStatus::Pending).await;
    let service = service_reading(&app, pending.clone());

    // The owner approves first.
    app.repo
        .update_post_status(UpdatePostStatusParams {
            id: pending.id,
            expected_status: PostStatus::Pending,
            status: PostStatus::Approved,
            comment: None,
            posted_at: None,
        })
        .await
        .expect("approve");

    let err = service
        .update_post_status(UpdatePostStatusCommand {
            id: pending.id,
            decision: ReviewDecision::Reject {
                comment: Some("Too late".to_string()),
            },
        })
        .await
        .expect_err("stale rejection");
    assert!(
        matches!(err, PostWorkflowError::Repo(RepoError::Conflict { .. })),
        "{err:?}"
    );

    let stored = app.repo.find_post(pending.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PostStatus::Approved);
    assert_eq!(stored.comment, None);
}
