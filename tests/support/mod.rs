//! In-memory adapters and request helpers shared by the integration suites.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, header};
use bytes::Bytes;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

use postdesk::application::admin::posts::AdminPostService;
use postdesk::application::admin::users::AdminUserService;
use postdesk::application::auth::AuthService;
use postdesk::application::images::{ImageService, ImageSettings};
use postdesk::application::passwords::PasswordHasher;
use postdesk::application::repos::{
    BlobStore, CreatePostParams, CreateUserParams, HealthRepo, PostListScope, PostsRepo,
    PostsWriteRepo, RepoError, UpdatePostParams, UpdatePostStatusParams, UpdateUserParams,
    UsersRepo, UsersWriteRepo,
};
use postdesk::application::user_posts::UserPostService;
use postdesk::domain::entities::{
    PostFilter, PostRecord, PostStatusCounts, PostWithOwner, UserRecord, UserSummary,
};
use postdesk::domain::types::{PostStatus, Role};
use postdesk::infra::http::{AppState, LoginRateLimiter, SessionConfig, build_router};

pub const PASSWORD: &str = "password123";
pub const BODY_LIMIT: usize = 4 * 1024 * 1024;

/// A 1x1 PNG header; enough for dimension sniffing.
pub const TINY_PNG: [u8; 33] = [
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R',
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15,
    0xC4, 0x89,
];

#[derive(Default)]
pub struct MemoryRepo {
    users: Mutex<HashMap<Uuid, UserRecord>>,
    posts: Mutex<HashMap<Uuid, PostRecord>>,
}

impl MemoryRepo {
    pub async fn post_count(&self) -> usize {
        self.posts.lock().await.len()
    }
}

fn matches_filter(post: &PostRecord, filter: &PostFilter) -> bool {
    if let Some(status) = filter.status
        && post.status != status
    {
        return false;
    }
    if let Some(social) = filter.social.as_deref() {
        let needle = social.to_lowercase();
        if !post
            .social
            .iter()
            .any(|name| name.to_lowercase().contains(&needle))
        {
            return false;
        }
    }
    if let Some(search) = filter.search.as_deref() {
        let needle = search.to_lowercase();
        let haystack = [
            post.heading.as_str(),
            post.caption.as_str(),
            post.hookline.as_str(),
            post.cta.as_str(),
            post.hashtags.join(" ").as_str(),
        ]
        .join("\n")
        .to_lowercase();
        if !haystack.contains(&needle) {
            return false;
        }
    }
    true
}

#[async_trait]
impl UsersRepo for MemoryRepo {
    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>, RepoError> {
        let mut users: Vec<UserSummary> = self
            .users
            .lock()
            .await
            .values()
            .cloned()
            .map(UserSummary::from)
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }
}

#[async_trait]
impl UsersWriteRepo for MemoryRepo {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let mut users = self.users.lock().await;
        if users.values().any(|user| user.username == params.username) {
            return Err(RepoError::Duplicate {
                constraint: "users_username_key".into(),
            });
        }
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: params.username,
            role: params.role,
            password_hash: params.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_user(&self, params: UpdateUserParams) -> Result<UserRecord, RepoError> {
        let mut users = self.users.lock().await;
        let user = users.get_mut(&params.id).ok_or(RepoError::NotFound)?;
        if let Some(username) = params.username {
            user.username = username;
        }
        if let Some(role) = params.role {
            user.role = role;
        }
        Ok(user.clone())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), RepoError> {
        let mut users = self.users.lock().await;
        let user = users.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), RepoError> {
        if self.users.lock().await.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        self.posts.lock().await.retain(|_, post| post.user_id != id);
        Ok(())
    }
}

#[async_trait]
impl PostsRepo for MemoryRepo {
    async fn find_post(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.posts.lock().await.get(&id).cloned())
    }

    async fn list_posts(
        &self,
        scope: PostListScope,
        filter: &PostFilter,
    ) -> Result<Vec<PostWithOwner>, RepoError> {
        let users = self.users.lock().await;
        let posts = self.posts.lock().await;
        let mut entries: Vec<PostWithOwner> = posts
            .values()
            .filter(|post| match scope {
                PostListScope::All => true,
                PostListScope::Owner(owner) => post.user_id == owner,
                PostListScope::OwnerSubmitted(owner) => {
                    post.user_id == owner && post.status != PostStatus::Draft
                }
            })
            .filter(|post| matches_filter(post, filter))
            .map(|post| PostWithOwner {
                post: post.clone(),
                owner_username: users
                    .get(&post.user_id)
                    .map(|user| user.username.clone())
                    .unwrap_or_default(),
            })
            .collect();
        entries.sort_by(|a, b| {
            b.post
                .created_at
                .cmp(&a.post.created_at)
                .then(b.post.id.cmp(&a.post.id))
        });
        Ok(entries)
    }

    async fn count_posts_by_status(
        &self,
        owner: Option<Uuid>,
    ) -> Result<PostStatusCounts, RepoError> {
        let mut counts = PostStatusCounts::default();
        for post in self.posts.lock().await.values() {
            if owner.is_none_or(|owner| post.user_id == owner) {
                counts.add(post.status, 1);
            }
        }
        Ok(counts)
    }
}

/// Same compare-and-set contract as the Postgres adapter.
fn guarded(
    posts: &mut HashMap<Uuid, PostRecord>,
    id: Uuid,
    expected: PostStatus,
) -> Result<&mut PostRecord, RepoError> {
    posts
        .get_mut(&id)
        .filter(|post| post.status == expected)
        .ok_or_else(|| RepoError::stale_post(id, expected))
}

#[async_trait]
impl PostsWriteRepo for MemoryRepo {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        if !self.users.lock().await.contains_key(&params.user_id) {
            return Err(RepoError::Integrity {
                message: "posts_user_id_fkey".into(),
            });
        }
        let now = OffsetDateTime::now_utc();
        let content = params.content;
        let record = PostRecord {
            id: Uuid::new_v4(),
            user_id: params.user_id,
            heading: content.heading,
            caption: content.caption,
            hookline: content.hookline,
            cta: content.cta,
            hashtags: content.hashtags,
            social: content.social,
            image_url: params.image_url,
            status: params.status,
            comment: None,
            posted_at: None,
            created_at: now,
            updated_at: now,
        };
        self.posts.lock().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut posts = self.posts.lock().await;
        let post = guarded(&mut posts, params.id, params.expected_status)?;
        let content = params.content;
        post.heading = content.heading;
        post.caption = content.caption;
        post.hookline = content.hookline;
        post.cta = content.cta;
        post.hashtags = content.hashtags;
        post.social = content.social;
        post.image_url = params.image_url;
        post.status = params.status;
        post.comment = params.comment;
        post.updated_at = OffsetDateTime::now_utc();
        Ok(post.clone())
    }

    async fn update_post_status(
        &self,
        params: UpdatePostStatusParams,
    ) -> Result<PostRecord, RepoError> {
        let mut posts = self.posts.lock().await;
        let post = guarded(&mut posts, params.id, params.expected_status)?;
        post.status = params.status;
        post.comment = params.comment;
        if params.posted_at.is_some() {
            post.posted_at = params.posted_at;
        }
        post.updated_at = OffsetDateTime::now_utc();
        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        self.posts
            .lock()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl HealthRepo for MemoryRepo {
    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl MemoryBlobStore {
    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_object(&self, key: &str, data: Bytes) -> Result<(), RepoError> {
        let mut objects = self.objects.lock().await;
        if objects.contains_key(key) {
            return Err(RepoError::Duplicate {
                constraint: key.to_string(),
            });
        }
        objects.insert(key.to_string(), data);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Option<Bytes>, RepoError> {
        Ok(self.objects.lock().await.get(key).cloned())
    }

    async fn delete_object(&self, key: &str) -> Result<(), RepoError> {
        self.objects.lock().await.remove(key);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<MemoryRepo>,
    pub blobs: Arc<MemoryBlobStore>,
    pub admin: UserSummary,
    pub alice: UserSummary,
    pub bob: UserSummary,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_login_limit(100).await
    }

    /// `admin`, `alice` and `bob` exist, all with [`PASSWORD`].
    pub async fn with_login_limit(max_attempts: u32) -> Self {
        let repo = Arc::new(MemoryRepo::default());
        let blobs = Arc::new(MemoryBlobStore::default());

        let images = Arc::new(ImageService::new(
            blobs.clone(),
            ImageSettings {
                public_base_url: "/images".into(),
                bucket: "post-images".into(),
                max_bytes: 1024 * 1024,
            },
        ));
        let hasher = PasswordHasher::new(4);

        let auth = Arc::new(AuthService::new(repo.clone(), repo.clone(), hasher.clone()));
        let users = Arc::new(AdminUserService::new(
            repo.clone(),
            repo.clone(),
            repo.clone(),
            images.clone(),
            hasher,
            PASSWORD,
        ));
        let posts = Arc::new(AdminPostService::new(
            repo.clone(),
            repo.clone(),
            repo.clone(),
            images.clone(),
        ));
        let user_posts = Arc::new(UserPostService::new(
            repo.clone(),
            repo.clone(),
            images.clone(),
        ));

        let admin = users
            .create_user("admin", Role::Admin)
            .await
            .expect("seed admin");
        let alice = users
            .create_user("alice", Role::User)
            .await
            .expect("seed alice");
        let bob = users.create_user("bob", Role::User).await.expect("seed bob");

        let state = AppState {
            auth,
            users,
            posts,
            user_posts,
            images,
            health: repo.clone(),
            sessions: SessionConfig::new(
                "integration-test-secret-integration-test-secret",
                false,
                time::Duration::days(7),
            ),
            login_limiter: Arc::new(LoginRateLimiter::new(
                Duration::from_secs(300),
                max_attempts,
            )),
        };

        Self {
            router: build_router(state, BODY_LIMIT),
            repo,
            blobs,
            admin,
            alice,
            bob,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }

    /// Log in through the API and return the `name=value` cookie pair.
    pub async fn login(&self, username: &str) -> String {
        let response = self
            .send(json_request(
                "POST",
                "/api/auth/login",
                None,
                serde_json::json!({ "username": username, "password": PASSWORD }),
            ))
            .await;
        assert_eq!(response.status(), 200, "login as {username}");
        session_cookie(&response).expect("session cookie")
    }
}

pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("session="))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub fn json_request(
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub fn multipart_request(
    uri: &str,
    cookie: Option<&str>,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> Request<Body> {
    const BOUNDARY: &str = "postdesk-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).expect("request")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub fn post_body(heading: &str) -> serde_json::Value {
    serde_json::json!({
        "heading": heading,
        "caption": "Caption text",
        "hookline": "Hook",
        "cta": "Buy now",
        "hashtags": ["#launch", "#spring"],
        "social": ["Instagram", "LinkedIn"],
    })
}
