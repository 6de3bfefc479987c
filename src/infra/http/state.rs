use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use crate::application::admin::posts::AdminPostService;
use crate::application::admin::users::AdminUserService;
use crate::application::auth::AuthService;
use crate::application::images::ImageService;
use crate::application::repos::HealthRepo;
use crate::application::user_posts::UserPostService;

use super::api::rate_limit::LoginRateLimiter;
use super::session::SessionConfig;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<AdminUserService>,
    pub posts: Arc<AdminPostService>,
    pub user_posts: Arc<UserPostService>,
    pub images: Arc<ImageService>,
    pub health: Arc<dyn HealthRepo>,
    pub sessions: SessionConfig,
    pub login_limiter: Arc<LoginRateLimiter>,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.key().clone()
    }
}
