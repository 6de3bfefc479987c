//! Session handlers

use axum::Json;
use axum::extract::{Extension, State};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::SignedCookieJar;
use metrics::counter;
use tracing::warn;

use crate::application::auth::{AuthError, SessionUser};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{
    ChangePasswordRequest, LoginRequest, MessageResponse, SessionResponse,
};
use crate::infra::http::state::AppState;

use super::auth_to_api;

pub(crate) enum LoginFailure {
    Throttled { retry_after: u64 },
    Rejected(AuthError),
}

/// Throttle by username, then check the credentials.
pub(crate) async fn attempt_login(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<SessionUser, LoginFailure> {
    if !username.trim().is_empty() {
        let (allowed, _) = state.login_limiter.allow(username);
        if !allowed {
            counter!("postdesk_login_throttled_total").increment(1);
            warn!(
                target = "postdesk::auth",
                username = %username.trim(),
                "login throttled"
            );
            return Err(LoginFailure::Throttled {
                retry_after: state.login_limiter.retry_after_secs(),
            });
        }
    }

    state
        .auth
        .login(username, password)
        .await
        .map_err(LoginFailure::Rejected)
}

pub(crate) fn session_cookie_error(err: serde_json::Error) -> ApiError {
    ApiError::internal(format!("failed to encode session: {err}"))
}

pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let user = match attempt_login(&state, &payload.username, &payload.password).await {
        Ok(user) => user,
        Err(LoginFailure::Throttled { retry_after }) => {
            return Ok(ApiError::rate_limited(retry_after));
        }
        Err(LoginFailure::Rejected(err)) => return Err(auth_to_api(err)),
    };

    let jar = state
        .sessions
        .issue(jar, &user)
        .map_err(session_cookie_error)?;

    Ok((jar, Json(SessionResponse::from(&user))).into_response())
}

pub async fn logout(State(state): State<AppState>, jar: SignedCookieJar) -> impl IntoResponse {
    (
        state.sessions.clear(jar),
        Json(MessageResponse::new("Logged out")),
    )
}

pub async fn me(Extension(user): Extension<SessionUser>) -> Json<SessionResponse> {
    Json(SessionResponse::from(&user))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .auth
        .change_password(user.id, &payload.current_password, &payload.new_password)
        .await
        .map_err(auth_to_api)?;

    Ok(Json(MessageResponse::new("Password updated successfully")))
}
