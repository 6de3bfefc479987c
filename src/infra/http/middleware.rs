use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::auth::SessionUser;
use crate::application::error::{ErrorReport, HttpError};
use crate::domain::types::Role;

use super::api::error::ApiError;
use super::api::handlers::auth_to_api;
use super::state::AppState;

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

/// What a path requires of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    /// JSON endpoints: 401 without a session, 403 for the wrong role.
    Api(Option<Role>),
    /// HTML pages: anything but the right role goes back to `/login`.
    Page(Role),
}

fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn access_for(path: &str) -> Option<Access> {
    if under(path, "/api/admin") {
        Some(Access::Api(Some(Role::Admin)))
    } else if under(path, "/api/user") {
        Some(Access::Api(Some(Role::User)))
    } else if under(path, "/api/auth/me")
        || under(path, "/api/auth/password")
        || under(path, "/api/upload")
    {
        Some(Access::Api(None))
    } else if under(path, "/dashboard/admin") {
        Some(Access::Page(Role::Admin))
    } else if under(path, "/dashboard/user") {
        Some(Access::Page(Role::User))
    } else {
        None
    }
}

/// Gate protected routes on the signed session and expose the
/// [`SessionUser`] to handlers through request extensions.
///
/// The cookie only names the account; role and username come from the stored
/// user, so deleted or demoted accounts lose access on their next request.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    const SOURCE: &str = "infra::http::middleware::require_session";

    let Some(access) = access_for(request.uri().path()) else {
        return next.run(request).await;
    };

    let user = match state.sessions.from_headers(request.headers()) {
        Some(session) => match state.auth.resolve_session(&session).await {
            Ok(user) => user,
            Err(err) => {
                error!(
                    target = SOURCE,
                    user_id = %session.id,
                    error = %err,
                    "failed to resolve session"
                );
                return match access {
                    Access::Api(_) => auth_to_api(err).into_response(),
                    Access::Page(_) => HttpError::from_error(
                        SOURCE,
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Failed to load session",
                        &err,
                    )
                    .into_response(),
                };
            }
        },
        None => None,
    };

    match (access, user) {
        (Access::Api(_), None) => ApiError::unauthorized().into_response(),
        (Access::Api(Some(role)), Some(user)) if user.role != role => {
            ApiError::forbidden(format!("This action requires the {role} role")).into_response()
        }
        (Access::Page(role), Some(user)) if user.role == role => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        (Access::Page(_), _) => Redirect::to("/login").into_response(),
        (Access::Api(_), Some(user)) => {
            request.extensions_mut().insert::<SessionUser>(user);
            next.run(request).await
        }
    }
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "postdesk::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                "request failed",
            );
        } else {
            warn!(
                target = "postdesk::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                "client request error",
            );
        }
    }

    response
}
