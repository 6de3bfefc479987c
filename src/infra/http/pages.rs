//! Server-rendered login and dashboard pages.

use axum::{
    Form,
    extract::{Extension, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;
use uuid::Uuid;

use crate::application::admin::users::AdminUserError;
use crate::application::auth::{AuthError, SessionUser};
use crate::application::error::HttpError;
use crate::application::posts::PostWorkflowError;
use crate::domain::entities::{PostFilter, PostRecord};
use crate::domain::types::{PostStatus, Role};
use crate::presentation::views::{
    AdminDashboardTemplate, AdminDashboardView, AdminUserTemplate, AdminUserView, FilterView,
    LayoutContext, LoginTemplate, LoginView, PostRowView, UserDashboardTemplate,
    UserDashboardView, UserRowView, render_error_response, render_template_response,
    status_count_views,
};

use super::api::handlers::{LoginFailure, PostListQuery, attempt_login};
use super::repo_error_to_http;
use super::state::AppState;

const USER_VISIBLE_STATUSES: [PostStatus; 4] = [
    PostStatus::Pending,
    PostStatus::Approved,
    PostStatus::Rejected,
    PostStatus::Posted,
];

#[derive(Debug, Default, Deserialize)]
pub(super) struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

fn dashboard_redirect(role: Role) -> Redirect {
    match role {
        Role::Admin => Redirect::to("/dashboard/admin"),
        Role::User => Redirect::to("/dashboard/user"),
    }
}

fn login_page(username: String, error: Option<String>, status: StatusCode) -> Response {
    let view = LayoutContext::new("Sign in", None, LoginView { username, error });
    render_template_response(LoginTemplate { view }, status)
}

pub(super) async fn index(State(state): State<AppState>, headers: HeaderMap) -> Redirect {
    match state.sessions.from_headers(&headers) {
        Some(user) => dashboard_redirect(user.role),
        None => Redirect::to("/login"),
    }
}

pub(super) async fn login_form(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(user) = state.sessions.from_headers(&headers) {
        return dashboard_redirect(user.role).into_response();
    }
    login_page(String::new(), None, StatusCode::OK)
}

pub(super) async fn login_submit(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    const SOURCE: &str = "infra::http::pages::login_submit";

    let user = match attempt_login(&state, &form.username, &form.password).await {
        Ok(user) => user,
        Err(LoginFailure::Throttled { retry_after }) => {
            return login_page(
                form.username,
                Some(format!(
                    "Too many login attempts. Try again in {retry_after} seconds."
                )),
                StatusCode::TOO_MANY_REQUESTS,
            );
        }
        Err(LoginFailure::Rejected(
            err @ (AuthError::MissingCredentials | AuthError::InvalidCredentials),
        )) => {
            let status = match err {
                AuthError::MissingCredentials => StatusCode::BAD_REQUEST,
                _ => StatusCode::UNAUTHORIZED,
            };
            return login_page(form.username, Some(err.to_string()), status);
        }
        Err(LoginFailure::Rejected(err)) => {
            return HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed",
                &err,
            )
            .into_response();
        }
    };

    match state.sessions.issue(jar, &user) {
        Ok(jar) => (jar, dashboard_redirect(user.role)).into_response(),
        Err(err) => HttpError::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Login failed",
            &err,
        )
        .into_response(),
    }
}

pub(super) async fn logout(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    (state.sessions.clear(jar), Redirect::to("/login")).into_response()
}

pub(super) async fn admin_dashboard(
    State(state): State<AppState>,
    Extension(viewer): Extension<SessionUser>,
    Query(query): Query<PostListQuery>,
) -> Response {
    const SOURCE: &str = "infra::http::pages::admin_dashboard";
    let filter = query.into_filter();

    let counts = match state.posts.status_counts(None).await {
        Ok(counts) => counts,
        Err(err) => return repo_error_to_http(SOURCE, err).into_response(),
    };
    let users = match state.users.list_users().await {
        Ok(users) => users,
        Err(err) => return users_error_to_http(SOURCE, err).into_response(),
    };
    let posts = match state.posts.list_all_posts(&filter).await {
        Ok(posts) => posts,
        Err(err) => return repo_error_to_http(SOURCE, err).into_response(),
    };

    let content = AdminDashboardView {
        counts: status_count_views(&counts),
        users: users.iter().map(UserRowView::from).collect(),
        posts: posts.iter().map(PostRowView::from_entry).collect(),
        filter: FilterView::new("/dashboard/admin", &filter, &PostStatus::ALL),
    };
    let view = LayoutContext::new("Admin dashboard", Some(&viewer), content);
    render_template_response(AdminDashboardTemplate { view }, StatusCode::OK)
}

pub(super) async fn admin_user_detail(
    State(state): State<AppState>,
    Extension(viewer): Extension<SessionUser>,
    Path(id): Path<Uuid>,
    Query(query): Query<PostListQuery>,
) -> Response {
    const SOURCE: &str = "infra::http::pages::admin_user_detail";
    let filter = query.into_filter();

    let user = match state.users.get_user(id).await {
        Ok(user) => user,
        Err(AdminUserError::NotFound) => {
            return render_error_response(Some(&viewer), StatusCode::NOT_FOUND, "User not found");
        }
        Err(err) => return users_error_to_http(SOURCE, err).into_response(),
    };
    let counts = match state.posts.status_counts(Some(id)).await {
        Ok(counts) => counts,
        Err(err) => return repo_error_to_http(SOURCE, err).into_response(),
    };
    let posts = match state.posts.list_posts_by_user(id, &filter).await {
        Ok(posts) => posts,
        Err(err) => return posts_error_to_http(SOURCE, err).into_response(),
    };

    let action = format!("/dashboard/admin/users/{id}");
    let content = AdminUserView {
        user: UserRowView::from(&user),
        counts: status_count_views(&counts),
        posts: rows(&posts, Role::Admin),
        filter: FilterView::new(action, &filter, &PostStatus::ALL),
    };
    let view = LayoutContext::new(user.username.clone(), Some(&viewer), content);
    render_template_response(AdminUserTemplate { view }, StatusCode::OK)
}

pub(super) async fn user_dashboard(
    State(state): State<AppState>,
    Extension(viewer): Extension<SessionUser>,
    Query(query): Query<PostListQuery>,
) -> Response {
    const SOURCE: &str = "infra::http::pages::user_dashboard";
    let filter: PostFilter = query.into_filter();

    let counts = match state.user_posts.own_status_counts(&viewer).await {
        Ok(counts) => counts,
        Err(err) => return repo_error_to_http(SOURCE, err).into_response(),
    };
    let posts = match state.user_posts.list_own_posts(&viewer, &filter).await {
        Ok(posts) => posts,
        Err(err) => return repo_error_to_http(SOURCE, err).into_response(),
    };

    let content = UserDashboardView {
        counts: status_count_views(&counts),
        posts: rows(&posts, Role::User),
        filter: FilterView::new("/dashboard/user", &filter, &USER_VISIBLE_STATUSES),
    };
    let view = LayoutContext::new("My posts", Some(&viewer), content);
    render_template_response(UserDashboardTemplate { view }, StatusCode::OK)
}

fn rows(posts: &[PostRecord], viewer_role: Role) -> Vec<PostRowView> {
    posts
        .iter()
        .map(|post| PostRowView::from_record(post, None, viewer_role))
        .collect()
}

fn users_error_to_http(source: &'static str, err: AdminUserError) -> HttpError {
    match err {
        AdminUserError::Repo(repo) => repo_error_to_http(source, repo),
        other => HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load users",
            &other,
        ),
    }
}

fn posts_error_to_http(source: &'static str, err: PostWorkflowError) -> HttpError {
    match err {
        PostWorkflowError::Repo(repo) => repo_error_to_http(source, repo),
        PostWorkflowError::OwnerNotFound | PostWorkflowError::NotFound => HttpError::new(
            source,
            StatusCode::NOT_FOUND,
            err.to_string(),
            err.to_string(),
        ),
        other => HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load posts",
            &other,
        ),
    }
}
