use crate::application::auth::SessionUser;
use crate::application::error::{ErrorReport, HttpError};
use crate::domain::entities::{PostFilter, PostRecord, PostStatusCounts, PostWithOwner, UserSummary};
use crate::domain::types::{PostStatus, Role};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]/[month]/[day] [hour]:[minute] UTC");

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_error_response(viewer: Option<&SessionUser>, status: StatusCode, message: &str) -> Response {
    let content = ErrorPageView {
        status_code: status.as_u16(),
        title: status
            .canonical_reason()
            .unwrap_or("Something went wrong")
            .to_string(),
        message: message.to_string(),
        action: ErrorAction::for_viewer(viewer),
    };
    let view = LayoutContext::new(content.title.clone(), viewer, content);
    let mut response = render_template_response(ErrorTemplate { view }, status);
    ErrorReport::from_message(
        "presentation::views::render_error_response",
        status,
        message.to_string(),
    )
    .attach(&mut response);
    response
}

pub fn format_timestamp(time: OffsetDateTime) -> String {
    time.format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| time.unix_timestamp().to_string())
}

fn dashboard_href(role: Role) -> &'static str {
    match role {
        Role::Admin => "/dashboard/admin",
        Role::User => "/dashboard/user",
    }
}

#[derive(Clone)]
pub struct ViewerView {
    pub username: String,
    pub role: String,
    pub dashboard_href: String,
}

impl From<&SessionUser> for ViewerView {
    fn from(user: &SessionUser) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
            dashboard_href: dashboard_href(user.role).to_string(),
        }
    }
}

pub struct LayoutContext<T> {
    pub title: String,
    pub viewer: Option<ViewerView>,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(title: impl Into<String>, viewer: Option<&SessionUser>, content: T) -> Self {
        Self {
            title: title.into(),
            viewer: viewer.map(ViewerView::from),
            content,
        }
    }
}

// ----- login -----

pub struct LoginView {
    pub username: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub view: LayoutContext<LoginView>,
}

// ----- shared post widgets -----

#[derive(Clone)]
pub struct StatusCountView {
    pub key: String,
    pub label: String,
    pub count: u64,
}

pub fn status_count_views(counts: &PostStatusCounts) -> Vec<StatusCountView> {
    let mut views = vec![StatusCountView {
        key: "total".to_string(),
        label: "Total".to_string(),
        count: counts.total(),
    }];
    views.extend(PostStatus::ALL.iter().map(|status| StatusCountView {
        key: status.as_str().to_string(),
        label: status_label(*status).to_string(),
        count: counts.get(*status),
    }));
    views
}

pub fn status_label(status: PostStatus) -> &'static str {
    match status {
        PostStatus::Draft => "Draft",
        PostStatus::Pending => "Pending",
        PostStatus::Approved => "Approved",
        PostStatus::Rejected => "Rejected",
        PostStatus::Posted => "Posted",
    }
}

#[derive(Clone)]
pub struct StatusOptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Current list filter, echoed back into the filter form.
#[derive(Clone)]
pub struct FilterView {
    pub action: String,
    pub social: String,
    pub search: String,
    pub statuses: Vec<StatusOptionView>,
    pub is_active: bool,
}

impl FilterView {
    pub fn new(action: impl Into<String>, filter: &PostFilter, offered: &[PostStatus]) -> Self {
        Self {
            action: action.into(),
            social: filter.social.clone().unwrap_or_default(),
            search: filter.search.clone().unwrap_or_default(),
            statuses: offered
                .iter()
                .map(|status| StatusOptionView {
                    value: status.as_str().to_string(),
                    label: status_label(*status).to_string(),
                    selected: filter.status == Some(*status),
                })
                .collect(),
            is_active: filter != &PostFilter::default(),
        }
    }
}

#[derive(Clone)]
pub struct PostRowView {
    pub id: String,
    pub heading: String,
    pub caption: String,
    pub hookline: String,
    pub cta: String,
    pub hashtags: String,
    pub social: String,
    pub image_url: Option<String>,
    pub status_key: String,
    pub status_label: String,
    pub comment: Option<String>,
    pub owner: Option<String>,
    pub created: String,
    pub posted: Option<String>,
    pub can_review: bool,
    pub can_mark_posted: bool,
    pub can_edit: bool,
    pub is_admin: bool,
    pub api_base: String,
}

impl PostRowView {
    pub fn from_record(post: &PostRecord, owner: Option<&str>, viewer_role: Role) -> Self {
        let editable = match viewer_role {
            Role::Admin => post.status != PostStatus::Posted,
            Role::User => matches!(post.status, PostStatus::Draft | PostStatus::Pending),
        };
        Self {
            id: post.id.to_string(),
            heading: post.heading.clone(),
            caption: post.caption.clone(),
            hookline: post.hookline.clone(),
            cta: post.cta.clone(),
            hashtags: post.hashtags.join(" "),
            social: post.social.join(", "),
            image_url: post.image_url.clone(),
            status_key: post.status.as_str().to_string(),
            status_label: status_label(post.status).to_string(),
            comment: post.comment.clone(),
            owner: owner.map(str::to_string),
            created: format_timestamp(post.created_at),
            posted: post.posted_at.map(format_timestamp),
            can_review: post.status == PostStatus::Pending,
            can_mark_posted: viewer_role == Role::Admin && post.status == PostStatus::Approved,
            can_edit: editable,
            is_admin: viewer_role == Role::Admin,
            api_base: match viewer_role {
                Role::Admin => format!("/api/admin/posts/{}", post.id),
                Role::User => format!("/api/user/posts/{}", post.id),
            },
        }
    }

    pub fn from_entry(entry: &PostWithOwner) -> Self {
        Self::from_record(&entry.post, Some(&entry.owner_username), Role::Admin)
    }
}

#[derive(Clone)]
pub struct UserRowView {
    pub id: String,
    pub username: String,
    pub role: String,
    pub created: String,
    pub href: String,
}

impl From<&UserSummary> for UserRowView {
    fn from(user: &UserSummary) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
            created: format_timestamp(user.created_at),
            href: format!("/dashboard/admin/users/{}", user.id),
        }
    }
}

// ----- admin -----

pub struct AdminDashboardView {
    pub counts: Vec<StatusCountView>,
    pub users: Vec<UserRowView>,
    pub posts: Vec<PostRowView>,
    pub filter: FilterView,
}

impl AdminDashboardView {
    pub fn has_posts(&self) -> bool {
        !self.posts.is_empty()
    }
}

#[derive(Template)]
#[template(path = "admin_dashboard.html")]
pub struct AdminDashboardTemplate {
    pub view: LayoutContext<AdminDashboardView>,
}

pub struct AdminUserView {
    pub user: UserRowView,
    pub counts: Vec<StatusCountView>,
    pub posts: Vec<PostRowView>,
    pub filter: FilterView,
}

impl AdminUserView {
    pub fn has_posts(&self) -> bool {
        !self.posts.is_empty()
    }
}

#[derive(Template)]
#[template(path = "admin_user.html")]
pub struct AdminUserTemplate {
    pub view: LayoutContext<AdminUserView>,
}

// ----- user -----

pub struct UserDashboardView {
    pub counts: Vec<StatusCountView>,
    pub posts: Vec<PostRowView>,
    pub filter: FilterView,
}

impl UserDashboardView {
    pub fn has_posts(&self) -> bool {
        !self.posts.is_empty()
    }
}

#[derive(Template)]
#[template(path = "user_dashboard.html")]
pub struct UserDashboardTemplate {
    pub view: LayoutContext<UserDashboardView>,
}

// ----- errors -----

pub struct ErrorAction {
    pub href: String,
    pub label: String,
}

impl ErrorAction {
    fn for_viewer(viewer: Option<&SessionUser>) -> Self {
        match viewer {
            Some(user) => Self {
                href: dashboard_href(user.role).to_string(),
                label: "Back to dashboard".to_string(),
            },
            None => Self {
                href: "/login".to_string(),
                label: "Go to login".to_string(),
            },
        }
    }
}

pub struct ErrorPageView {
    pub status_code: u16,
    pub title: String,
    pub message: String,
    pub action: ErrorAction,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}
