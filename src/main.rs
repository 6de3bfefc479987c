use std::{process, sync::Arc, time::Duration};

use postdesk::{
    application::{
        admin::{posts::AdminPostService, users::AdminUserService},
        auth::AuthService,
        error::AppError,
        images::{ImageService, ImageSettings},
        passwords::PasswordHasher,
        repos::{BlobStore, HealthRepo, PostsRepo, PostsWriteRepo, UsersRepo, UsersWriteRepo},
        user_posts::UserPostService,
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AppState, LoginRateLimiter, SessionConfig},
        telemetry,
        uploads::UploadStorage,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use uuid::Uuid;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::CreateUser(args) => run_create_user(settings, args).await,
    }
}

struct Services {
    auth: Arc<AuthService>,
    users: Arc<AdminUserService>,
    posts: Arc<AdminPostService>,
    user_posts: Arc<UserPostService>,
    images: Arc<ImageService>,
    health: Arc<dyn HealthRepo>,
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let services = build_services(repositories, &settings)?;

    let session_secret = match settings.auth.session_secret.clone() {
        Some(secret) => secret,
        None => {
            warn!(
                target = "postdesk::startup",
                "auth.session_secret is not set; sessions will not survive a restart"
            );
            format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
        }
    };
    let max_age = time::Duration::try_from(settings.auth.session_max_age)
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;
    let sessions = SessionConfig::new(&session_secret, settings.auth.secure_cookies, max_age);

    let login_limiter = Arc::new(LoginRateLimiter::new(
        Duration::from_secs(settings.login_rate_limit.window_seconds.get().into()),
        settings.login_rate_limit.max_attempts.get(),
    ));

    let state = AppState {
        auth: services.auth,
        users: services.users,
        posts: services.posts,
        user_posts: services.user_posts,
        images: services.images,
        health: services.health,
        sessions,
        login_limiter,
    };

    serve_http(&settings, state).await
}

async fn run_create_user(
    settings: config::Settings,
    args: config::CreateUserArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let services = build_services(repositories, &settings)?;

    let user = services
        .users
        .create_user_with_password(&args.username, args.role, &args.password)
        .await?;

    info!(
        target = "postdesk::create_user",
        user_id = %user.id,
        username = %user.username,
        role = user.role.as_str(),
        "account created"
    );
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_services(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<Services, AppError> {
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let users_write_repo: Arc<dyn UsersWriteRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let health: Arc<dyn HealthRepo> = repositories;

    let upload_storage: Arc<dyn BlobStore> = Arc::new(
        UploadStorage::new(settings.uploads.directory.clone())
            .map_err(|err| AppError::from(InfraError::Io(err)))?,
    );
    let images = Arc::new(ImageService::new(
        upload_storage,
        ImageSettings {
            public_base_url: settings.uploads.public_base_url.clone(),
            bucket: settings.uploads.bucket.clone(),
            max_bytes: settings.uploads.max_image_bytes.get(),
        },
    ));

    let hasher = PasswordHasher::new(settings.auth.bcrypt_cost);

    let auth = Arc::new(AuthService::new(
        users_repo.clone(),
        users_write_repo.clone(),
        hasher.clone(),
    ));
    let users = Arc::new(AdminUserService::new(
        users_repo.clone(),
        users_write_repo,
        posts_repo.clone(),
        images.clone(),
        hasher,
        settings.auth.default_password.clone(),
    ));
    let posts = Arc::new(AdminPostService::new(
        posts_repo.clone(),
        posts_write_repo.clone(),
        users_repo,
        images.clone(),
    ));
    let user_posts = Arc::new(UserPostService::new(
        posts_repo,
        posts_write_repo,
        images.clone(),
    ));

    Ok(Services {
        auth,
        users,
        posts,
        user_posts,
        images,
        health,
    })
}

async fn serve_http(settings: &config::Settings, state: AppState) -> Result<(), AppError> {
    let body_limit = usize::try_from(settings.uploads.max_request_bytes.get())
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;
    let router = http::build_router(state, body_limit);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "postdesk::startup",
        addr = %settings.server.addr,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}
