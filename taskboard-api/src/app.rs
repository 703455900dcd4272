/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_api::{app::AppState, config::Config};
/// use taskboard_shared::store::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let state = AppState::new(Arc::new(MemoryStore::new()), Config::default());
/// let app = taskboard_api::app::build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use taskboard_shared::service::{TaskService, UserService};
use taskboard_shared::store::Store;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Document store shared by both services
    pub store: Arc<dyn Store>,

    /// User endpoint sequences
    pub users: UserService,

    /// Task endpoint sequences
    pub tasks: TaskService,

    /// Application configuration
    pub config: Arc<Config>,

    /// Process start, for the uptime report
    pub started_at: Instant,
}

impl AppState {
    /// Creates new application state over `store`
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            users: UserService::new(store.clone()),
            tasks: TaskService::new(store.clone()),
            store,
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /healthz                 # Health check
/// └── /api/
///     ├── GET    /                 # Liveness + uptime
///     ├── /users
///     │   ├── GET    /             # List or count
///     │   ├── POST   /             # Create
///     │   ├── GET    /:id
///     │   ├── PUT    /:id          # Replace
///     │   └── DELETE /:id
///     └── /tasks                   # Same shape as /users
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let user_routes = Router::new()
        .route(
            "/",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        );

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        );

    let api_routes = Router::new()
        .route("/", get(routes::health::api_root))
        .nest("/users", user_routes)
        .nest("/tasks", task_routes);

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/healthz", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Configures CORS from `CORS_ORIGINS`
fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allows_any() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600))
}
