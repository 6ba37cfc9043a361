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
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = taskboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use taskboard_shared::{auth::middleware::authenticate, services::TaskBoard, store::BoardStore};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Component services over the configured store
    pub services: TaskBoard,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn BoardStore>, config: Config) -> Self {
        Self {
            services: TaskBoard::new(store, config.jwt.secret.clone()),
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                      # public
/// ├── /auth/
/// │   ├── POST /register                # public
/// │   ├── POST /login                   # public
/// │   ├── POST /refresh                 # public
/// │   └── POST /profile
/// ├── /boards/
/// │   ├── POST   /          GET /
/// │   ├── GET    /:id       PATCH /:id       DELETE /:id
/// │   ├── POST   /:id/members
/// │   └── DELETE /:id/members/:member_id
/// ├── /columns/
/// │   ├── POST   /          GET /board/:board_id
/// │   ├── GET    /:id       PATCH /:id       DELETE /:id
/// │   └── PATCH  /:id/reorder
/// └── /cards/
///     ├── POST   /          GET /column/:column_id    GET /board/:board_id
///     ├── GET    /:id       PATCH /:id       DELETE /:id
///     ├── POST   /:id/move
///     ├── POST   /:id/watchers              DELETE /:id/watchers/:watcher_id
///     ├── POST   /:id/assign/:assignee_id
///     └── PATCH  /:id/progress/:progress
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (everything except health, register, login, refresh)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes; only the profile needs a token
    let auth_routes = Router::new()
        .route("/profile", post(routes::auth::profile))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_layer))
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let board_routes = Router::new()
        .route(
            "/",
            post(routes::boards::create_board).get(routes::boards::list_boards),
        )
        .route(
            "/:id",
            get(routes::boards::get_board)
                .patch(routes::boards::update_board)
                .delete(routes::boards::delete_board),
        )
        .route("/:id/members", post(routes::boards::add_member))
        .route(
            "/:id/members/:member_id",
            delete(routes::boards::remove_member),
        );

    let column_routes = Router::new()
        .route("/", post(routes::columns::create_column))
        .route("/board/:board_id", get(routes::columns::list_board_columns))
        .route(
            "/:id",
            get(routes::columns::get_column)
                .patch(routes::columns::update_column)
                .delete(routes::columns::delete_column),
        )
        .route("/:id/reorder", patch(routes::columns::reorder_column));

    let card_routes = Router::new()
        .route("/", post(routes::cards::create_card))
        .route("/column/:column_id", get(routes::cards::list_column_cards))
        .route("/board/:board_id", get(routes::cards::list_board_cards))
        .route(
            "/:id",
            get(routes::cards::get_card)
                .patch(routes::cards::update_card)
                .delete(routes::cards::delete_card),
        )
        .route("/:id/move", post(routes::cards::move_card))
        .route("/:id/watchers", post(routes::cards::add_watcher))
        .route(
            "/:id/watchers/:watcher_id",
            delete(routes::cards::remove_watcher),
        )
        .route(
            "/:id/assign/:assignee_id",
            post(routes::cards::assign_card),
        )
        .route(
            "/:id/progress/:progress",
            patch(routes::cards::update_progress),
        );

    // Board, column and card routes all require JWT authentication
    let protected_routes = Router::new()
        .nest("/boards", board_routes)
        .nest("/columns", column_routes)
        .nest("/cards", card_routes)
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
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
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/auth", auth_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer token and injects the caller's `AuthContext` into
/// request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?;
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
