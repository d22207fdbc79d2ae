/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use clubify_api::{app::{build_router, AppState}, config::Config};
/// use clubify_shared::{db::pool::create_pool, mail};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.pool_config()).await?;
/// let mailer = mail::from_settings(&config.mail_settings())?;
///
/// let app = build_router(AppState::new(pool, config, mailer));
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:5001").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{identity::require_identity, security::SecurityHeadersLayer},
};
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use clubify_shared::{auth::identity::USER_ID_HEADER, mail::Mailer};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,

    /// Delivery for `/api/send-email`
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }
}

/// Builds the complete router with all routes and middleware
///
/// ```text
/// GET  /                              service banner (public)
/// GET  /health                        database connectivity (public)
/// /api
/// ├── POST /auth/signup               (public)
/// ├── POST /auth/login                (public)
/// ├── POST /init-default-club         (public)
/// ├── GET  /default-club-id           (public)
/// ├── GET  /test-auth
/// ├── GET  /users                     lead, board
/// ├── PUT  /users/:id                 board
/// ├── GET  /clubs  POST /clubs        POST: lead, board
/// ├── POST /clubs/:id/join
/// ├── GET  /tasks  POST /tasks        POST: lead, board
/// ├── PUT  /tasks/:id                 assignee or assigner
/// ├── GET  /events POST /events       POST: lead, board
/// ├── POST /events/:id/attend
/// ├── GET  /products POST /products   POST: lead, board
/// ├── GET  /sales  POST /sales        POST: lead, board
/// ├── GET  /proposals POST /proposals
/// ├── PUT  /proposals/:id/review      lead, board
/// ├── GET  /messages POST /messages
/// ├── PUT  /messages/:id/read         recipient
/// └── POST /send-email
/// ```
///
/// Everything under `/api` that is not marked public passes through the
/// identity middleware. Unknown paths get a JSON 404.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_api = Router::new()
        .route("/auth/signup", post(routes::auth::signup))
        .route("/auth/login", post(routes::auth::login))
        .route("/init-default-club", post(routes::clubs::init_default_club))
        .route("/default-club-id", get(routes::clubs::default_club_id));

    let protected_api = Router::new()
        .route("/test-auth", get(routes::auth::test_auth))
        .route("/users", get(routes::users::list_users))
        .route("/users/:id", put(routes::users::update_user))
        .route(
            "/clubs",
            get(routes::clubs::list_clubs).post(routes::clubs::create_club),
        )
        .route("/clubs/:id/join", post(routes::clubs::join_club))
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/tasks/:id", put(routes::tasks::update_task))
        .route(
            "/events",
            get(routes::events::list_events).post(routes::events::create_event),
        )
        .route("/events/:id/attend", post(routes::events::attend_event))
        .route(
            "/products",
            get(routes::products::list_products).post(routes::products::create_product),
        )
        .route(
            "/sales",
            get(routes::sales::list_sales).post(routes::sales::create_sale),
        )
        .route(
            "/proposals",
            get(routes::proposals::list_proposals).post(routes::proposals::create_proposal),
        )
        .route("/proposals/:id/review", put(routes::proposals::review_proposal))
        .route(
            "/messages",
            get(routes::messages::list_messages).post(routes::messages::send_message),
        )
        .route("/messages/:id/read", put(routes::messages::mark_read))
        .route("/send-email", post(routes::email::send_email))
        // route_layer: unmatched /api paths fall through to the 404 handler
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_identity,
        ));

    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .nest("/api", public_api.merge(protected_api))
        .fallback(routes::health::not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

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
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(USER_ID_HEADER),
        ])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
