//! ADS Framework Automation Platform
//!
//! Detection engineering management backend. Users register and log in, then
//! author detection rules that walk through the nine-stage ADS workflow
//! (goal through response), with all state held in PostgreSQL.

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;

use axum::{
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "ads_platform=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("ADS Platform server starting...");
    tracing::info!("Database: {}", config.database_url.split('@').last().unwrap_or("***"));

    // Initialize database pool
    let pool = db::create_pool(&config.database_url).await
        .expect("Failed to create database pool");

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool).await
        .expect("Failed to run migrations");

    let port = config.port;

    // Build application state
    let state = AppState {
        pool,
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await
        .expect("Failed to bind listen address");
    axum::serve(listener, app).await
        .expect("Server error");
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let cors_origin = state.config.cors_origin
        .parse::<HeaderValue>()
        .expect("CORS_ORIGIN is not a valid origin");

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login));

    // Detection rule routes (user JWT auth)
    let rule_routes = Router::new()
        .route("/detection-rules", post(handlers::rules::create))
        .route("/detection-rules", get(handlers::rules::list))
        .route("/detection-rules/:id", get(handlers::rules::get))
        .route("/detection-rules/:id", put(handlers::rules::update))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_user_auth,
        ));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .merge(rule_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(cors_origin)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
