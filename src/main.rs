mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;

use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::middleware::{BranchCookieConfig, BranchCookieLayer};
use crate::services::TelegramNotifier;

/// Application state shared across all handlers
pub struct AppState {
    pub db: Database,
    pub notifier: TelegramNotifier,
    pub config: Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let db = Database::connect(&config.database_url).await?;
    db.run_migrations().await?;
    tracing::info!("Database initialized");

    // Initialize the chat-bot notifier
    let notifier = TelegramNotifier::new(&config.telegram);
    if notifier.is_configured() {
        tracing::info!("Order notifications enabled");
    } else {
        tracing::warn!("Telegram credentials not set - order notifications are disabled");
    }

    // Create shared application state
    let state = Arc::new(AppState {
        db,
        notifier,
        config: config.clone(),
    });

    // Persist ?city= selections into the branch cookie
    let branch_cookie_config = BranchCookieConfig {
        cookie_days: config.cookie_days,
        ..Default::default()
    };

    // Build router
    let app = Router::new()
        .route("/health", get(routes::health))
        // Branch routes
        .route("/branches", get(routes::branches::index))
        .route("/branches/select", post(routes::branches::select))
        // Catalog routes
        .route("/catalog", get(routes::catalog::index))
        .route("/products/:id", get(routes::catalog::show))
        // Cart routes
        .route("/cart", get(routes::cart::show))
        .route("/cart/items", post(routes::cart::add))
        .route("/cart/items/:id", patch(routes::cart::update_item))
        .route("/cart/items/:id", delete(routes::cart::remove_item))
        // Checkout
        .route("/checkout", post(routes::checkout::create))
        // Auth routes
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/verify", post(routes::auth::verify))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/me", get(routes::auth::me))
        .route("/auth/profile", patch(routes::auth::update_profile))
        // Middleware
        .layer(BranchCookieLayer::new(branch_cookie_config))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
