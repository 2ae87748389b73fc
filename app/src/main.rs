use axum::{Router, middleware, routing::{get, post}};
use clap::Parser;
use common::{AppState, Config, auth::auth_middleware};
use database::Database;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod handlers;

use handlers::auth::{login_get, login_post, logout, root_redirect};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; real env vars and CLI flags still apply.
    let _ = dotenvy::dotenv();

    // 1. Initialize Logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Load Config from CLI args and environment
    let config = Config::parse();

    // 3. Initialize Database
    let db = Database::new(&config.database_url).await?;
    db.run_migrations().await?;

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
    });

    // 4. Session Store
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false); // Set to true in production with HTTPS

    // 5. Routing
    let protected_routes = Router::<Arc<AppState>>::new()
        .route("/", get(root_redirect))
        .nest("/groups", groups::handler::groups_router(state.clone()))
        .nest("/expenses", expenses::handler::expenses_router(state.clone()))
        .nest("/balances", balances::handler::balances_router(state.clone()))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let app = Router::<Arc<AppState>>::new()
        .route("/login", get(login_get).post(login_post))
        .route("/logout", post(logout))
        .merge(protected_routes)
        .with_state(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http());

    // 6. Start Server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(owner = %config.owner_name, "Listening on {}", addr);
    if config.app_password.is_none() {
        tracing::warn!("APP_PASSWORD is not set! Authentication is DISABLED.");
    }
    axum::serve(listener, app).await?;

    Ok(())
}
