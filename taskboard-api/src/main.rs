//! # Taskboard API Server
//!
//! Kanban board service: users, boards with members, ordered columns and
//! ordered cards.
//!
//! Boards, columns and cards are kept in PostgreSQL when `DATABASE_URL` is
//! set. Without it the server runs on the in-memory store, which is lost
//! on restart.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=... DATABASE_URL=postgresql://localhost/taskboard cargo run -p taskboard-api
//! ```

use std::sync::Arc;
use taskboard_api::{app, config::Config};
use taskboard_shared::{
    db::{migrations::run_migrations, pool},
    store::{BoardStore, MemoryStore, PgStore},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "taskboard_api=debug,taskboard_shared=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Taskboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let store: Arc<dyn BoardStore> = match &config.database {
        Some(database) => {
            let mut db_config = pool::DatabaseConfig::new(database.url.clone());
            db_config.max_connections = database.max_connections;

            let pool = pool::create_pool(db_config).await?;
            run_migrations(&pool).await?;
            tracing::info!("Using PostgreSQL store");

            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let bind_address = config.bind_address();
    let router = app::build_router(app::AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
