//! chat-gateway HTTP server binary.
//!
//! # Environment Variables
//!
//! - `PORT` — HTTP port (default: 9000)
//! - `DEEPSEEK_API_KEY` — upstream credential
//! - `DEEPSEEK_API_URL` — upstream chat-completions URL
//! - `DATABASE_URL` — data store probed at startup (fallback: `MONGODB_URI`)
//! - `APP_ENV` — `development` returns error details to callers (fallback: `NODE_ENV`)
//! - `RUST_LOG` — Tracing filter (default: "info,chat_gateway=debug")
//!
//! # Usage
//!
//! ```bash
//! DEEPSEEK_API_KEY=sk-... cargo run --bin server
//! ```

use anyhow::Context;
use chat_gateway::config::AppConfig;
use chat_gateway::datastore;
use chat_gateway::server::{app_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chat_gateway=debug".into()),
        )
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    if let Some(ref database_url) = config.database_url {
        tracing::info!("Checking data store...");
        match datastore::probe(database_url, datastore::PROBE_TIMEOUT).await {
            Ok(addr) => tracing::info!("Data store reachable at {}", addr),
            Err(e) => {
                tracing::error!("Data store connection failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let state = AppState::from_config(&config);
    let app = app_router(state);
    let bind_addr = config.bind_addr();

    tracing::info!("chat-gateway server starting on {}", bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /api/v1/users       — list users");
    tracing::info!("  GET    /api/v1/users/:id   — get a user");
    tracing::info!("  POST   /api/v1/users       — create a user");
    tracing::info!("  PUT    /api/v1/users/:id   — update a user");
    tracing::info!("  DELETE /api/v1/users/:id   — delete a user");
    tracing::info!("  POST   /api/v1/chat        — chat with DeepSeek");
    tracing::info!("  GET    /api/v1/chat/health — upstream credential status");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    tracing::info!("chat-gateway server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
