//! Rollcall gateway server.
//!
//! Connects the store, applies migrations, and serves the HTTP/WebSocket
//! gateway until interrupted.
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/rollcall cargo run --bin server
//! ```

use anyhow::Context;
use rollcall_postgres::PostgresStore;
use rollcall_web::{router, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rollcall=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(addr = %config.bind_addr(), "starting rollcall gateway");

    let store = PostgresStore::connect(&config.database.url, config.database.max_connections)
        .await
        .context("connecting to postgres")?;
    store.migrate().await.context("applying migrations")?;
    tracing::info!("migrations applied");

    let addr = config.bind_addr();
    let state = AppState::new(store, config);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("binding listener")?;
    tracing::info!(%addr, "rollcall gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    tracing::info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
