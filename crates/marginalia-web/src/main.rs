//! Marginalia web server
//!
//! Run with: cargo run -p marginalia-web

use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use marginalia_common::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Fail fast on missing credentials, before any pipeline is built.
    let cfg = Config::from_env()?;

    let state = marginalia_web::state::AppState::from_config(&cfg).await?;
    let app = marginalia_web::router::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    info!("marginalia listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
