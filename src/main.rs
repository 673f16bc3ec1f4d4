// src/main.rs
mod config;
mod database;
mod dtos;
mod error;
mod finance;
mod handlers;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// How many ports above `PORT` to try before giving up.
const PORT_FALLBACK_RANGE: u16 = 20;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    tracing::info!(bata_base = ?config.bata_base, "Configuration loaded");

    let db_pool = database::create_pool(&config.database_url, config.db_max_connections).await?;
    let app_state = state::AppState::new(db_pool, config.bata_base);

    let app = routes::create_app(app_state);

    // Try PORT..PORT+20 to avoid crash when address is in use
    let listener = {
        let mut bound = None;
        for offset in 0u16..=PORT_FALLBACK_RANGE {
            let port = config.port.saturating_add(offset);
            let addr = SocketAddr::from((config.host, port));
            match TcpListener::bind(addr).await {
                Ok(l) => {
                    bound = Some((l, addr));
                    break;
                }
                Err(e) => {
                    if offset == 0 {
                        tracing::warn!(%addr, error = %e, "Port in use, trying next");
                    }
                }
            }
        }
        match bound {
            Some((l, addr)) => {
                tracing::info!("Server running on http://{}{}", addr, routes::BASE_PATH);
                l
            }
            None => anyhow::bail!(
                "Failed to bind to any port starting at {} on {}",
                config.port,
                config.host
            ),
        }
    };

    axum::serve(listener, app).await?;
    Ok(())
}
