//! Huddle server entry point.

use std::sync::Arc;

use dotenvy::dotenv;
use mimalloc::MiMalloc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use huddle::backend::HttpBackend;
use huddle::chat::RoomDirectory;
use huddle::config::AppConfig;
use huddle::session::SessionStore;
use huddle::{AppState, server};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (M-LOG-STRUCTURED)
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env (if present)
    let _ = dotenv();

    let config = match AppConfig::load() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let base_url = Url::parse(&config.backend.base_url)
        .map_err(|e| anyhow::anyhow!("invalid backend.base_url: {e}"))?;

    info!(
        name: "backend.config.loaded",
        base_url = %base_url,
        "Backend configuration loaded"
    );

    // No client-wide timeout: change feeds are long-lived. Row and auth
    // requests get the configured per-request timeout instead.
    let backend = Arc::new(
        HttpBackend::new(base_url, config.backend.api_key.clone()).request_timeout(
            std::time::Duration::from_secs(config.backend.request_timeout_secs),
        ),
    );

    let directory = Arc::new(RoomDirectory::open(backend.clone()).await);

    let state = AppState {
        backend,
        directory,
        sessions: SessionStore::new(),
        config,
    };

    server::start_server(state).await
}
