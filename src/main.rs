//! NovaMart dashboard server.
//!
//! Loads the datasets from `NOVAMART_DATA_DIR` once, then serves the seven
//! pages on `NOVAMART_BIND:NOVAMART_PORT`. A failed load still serves: every
//! page answers with the blocking error panel.

use anyhow::{Context, Result};
use novamart::logging::log_startup;
use novamart::server::{serve, Dashboard, DashboardState};
use novamart::{DashboardConfig, PageId};
use tokio::net::TcpListener;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = DashboardConfig::from_env();
    let listen = config.listen_addr();
    log_startup(&config.data_dir.display().to_string(), &listen);

    let state = DashboardState::load(&config.data_dir);
    if let DashboardState::Failed(err) = &state {
        eprintln!("data load failed: {}", err);
        eprintln!("serving the error panel until the data directory is fixed");
    }

    let listener = TcpListener::bind(&listen)
        .await
        .with_context(|| format!("failed to bind {}", listen))?;
    eprintln!("NovaMart Analytics at http://{}/", listen);
    eprintln!(
        "  GET /page/<slug>      pages: {}",
        PageId::ALL.map(|id| id.slug()).join(" ")
    );
    eprintln!("  GET /api/page/<slug>  page JSON");
    eprintln!("  GET /api/manifest     dataset fingerprints");
    eprintln!("  GET /api/health       health check");

    serve(listener, Dashboard::new(state, config))
        .await
        .context("server loop failed")
}
