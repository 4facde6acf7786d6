//! Preview server command.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::services::ServeDir;

/// Serve the built site from the configured output directory.
pub async fn run(cwd: &Path, port: u16) -> Result<()> {
    let site = super::load_site(cwd)?;
    let dir = site.out_dir;

    if !dir.exists() {
        anyhow::bail!(
            "Directory not found: {}. Run 'svedocs build' first.",
            dir.display()
        );
    }

    let addr: SocketAddr = format!("{}:{}", site.server.host, port)
        .parse()
        .context("Invalid address")?;

    tracing::info!("Serving {} at http://{}", dir.display(), addr);

    let base = site.base.trim_end_matches('/');
    let app = if base.is_empty() {
        Router::new().fallback_service(ServeDir::new(&dir))
    } else {
        Router::new().nest_service(base, ServeDir::new(&dir))
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;

    if site.server.open {
        let url = format!("http://{}", addr);
        if let Err(e) = open::that(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    axum::serve(listener, app).await?;

    Ok(())
}
