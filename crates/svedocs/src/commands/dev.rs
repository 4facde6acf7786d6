//! Development server command.

use std::path::Path;

use anyhow::Result;
use svedocs_server::DevServer;

/// Run the dev server.
pub async fn run(cwd: &Path, port: Option<u16>, host: Option<String>, open: bool) -> Result<()> {
    let mut site = super::load_site(cwd)?;

    if let Some(port) = port {
        site.server.port = port;
    }
    if let Some(host) = host {
        site.server.host = host;
    }
    site.server.open |= open;

    DevServer::new(site).start().await?;

    Ok(())
}
