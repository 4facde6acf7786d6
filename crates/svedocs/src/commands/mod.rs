//! CLI subcommands.

pub mod build;
pub mod dev;
pub mod init;
pub mod serve;

use std::path::Path;

use anyhow::{Context, Result};
use svedocs_config::{resolve_config, SiteConfig};

/// Resolve the site config for a project directory.
pub fn load_site(cwd: &Path) -> Result<SiteConfig> {
    let cwd = cwd
        .canonicalize()
        .with_context(|| format!("Project directory not found: {}", cwd.display()))?;

    let site = resolve_config(&cwd).context("Run 'svedocs init' to create a config")?;
    tracing::debug!("Resolved config for {}", cwd.display());

    Ok(site)
}
