//! Static site build command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use svedocs_static::{BuildConfig, StaticBuilder};

/// Run the build command.
pub fn run(cwd: &Path, out_dir: Option<PathBuf>, minify: bool) -> Result<()> {
    tracing::info!("Building static site...");

    let mut site = super::load_site(cwd)?;
    if let Some(out_dir) = out_dir {
        site.out_dir = if out_dir.is_absolute() {
            out_dir
        } else {
            cwd.canonicalize()?.join(out_dir)
        };
    }

    let result = StaticBuilder::new(site, BuildConfig { minify }).build()?;

    for path in &result.skipped {
        tracing::info!("Not prerendered (dynamic): {}", path);
    }
    tracing::info!(
        "Built {} pages and copied {} public files in {}ms",
        result.pages,
        result.public_files,
        result.duration_ms
    );
    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
