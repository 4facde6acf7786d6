//! Static site builder.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use walkdir::WalkDir;

use svedocs_config::SiteConfig;
use svedocs_render::{FsModuleLoader, RenderError, TemplateEngine};
use svedocs_routes::{
    resolve_routes, Component, HandlerError, HttpMethod, LoadError, Module, ModuleLoader,
    Params, RenderContext, ResolveError, ResolveOptions, Route, RouteTable,
};

use crate::assets::write_theme;

/// Build options not covered by the site config.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Minify the theme stylesheet
    pub minify: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self { minify: true }
    }
}

/// Result of a build.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages generated
    pub pages: usize,

    /// Routes with dynamic segments that were not rendered
    pub skipped: Vec<String>,

    /// Number of public files copied
    pub public_files: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during a build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Failed to load {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: LoadError,
    },

    #[error("Failed to render {path}: {source}")]
    Page {
        path: String,
        #[source]
        source: HandlerError,
    },

    #[error("{path} is not a page")]
    NotAPage { path: String },

    #[error("CSS error: {0}")]
    Css(String),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub(crate) fn write(path: &Path, source: std::io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Static site builder.
pub struct StaticBuilder {
    site: SiteConfig,
    config: BuildConfig,
}

impl StaticBuilder {
    pub fn new(site: SiteConfig, config: BuildConfig) -> Self {
        Self { site, config }
    }

    /// Build the site into `out_dir`.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let out_dir = &self.site.out_dir;

        // Create output directory
        fs::create_dir_all(out_dir).map_err(|e| BuildError::write(out_dir, e))?;

        // Discover page routes; a later file replaces an earlier one at the same path
        let options = ResolveOptions::pages_only().exclude(self.site.scan_excludes())?;
        let scan_loader = FsModuleLoader::new(Arc::new(self.site.clone()))?;
        let table: RouteTable = resolve_routes(&self.site.routes_dir, &options, &scan_loader)?
            .into_iter()
            .collect();
        tracing::info!("Found {} routes", table.len());

        // Pages see every route in the site config
        let mut site = self.site.clone();
        site.register_routes(
            table
                .routes()
                .filter(|r| r.method == HttpMethod::Get)
                .map(|r| (r.path.clone(), r.file.clone())),
        );
        let site = Arc::new(site);
        let loader = FsModuleLoader::new(Arc::clone(&site))?;
        let engine = loader.engine();

        // Dynamic routes have no fixed URL to render
        let (dynamic, pages): (Vec<&Route>, Vec<&Route>) =
            table.routes().partition(|r| r.is_dynamic());
        for route in &dynamic {
            tracing::warn!("Skipping dynamic route {}", route.path);
        }

        // Build pages in parallel
        pages
            .par_iter()
            .map(|route| self.build_page(route, &loader, &engine, &site))
            .collect::<Result<Vec<()>, BuildError>>()?;

        // Theme and public assets
        write_theme(out_dir, self.config.minify)?;
        let public_files = copy_dir(&self.site.public_dir(), out_dir)?;

        // Generate sitemap
        self.write_sitemap(&pages)?;

        Ok(BuildResult {
            pages: pages.len(),
            skipped: dynamic.into_iter().map(|r| r.path.clone()).collect(),
            public_files,
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir: out_dir.clone(),
        })
    }

    /// Render one page route to its `index.html`.
    fn build_page(
        &self,
        route: &Route,
        loader: &FsModuleLoader,
        engine: &TemplateEngine,
        site: &SiteConfig,
    ) -> Result<(), BuildError> {
        let module = loader.load(&route.file).map_err(|source| BuildError::Load {
            path: route.path.clone(),
            source,
        })?;
        let Module::Page(component) = module else {
            return Err(BuildError::NotAPage {
                path: route.path.clone(),
            });
        };

        // Static pages have no params
        let params = Params::new();
        let rendered = component
            .render(&RenderContext {
                pathname: &route.path,
                params: &params,
            })
            .map_err(|source| BuildError::Page {
                path: route.path.clone(),
                source,
            })?;
        let html = engine.render_document(site, &rendered, "")?;

        // Write output file
        let output = output_path(&self.site.out_dir, &route.path);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::write(parent, e))?;
        }
        fs::write(&output, html).map_err(|e| BuildError::write(&output, e))?;

        tracing::debug!("Built {} -> {}", route.path, output.display());
        Ok(())
    }

    /// Generate `sitemap.xml` listing every built page.
    fn write_sitemap(&self, pages: &[&Route]) -> Result<(), BuildError> {
        let base = self.site.base.trim_end_matches('/');
        let mut paths: Vec<&str> = pages.iter().map(|r| r.path.as_str()).collect();
        paths.sort_unstable();

        let urls: Vec<String> = paths
            .iter()
            .map(|path| format!("  <url>\n    <loc>{}{}</loc>\n  </url>", base, path))
            .collect();

        let sitemap = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{}
</urlset>"#,
            urls.join("\n")
        );

        let path = self.site.out_dir.join("sitemap.xml");
        fs::write(&path, sitemap).map_err(|e| BuildError::write(&path, e))
    }
}

/// `out_dir/<path>/index.html` for a route path.
fn output_path(out_dir: &Path, route_path: &str) -> PathBuf {
    let mut path = out_dir.to_path_buf();
    for segment in route_path.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.join("index.html")
}

/// Copy every file under `from` into `to`, returning the number copied.
fn copy_dir(from: &Path, to: &Path) -> Result<usize, BuildError> {
    if !from.is_dir() {
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(from) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable public entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };

        // Mirror the public layout at the output root
        let target = to.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::write(parent, e))?;
        }
        fs::copy(entry.path(), &target).map_err(|e| BuildError::write(&target, e))?;
        copied += 1;
    }

    Ok(copied)
}
