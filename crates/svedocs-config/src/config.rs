//! The merged site configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Placeholder replaced by the page title in `title_template`.
const TITLE_PLACEHOLDER: &str = ":title";

/// Site configuration: user values merged over the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site title
    pub title: String,

    /// Template for page titles, `:title` is replaced by the page title
    pub title_template: String,

    /// Site description, emitted as a meta tag
    pub description: String,

    /// Extra head tags: tag name -> list of attribute maps
    pub head: BTreeMap<String, Vec<BTreeMap<String, String>>>,

    /// Document language
    pub lang: String,

    /// Base path the site is mounted under
    pub base: String,

    /// Directory scanned for route files
    pub routes_dir: PathBuf,

    /// Glob patterns excluded from the route scan
    pub routes_exclude: Vec<String>,

    /// Output directory for static builds
    pub out_dir: PathBuf,

    /// Custom layout template for markdown pages
    pub layout: Option<PathBuf>,

    /// Markdown compiler options
    pub markdown: MarkdownOptions,

    /// Dev server options
    pub server: ServerOptions,

    /// URL path -> source file, filled in by route scans
    pub routes: BTreeMap<String, PathBuf>,
}

/// Markdown extensions toggled on the compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownOptions {
    pub tables: bool,
    pub footnotes: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub smart_punctuation: bool,
    /// Add `id` attributes to headings
    pub heading_ids: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            footnotes: true,
            strikethrough: true,
            tasklists: true,
            smart_punctuation: true,
            heading_ids: true,
        }
    }
}

/// Dev server options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Open the browser on start
    pub open: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5173,
            open: false,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "svedocs".to_string(),
            title_template: ":title | svedocs".to_string(),
            description: "documentation for the rest of us".to_string(),
            head: BTreeMap::new(),
            lang: "en-us".to_string(),
            base: String::new(),
            routes_dir: PathBuf::from("."),
            routes_exclude: Vec::new(),
            out_dir: PathBuf::from("dist"),
            layout: None,
            markdown: MarkdownOptions::default(),
            server: ServerOptions::default(),
            routes: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Title for a page, rendered through `title_template`.
    ///
    /// Pages without a title of their own get the bare site title.
    pub fn page_title(&self, title: Option<&str>) -> String {
        match title {
            Some(title) if !title.is_empty() => {
                self.title_template.replace(TITLE_PLACEHOLDER, title)
            }
            _ => self.title.clone(),
        }
    }

    /// Directory whose files are served verbatim at the site root.
    pub fn public_dir(&self) -> PathBuf {
        self.routes_dir.join("public")
    }

    /// Replace the routes mapping with the given `(url path, file)` pairs.
    pub fn register_routes<I>(&mut self, routes: I)
    where
        I: IntoIterator<Item = (String, PathBuf)>,
    {
        self.routes = routes.into_iter().collect();
    }

    /// Strip the configured base path from a request path.
    ///
    /// Returns `None` when the path lies outside the base.
    pub fn strip_base<'a>(&self, path: &'a str) -> Option<&'a str> {
        let base = self.base.trim_end_matches('/');
        if base.is_empty() {
            return Some(path);
        }

        match path.strip_prefix(base) {
            Some("") => Some("/"),
            Some(rest) if rest.starts_with('/') => Some(rest),
            _ => None,
        }
    }

    /// Globs excluded from every route scan.
    ///
    /// The configured `routes_exclude`, the public directory, config files
    /// and the build output when it lives inside the routes directory.
    pub fn scan_excludes(&self) -> Vec<String> {
        let mut patterns = self.routes_exclude.clone();
        patterns.push("public/**".to_string());
        patterns.push("svedocs.config.*".to_string());

        if let Ok(relative) = self.out_dir.strip_prefix(&self.routes_dir) {
            let parts: Vec<&str> = relative.iter().filter_map(|p| p.to_str()).collect();
            if !parts.is_empty() {
                patterns.push(format!("{}/**", parts.join("/")));
            }
        }

        patterns
    }

    /// Make relative paths absolute against the project directory.
    pub(crate) fn normalize_paths(&mut self, project_dir: &Path) {
        absolutize(&mut self.routes_dir, project_dir);
        absolutize(&mut self.out_dir, project_dir);
        if let Some(layout) = self.layout.as_mut() {
            absolutize(layout, project_dir);
        }
    }
}

fn absolutize(path: &mut PathBuf, base: &Path) {
    if path.is_relative() {
        let joined = base.join(&*path);
        // `routes_dir = "."` should not leave a trailing `/.`
        *path = joined
            .components()
            .filter(|c| !matches!(c, std::path::Component::CurDir))
            .collect();
    }
}
