//! Route discovery: walks the routes directory and turns files into routes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::exclude::ExcludeSet;
use crate::method::HttpMethod;
use crate::module::{LoadError, Module, ModuleLoader, DEFAULT_EXPORT};
use crate::route::{path_to_pattern, Route};

/// Which files become routes, and how.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Extensions of page files (one `GET` route each)
    pub page_extensions: Vec<String>,

    /// Extensions of endpoint files (one route per exported method)
    pub endpoint_extensions: Vec<String>,

    /// Paths excluded from the scan
    pub exclude: ExcludeSet,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            page_extensions: vec!["md".to_string(), "html".to_string()],
            endpoint_extensions: vec!["json".to_string()],
            exclude: ExcludeSet::empty(),
        }
    }
}

impl ResolveOptions {
    /// Only page files; used for static builds.
    pub fn pages_only() -> Self {
        Self {
            endpoint_extensions: Vec::new(),
            ..Self::default()
        }
    }

    /// Replace the exclusion set with the given globs.
    pub fn exclude<I, S>(mut self, patterns: I) -> Result<Self, ResolveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude =
            ExcludeSet::new(patterns).map_err(|e| ResolveError::InvalidExclude(e.to_string()))?;
        Ok(self)
    }

    fn is_page(&self, ext: &str) -> bool {
        self.page_extensions.iter().any(|e| e == ext)
    }

    fn is_endpoint(&self, ext: &str) -> bool {
        self.endpoint_extensions.iter().any(|e| e == ext)
    }
}

/// Errors that can occur while resolving routes.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Routes directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Invalid exclude pattern: {0}")]
    InvalidExclude(String),
}

/// Scan `dir` recursively and resolve every route file.
///
/// Hidden files and directories are skipped. Endpoint files that fail to
/// load are logged and skipped. The result is ordered by file path, so an
/// unchanged directory always resolves to the same routes.
pub fn resolve_routes(
    dir: &Path,
    options: &ResolveOptions,
    loader: &dyn ModuleLoader,
) -> Result<Vec<Route>, ResolveError> {
    if !dir.is_dir() {
        return Err(ResolveError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut routes = Vec::new();

    let walker = WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(relative) = relative_path(dir, path) else {
            continue;
        };

        if options.exclude.is_excluded(&relative) {
            tracing::debug!("Excluded {}", relative);
            continue;
        }

        match resolve_route(&relative, path, options, loader) {
            Ok(resolved) => routes.extend(resolved),
            Err(e) => tracing::warn!("Skipping {}: {}", relative, e),
        }
    }

    tracing::debug!("Resolved {} routes from {}", routes.len(), dir.display());

    Ok(routes)
}

/// Resolve a single file.
///
/// `relative` is the `/`-separated path inside the routes directory and
/// `file` the absolute path. Files with unknown extensions yield no routes.
pub fn resolve_route(
    relative: &str,
    file: &Path,
    options: &ResolveOptions,
    loader: &dyn ModuleLoader,
) -> Result<Vec<Route>, LoadError> {
    let ext = file.extension().and_then(|e| e.to_str()).unwrap_or("");
    let path = path_to_pattern(relative);

    if options.is_page(ext) {
        return Ok(vec![Route::page(path, file)]);
    }

    if !options.is_endpoint(ext) {
        return Ok(Vec::new());
    }

    let endpoint = match loader.load(file)? {
        Module::Endpoint(endpoint) => endpoint,
        Module::Page(_) => return Ok(vec![Route::page(path, file)]),
    };

    let mut explicit = BTreeSet::new();
    for name in endpoint.export_names() {
        if name == DEFAULT_EXPORT {
            continue;
        }
        match name.parse::<HttpMethod>() {
            Ok(method) => {
                explicit.insert(method);
            }
            Err(_) => tracing::debug!("Ignoring export {} in {}", name, relative),
        }
    }

    let has_default = endpoint.has_default();

    Ok(HttpMethod::ALL
        .into_iter()
        .filter(|m| has_default || explicit.contains(m))
        .map(|method| Route::endpoint(path.clone(), file, method))
        .collect())
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

/// `/`-separated path of `path` relative to `dir`.
fn relative_path(dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(dir).ok()?;
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{Endpoint, Handler, MemoryModuleLoader};
    use crate::table::RouteTable;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "").unwrap();
        path
    }

    fn noop() -> Handler {
        Handler::new(|_| Ok(Value::Null))
    }

    #[test]
    fn resolves_markdown_pages() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        touch(root, "index.md");
        touch(root, "posts/index.md");
        touch(root, "posts/[slug].md");
        touch(root, "docs/[...rest].md");

        let routes =
            resolve_routes(root, &ResolveOptions::pages_only(), &MemoryModuleLoader::new())
                .unwrap();

        let paths: Vec<&str> = routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/docs/*rest", "/", "/posts/:slug", "/posts"]);
        assert!(routes
            .iter()
            .all(|r| r.method == HttpMethod::Get && !r.is_server_handler));
        assert_eq!(routes[1].file, root.join("index.md"));
    }

    #[test]
    fn endpoint_yields_one_route_per_exported_method() {
        let temp = tempdir().unwrap();
        let file = touch(temp.path(), "api/users.json");
        let loader = MemoryModuleLoader::new().with(
            file.clone(),
            Module::Endpoint(Endpoint::new().with("GET", noop()).with("POST", noop())),
        );

        let routes = resolve_routes(temp.path(), &ResolveOptions::default(), &loader).unwrap();

        assert_eq!(
            routes,
            vec![
                Route::endpoint("/api/users", file.clone(), HttpMethod::Get),
                Route::endpoint("/api/users", file, HttpMethod::Post),
            ]
        );
    }

    #[test]
    fn default_export_covers_every_method() {
        let temp = tempdir().unwrap();
        let file = touch(temp.path(), "api/[id].json");
        let loader = MemoryModuleLoader::new().with(
            file.clone(),
            Module::Endpoint(Endpoint::new().with(DEFAULT_EXPORT, noop())),
        );

        let routes = resolve_routes(temp.path(), &ResolveOptions::default(), &loader).unwrap();

        let methods: Vec<HttpMethod> = routes.iter().map(|r| r.method).collect();
        assert_eq!(methods, HttpMethod::ALL.to_vec());
        assert!(routes
            .iter()
            .all(|r| r.is_server_handler && r.path == "/api/:id" && r.file == file));
    }

    #[test]
    fn default_export_fills_in_missing_methods() {
        let temp = tempdir().unwrap();
        let file = touch(temp.path(), "api/items.json");
        let loader = MemoryModuleLoader::new().with(
            file,
            Module::Endpoint(
                Endpoint::new()
                    .with("POST", noop())
                    .with(DEFAULT_EXPORT, noop())
                    .with("helper", noop()),
            ),
        );

        let routes = resolve_routes(temp.path(), &ResolveOptions::default(), &loader).unwrap();

        assert_eq!(routes.len(), HttpMethod::ALL.len());
    }

    #[test]
    fn skips_files_that_fail_to_load() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "index.md");
        touch(temp.path(), "api/broken.json");

        let routes = resolve_routes(
            temp.path(),
            &ResolveOptions::default(),
            &MemoryModuleLoader::new(),
        )
        .unwrap();

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path, "/");
    }

    #[test]
    fn applies_exclusions_and_skips_hidden_files() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "index.md");
        touch(temp.path(), "drafts/wip.md");
        touch(temp.path(), ".cache/page.md");
        touch(temp.path(), "notes.txt");

        let options = ResolveOptions::pages_only().exclude(["drafts/**"]).unwrap();
        let routes = resolve_routes(temp.path(), &options, &MemoryModuleLoader::new()).unwrap();

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path, "/");
    }

    #[test]
    fn resolving_twice_is_idempotent() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "index.md");
        touch(temp.path(), "guide/[page].md");
        touch(temp.path(), "about.html");
        let loader = MemoryModuleLoader::new();

        let first: RouteTable = resolve_routes(temp.path(), &ResolveOptions::default(), &loader)
            .unwrap()
            .into_iter()
            .collect();
        let second: RouteTable = resolve_routes(temp.path(), &ResolveOptions::default(), &loader)
            .unwrap()
            .into_iter()
            .collect();

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn skips_broken_symlinks() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "index.md");
        std::os::unix::fs::symlink(temp.path().join("gone.md"), temp.path().join("dangling.md"))
            .unwrap();

        let routes = resolve_routes(
            temp.path(),
            &ResolveOptions::pages_only(),
            &MemoryModuleLoader::new(),
        )
        .unwrap();

        let paths: Vec<&str> = routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/"]);
    }

    #[test]
    fn errors_on_missing_directory() {
        let temp = tempdir().unwrap();

        let result = resolve_routes(
            &temp.path().join("missing"),
            &ResolveOptions::default(),
            &MemoryModuleLoader::new(),
        );

        assert!(matches!(result, Err(ResolveError::DirectoryNotFound(_))));
    }
}
