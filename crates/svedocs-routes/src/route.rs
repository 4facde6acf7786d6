//! Routes and the file path to URL pattern translation.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::method::HttpMethod;

/// Trailing index file, optionally preceded by a separator.
static INDEX_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|/)index\.[A-Za-z0-9]+$").expect("valid regex"));

/// `[...name]` catch-all segment.
static CATCH_ALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\.\.\.(\w+)\]").expect("valid regex"));

/// `[name]` dynamic segment.
static DYNAMIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\w+)\]").expect("valid regex"));

/// File extension of the last path segment.
static EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[A-Za-z0-9]+$").expect("valid regex"));

/// A single registered route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    /// URL pattern, e.g. `/posts/:slug`
    pub path: String,

    /// Absolute path of the source file
    pub file: PathBuf,

    /// Method this route answers
    pub method: HttpMethod,

    /// Whether the file is an endpoint rather than a page
    pub is_server_handler: bool,
}

impl Route {
    /// A `GET` page route.
    pub fn page(path: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: file.into(),
            method: HttpMethod::Get,
            is_server_handler: false,
        }
    }

    /// A server-handled endpoint route.
    pub fn endpoint(path: impl Into<String>, file: impl Into<PathBuf>, method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            file: file.into(),
            method,
            is_server_handler: true,
        }
    }

    /// Whether the pattern contains `:param` or `*rest` segments.
    pub fn is_dynamic(&self) -> bool {
        self.path
            .split('/')
            .any(|s| s.starts_with(':') || s.starts_with('*'))
    }
}

/// Translate a `/`-separated path relative to the routes directory into a
/// URL pattern.
///
/// - `index.md` → `/`, `posts/index.md` → `/posts`
/// - `posts/[slug].md` → `/posts/:slug`
/// - `docs/[...rest].md` → `/docs/*rest`
///
/// Unbalanced brackets are left as they are.
pub fn path_to_pattern(relative: &str) -> String {
    let path = INDEX_FILE.replace(relative, "");
    let path = CATCH_ALL.replace_all(&path, "*$1");
    let path = DYNAMIC.replace_all(&path, ":$1");
    let path = EXTENSION.replace(&path, "");

    if path.starts_with('/') {
        path.into_owned()
    } else {
        format!("/{path}")
    }
}
