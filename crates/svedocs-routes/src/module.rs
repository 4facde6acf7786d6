//! Route modules and the loader capability.
//!
//! A route file loads into a [`Module`]: either a page [`Component`] that
//! renders to head/body fragments, or an [`Endpoint`] whose exports are
//! handlers named after HTTP methods (plus an optional `default`).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::method::HttpMethod;
use crate::pattern::Params;

/// Name of the export used for methods without a handler of their own.
pub const DEFAULT_EXPORT: &str = "default";

/// Request information handed to an endpoint handler.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerEvent {
    /// Request method
    pub method: HttpMethod,

    /// Request path, without query string
    pub pathname: String,

    /// Request headers, names lower-cased
    pub headers: BTreeMap<String, String>,

    /// Parameters captured from the route pattern
    pub params: Params,

    #[serde(skip)]
    response_headers: Vec<(String, String)>,
}

impl HandlerEvent {
    /// Create an event for a matched request.
    pub fn new(
        method: HttpMethod,
        pathname: impl Into<String>,
        headers: BTreeMap<String, String>,
        params: Params,
    ) -> Self {
        Self {
            method,
            pathname: pathname.into(),
            headers,
            params,
            response_headers: Vec::new(),
        }
    }

    /// Look up a request header, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Set a response header, replacing an earlier value of the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.response_headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.response_headers.push((name, value.into()));
    }

    /// Set several response headers at once.
    pub fn set_headers<I, K, V>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.set_header(name, value);
        }
    }

    /// Response headers set by the handler, in the order they were set.
    pub fn response_headers(&self) -> &[(String, String)] {
        &self.response_headers
    }
}

/// Errors raised while running a handler or rendering a component.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    /// Create an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

type HandlerFn = dyn Fn(&mut HandlerEvent) -> Result<Value, HandlerError> + Send + Sync;

/// An endpoint handler.
///
/// The returned value becomes the response body: strings are sent raw,
/// `null` as an empty body, anything else as JSON.
#[derive(Clone)]
pub struct Handler(Arc<HandlerFn>);

impl Handler {
    /// Wrap a closure as a handler.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut HandlerEvent) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Run the handler.
    pub fn call(&self, event: &mut HandlerEvent) -> Result<Value, HandlerError> {
        (self.0)(event)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}

/// Named handler exports of an endpoint file.
#[derive(Debug, Clone, Default)]
pub struct Endpoint {
    exports: BTreeMap<String, Handler>,
}

impl Endpoint {
    /// Create an endpoint with no exports.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an export, builder style.
    pub fn with(mut self, name: impl Into<String>, handler: Handler) -> Self {
        self.insert(name, handler);
        self
    }

    /// Add or replace an export.
    pub fn insert(&mut self, name: impl Into<String>, handler: Handler) {
        self.exports.insert(name.into(), handler);
    }

    /// Names of all exports, sorted.
    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }

    /// Whether a `default` export exists.
    pub fn has_default(&self) -> bool {
        self.exports.contains_key(DEFAULT_EXPORT)
    }

    /// Handler for `method`, falling back to the `default` export.
    pub fn handler_for(&self, method: HttpMethod) -> Option<&Handler> {
        self.exports
            .get(method.as_str())
            .or_else(|| self.exports.get(DEFAULT_EXPORT))
    }
}

/// Request information available to a page component.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Request path, without query string
    pub pathname: &'a str,
    /// Parameters captured from the route pattern
    pub params: &'a Params,
}

/// Output of rendering a page component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    /// Markup for the document head
    pub head: String,
    /// Markup for the document body
    pub body: String,
    /// Page title, if the component declares one
    pub title: Option<String>,
    /// Page description, if the component declares one
    pub description: Option<String>,
}

/// A page that renders to head/body fragments on the server.
pub trait Component: Send + Sync {
    /// Render the page for a request.
    fn render(&self, ctx: &RenderContext<'_>) -> Result<Rendered, HandlerError>;
}

/// A loaded route file.
#[derive(Clone)]
pub enum Module {
    /// A page component
    Page(Arc<dyn Component>),
    /// Endpoint handlers
    Endpoint(Endpoint),
}

impl Module {
    /// Wrap a component as a page module.
    pub fn page<C: Component + 'static>(component: C) -> Self {
        Self::Page(Arc::new(component))
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(_) => f.write_str("Module::Page"),
            Self::Endpoint(endpoint) => f.debug_tuple("Module::Endpoint").field(endpoint).finish(),
        }
    }
}

/// Errors that can occur while loading a module.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Module not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported route file: {}", .0.display())]
    Unsupported(PathBuf),
}

/// Loads route files into modules.
pub trait ModuleLoader: Send + Sync {
    /// Load the module at `file` (an absolute path inside the routes directory).
    fn load(&self, file: &Path) -> Result<Module, LoadError>;
}

impl<L: ModuleLoader + ?Sized> ModuleLoader for Arc<L> {
    fn load(&self, file: &Path) -> Result<Module, LoadError> {
        (**self).load(file)
    }
}

/// Modules registered in memory, keyed by file path.
///
/// Files without a registered module go to the fallback loader, if any.
#[derive(Default)]
pub struct MemoryModuleLoader {
    modules: HashMap<PathBuf, Module>,
    fallback: Option<Arc<dyn ModuleLoader>>,
}

impl MemoryModuleLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delegate unregistered files to `fallback`.
    pub fn with_fallback(mut self, fallback: Arc<dyn ModuleLoader>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Register a module for a file.
    pub fn insert(&mut self, file: impl Into<PathBuf>, module: Module) {
        self.modules.insert(file.into(), module);
    }

    /// Register a module, builder style.
    pub fn with(mut self, file: impl Into<PathBuf>, module: Module) -> Self {
        self.insert(file, module);
        self
    }
}

impl ModuleLoader for MemoryModuleLoader {
    fn load(&self, file: &Path) -> Result<Module, LoadError> {
        if let Some(module) = self.modules.get(file) {
            return Ok(module.clone());
        }

        match &self.fallback {
            Some(fallback) => fallback.load(file),
            None => Err(LoadError::NotFound(file.to_path_buf())),
        }
    }
}
