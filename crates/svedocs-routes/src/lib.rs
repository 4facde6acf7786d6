//! File-based routing for svedocs.
//!
//! Turns the files of a routes directory into [`Route`]s, collects them in a
//! [`RouteTable`] and matches incoming `(method, path)` pairs against it.
//! Route files are loaded through a [`ModuleLoader`] so that matching and
//! dispatch can be exercised with in-memory modules.

pub mod exclude;
pub mod method;
pub mod module;
pub mod pattern;
pub mod resolver;
pub mod route;
pub mod table;

pub use exclude::ExcludeSet;
pub use method::{HttpMethod, UnknownMethod};
pub use module::{
    Component, Endpoint, Handler, HandlerError, HandlerEvent, LoadError, MemoryModuleLoader,
    Module, ModuleLoader, RenderContext, Rendered, DEFAULT_EXPORT,
};
pub use pattern::{Param, Params, Pattern, Segment};
pub use resolver::{resolve_route, resolve_routes, ResolveError, ResolveOptions};
pub use route::{path_to_pattern, Route};
pub use table::{RouteMatch, RouteTable};
