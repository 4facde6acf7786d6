//! Method-aware route table with most-specific-match lookup.

use std::cmp::Ordering;

use crate::method::HttpMethod;
use crate::pattern::{Params, Pattern};
use crate::route::Route;

#[derive(Debug, Clone)]
struct Entry {
    route: Route,
    pattern: Pattern,
}

/// A route matched against a request path.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch<'a> {
    /// The matched route
    pub route: &'a Route,
    /// Parameters captured from the path
    pub params: Params,
}

/// Routes keyed by `(method, path pattern)`, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<Entry>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a route, replacing any route with the same method and pattern.
    pub fn insert(&mut self, route: Route) {
        let pattern = Pattern::parse(&route.path);

        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.route.method == route.method && e.route.path == route.path)
        {
            tracing::debug!(
                "Replacing {} {} ({} -> {})",
                route.method,
                route.path,
                existing.route.file.display(),
                route.file.display()
            );
            *existing = Entry { route, pattern };
            return;
        }

        self.entries.push(Entry { route, pattern });
    }

    /// Find the most specific route for `method` matching `path`.
    ///
    /// Among equally specific patterns the first inserted wins.
    pub fn find(&self, method: HttpMethod, path: &str) -> Option<RouteMatch<'_>> {
        let mut best: Option<(&Entry, Params)> = None;

        for entry in self.entries.iter().filter(|e| e.route.method == method) {
            let Some(params) = entry.pattern.matches(path) else {
                continue;
            };

            let better = match &best {
                Some((current, _)) => {
                    entry.pattern.specificity(&current.pattern) == Ordering::Greater
                }
                None => true,
            };

            if better {
                best = Some((entry, params));
            }
        }

        best.map(|(entry, params)| RouteMatch {
            route: &entry.route,
            params,
        })
    }

    /// All routes, in insertion order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.entries.iter().map(|e| &e.route)
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no routes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Route> for RouteTable {
    fn from_iter<I: IntoIterator<Item = Route>>(iter: I) -> Self {
        let mut table = Self::new();
        for route in iter {
            table.insert(route);
        }
        table
    }
}

impl PartialEq for RouteTable {
    fn eq(&self, other: &Self) -> bool {
        self.routes().eq(other.routes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Param;

    fn table() -> RouteTable {
        [
            Route::page("/", "/r/index.md"),
            Route::page("/posts", "/r/posts/index.md"),
            Route::page("/posts/new", "/r/posts/new.md"),
            Route::page("/posts/:slug", "/r/posts/[slug].md"),
            Route::page("/posts/*rest", "/r/posts/[...rest].md"),
            Route::endpoint("/api/users", "/r/api/users.json", HttpMethod::Post),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn finds_exact_routes() {
        let table = table();

        let found = table.find(HttpMethod::Get, "/").unwrap();
        assert_eq!(found.route.path, "/");

        let found = table.find(HttpMethod::Get, "/posts").unwrap();
        assert_eq!(found.route.path, "/posts");
    }

    #[test]
    fn prefers_static_then_param_then_catch_all() {
        let table = table();

        assert_eq!(
            table.find(HttpMethod::Get, "/posts/new").unwrap().route.path,
            "/posts/new"
        );

        let found = table.find(HttpMethod::Get, "/posts/hello").unwrap();
        assert_eq!(found.route.path, "/posts/:slug");
        assert_eq!(found.params["slug"], Param::One("hello".to_string()));

        let found = table.find(HttpMethod::Get, "/posts/2024/hello").unwrap();
        assert_eq!(found.route.path, "/posts/*rest");
    }

    #[test]
    fn specificity_does_not_depend_on_insertion_order() {
        let table: RouteTable = [
            Route::page("/docs/*rest", "/r/docs/[...rest].md"),
            Route::page("/docs/:page", "/r/docs/[page].md"),
            Route::page("/docs/intro", "/r/docs/intro.md"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            table.find(HttpMethod::Get, "/docs/intro").unwrap().route.path,
            "/docs/intro"
        );
        assert_eq!(
            table.find(HttpMethod::Get, "/docs/other").unwrap().route.path,
            "/docs/:page"
        );
    }

    #[test]
    fn lookup_is_method_aware() {
        let table = table();

        assert!(table.find(HttpMethod::Post, "/api/users").is_some());
        assert!(table.find(HttpMethod::Get, "/api/users").is_none());
        assert!(table.find(HttpMethod::Post, "/posts").is_none());
    }

    #[test]
    fn returns_none_for_unregistered_paths() {
        assert!(table().find(HttpMethod::Get, "/missing/page").is_none());
    }

    #[test]
    fn insert_replaces_same_method_and_path() {
        let mut table = RouteTable::new();
        table.insert(Route::page("/a", "/r/a.md"));
        table.insert(Route::page("/a", "/r/a/index.md"));

        assert_eq!(table.len(), 1);
        assert_eq!(
            table.find(HttpMethod::Get, "/a").unwrap().route.file,
            std::path::PathBuf::from("/r/a/index.md")
        );
    }
}
