//! Request dispatch against the route table.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;
use serde_json::Value;

use svedocs_config::SiteConfig;
use svedocs_render::{FsModuleLoader, TemplateEngine};
use svedocs_routes::{
    resolve_routes, Component, HandlerError, HandlerEvent, HttpMethod, LoadError, Module,
    ModuleLoader, RenderContext, ResolveOptions, RouteMatch, RouteTable,
};

use crate::ServerError;

/// Body of every `404` response.
pub const NOT_FOUND_BODY: &str = "not-found";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// A response produced by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResponse {
    /// Status code
    pub status: StatusCode,
    /// Headers in the order they are applied; later entries win
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: String,
}

impl DispatchResponse {
    fn new(status: StatusCode, content_type: Option<&str>, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: content_type
                .map(|ct| vec![(header::CONTENT_TYPE.as_str().to_string(), ct.to_string())])
                .unwrap_or_default(),
            body: body.into(),
        }
    }

    /// The `404` response for unmatched requests.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, Some(TEXT_PLAIN), NOT_FOUND_BODY)
    }

    /// A `500` response.
    pub fn internal_error() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            Some(TEXT_PLAIN),
            "internal-error",
        )
    }

    /// Last value set for a header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl IntoResponse for DispatchResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        response.headers_mut().remove(header::CONTENT_TYPE);

        for (name, value) in &self.headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => tracing::warn!("Dropping invalid response header {}", name),
            }
        }

        response
    }
}

/// Errors that turn into a `500` response.
#[derive(Debug, thiserror::Error)]
enum DispatchError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error("No {method} handler exported by {file}")]
    MissingHandler { method: HttpMethod, file: String },

    #[error("Failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Matches requests against a route table and produces responses.
///
/// A dispatcher is immutable. Rescans build a new one and swap it in.
pub struct Dispatcher {
    table: RouteTable,
    loader: Arc<dyn ModuleLoader>,
    site: Arc<SiteConfig>,
    engine: Arc<TemplateEngine>,
    extra_head: String,
}

impl Dispatcher {
    /// Create a dispatcher over a route table.
    pub fn new(
        table: RouteTable,
        loader: Arc<dyn ModuleLoader>,
        site: Arc<SiteConfig>,
        engine: Arc<TemplateEngine>,
    ) -> Self {
        Self {
            table,
            loader,
            site,
            engine,
            extra_head: String::new(),
        }
    }

    /// Scan the site's routes directory and build a dispatcher for it.
    ///
    /// The returned dispatcher's site config has `routes` filled in from the
    /// page routes found.
    pub fn scan(base: &SiteConfig, options: &ResolveOptions) -> Result<Self, ServerError> {
        let scan_loader = FsModuleLoader::new(Arc::new(base.clone()))?;
        let routes = resolve_routes(&base.routes_dir, options, &scan_loader)?;

        let mut site = base.clone();
        site.register_routes(
            routes
                .iter()
                .filter(|r| r.method == HttpMethod::Get && !r.is_server_handler)
                .map(|r| (r.path.clone(), r.file.clone())),
        );
        let site = Arc::new(site);

        let loader = FsModuleLoader::new(Arc::clone(&site))?;
        let engine = loader.engine();
        let table: RouteTable = routes.into_iter().collect();

        Ok(Self::new(table, Arc::new(loader), site, engine))
    }

    /// Markup appended to the head of every page.
    pub fn with_extra_head(mut self, head: impl Into<String>) -> Self {
        self.extra_head = head.into();
        self
    }

    /// The route table requests are matched against.
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// The site config pages are rendered with.
    pub fn site(&self) -> &Arc<SiteConfig> {
        &self.site
    }

    /// Dispatch one request.
    ///
    /// `path` may carry a query string and the site's base prefix, and is
    /// percent-decoded before matching. Never fails: unmatched requests get a `404`, failing handlers a `500`.
    pub fn dispatch(&self, method: &Method, path: &str, headers: &HeaderMap) -> DispatchResponse {
        let Ok(method) = method.as_str().parse::<HttpMethod>() else {
            return DispatchResponse::not_found();
        };

        let path = path.split_once('?').map_or(path, |(p, _)| p);

        // Match on the decoded path, so captured params are decoded too.
        let Ok(decoded) = percent_decode_str(path).decode_utf8() else {
            tracing::debug!("Rejecting non UTF-8 path {}", path);
            return DispatchResponse::not_found();
        };
        let Some(path) = self.site.strip_base(&decoded) else {
            return DispatchResponse::not_found();
        };
        let path = normalize(path);

        let Some(matched) = self.table.find(method, path) else {
            tracing::debug!("No route for {} {}", method, path);
            return DispatchResponse::not_found();
        };

        match self.respond(method, path, headers, matched) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("{} {} failed: {}", method, path, e);
                DispatchResponse::internal_error()
            }
        }
    }

    fn respond(
        &self,
        method: HttpMethod,
        path: &str,
        headers: &HeaderMap,
        matched: RouteMatch<'_>,
    ) -> Result<DispatchResponse, DispatchError> {
        let route = matched.route;

        match self.loader.load(&route.file)? {
            Module::Endpoint(endpoint) => {
                let handler = endpoint.handler_for(method).ok_or_else(|| {
                    DispatchError::MissingHandler {
                        method,
                        file: route.file.display().to_string(),
                    }
                })?;

                let mut event =
                    HandlerEvent::new(method, path, header_map(headers), matched.params);
                let value = handler.call(&mut event)?;

                let mut response = value_response(value)?;
                response
                    .headers
                    .extend(event.response_headers().iter().cloned());
                Ok(response)
            }

            Module::Page(component) => {
                let rendered = component.render(&RenderContext {
                    pathname: path,
                    params: &matched.params,
                })?;
                let html = self
                    .engine
                    .render_document(&self.site, &rendered, &self.extra_head)
                    .map_err(HandlerError::from)?;

                Ok(DispatchResponse::new(StatusCode::OK, Some(TEXT_HTML), html))
            }
        }
    }
}

/// Drop a trailing slash, except from the root path.
fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// Request headers as a lower-cased map; repeated headers are comma-joined.
fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();

    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        map.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    map
}

/// Turn a handler's return value into a response.
fn value_response(value: Value) -> Result<DispatchResponse, serde_json::Error> {
    Ok(match value {
        Value::String(body) => DispatchResponse::new(StatusCode::OK, Some(TEXT_PLAIN), body),
        Value::Null => DispatchResponse::new(StatusCode::OK, None, ""),
        other => DispatchResponse::new(
            StatusCode::OK,
            Some(APPLICATION_JSON),
            serde_json::to_string(&other)?,
        ),
    })
}
