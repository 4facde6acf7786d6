//! Development server.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        OriginalUri, State,
    },
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use tokio::sync::{Mutex, RwLock};
use tower_http::services::ServeDir;

use svedocs_config::SiteConfig;
use svedocs_render::{theme_css, THEME_CSS_PATH};
use svedocs_routes::ResolveOptions;

use crate::dispatch::{DispatchResponse, Dispatcher};
use crate::watcher::{FileWatcher, WatchEvent};
use crate::websocket::{
    hmr_client_script, next_message, HmrHub, HmrMessage, HMR_SCRIPT_PATH, HMR_SOCKET_PATH,
};
use crate::ServerError;

/// URL path of the injected site config module.
pub const APP_SCRIPT_PATH: &str = "/@svedocs/app.js";

/// Shared server state.
pub(crate) struct ServerState {
    /// Config as resolved at startup, before any scan
    site: Arc<SiteConfig>,
    options: ResolveOptions,
    dispatcher: RwLock<Arc<Dispatcher>>,
    /// Serializes rescans
    scan_lock: Mutex<()>,
    hmr: HmrHub,
}

impl ServerState {
    /// Scan the routes directory and build the initial state.
    pub(crate) async fn new(site: SiteConfig) -> Result<Self, ServerError> {
        let site = Arc::new(site);
        let options = ResolveOptions::default().exclude(site.scan_excludes())?;
        let dispatcher = scan(Arc::clone(&site), options.clone()).await?;

        Ok(Self {
            site,
            options,
            dispatcher: RwLock::new(Arc::new(dispatcher)),
            scan_lock: Mutex::new(()),
            hmr: HmrHub::new(),
        })
    }

    /// The current dispatcher.
    async fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&*self.dispatcher.read().await)
    }

    /// Rebuild the route table and swap it in.
    ///
    /// On failure the previous table stays in place.
    pub(crate) async fn rescan(&self) -> Result<(), ServerError> {
        let _guard = self.scan_lock.lock().await;

        let dispatcher = scan(Arc::clone(&self.site), self.options.clone()).await?;
        let routes: Vec<String> = dispatcher.site().routes.keys().cloned().collect();
        tracing::info!("Rescanned {} routes", dispatcher.table().len());

        *self.dispatcher.write().await = Arc::new(dispatcher);
        self.hmr.send(HmrMessage::RoutesUpdated { routes });

        Ok(())
    }
}

/// Build a dispatcher on the blocking pool.
async fn scan(site: Arc<SiteConfig>, options: ResolveOptions) -> Result<Dispatcher, ServerError> {
    tokio::task::spawn_blocking(move || {
        Dispatcher::scan(&site, &options).map(|d| d.with_extra_head(dev_head()))
    })
    .await
    .map_err(|e| ServerError::Task(e.to_string()))?
}

/// Scripts added to every page in development.
fn dev_head() -> String {
    format!(
        "<script type=\"module\" src=\"{}\"></script>\n<script src=\"{}\"></script>",
        APP_SCRIPT_PATH, HMR_SCRIPT_PATH
    )
}

/// Development server.
pub struct DevServer {
    site: SiteConfig,
}

impl DevServer {
    /// Create a server for a resolved site config.
    ///
    /// Host, port and browser opening come from `site.server`.
    pub fn new(site: SiteConfig) -> Self {
        Self { site }
    }

    /// Scan routes, start watching and serve until the process exits.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr: SocketAddr = format!("{}:{}", self.site.server.host, self.site.server.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ServerError::Address(e.to_string()))?;
        let open_browser = self.site.server.open;
        let routes_dir = self.site.routes_dir.clone();
        let out_dir = self.site.out_dir.clone();

        let state = Arc::new(ServerState::new(self.site).await?);
        tracing::info!(
            "Found {} routes in {}",
            state.dispatcher().await.table().len(),
            routes_dir.display()
        );

        let (watcher, mut rx) = FileWatcher::new(std::slice::from_ref(&routes_dir))
            .map_err(|e| ServerError::Watch(e.to_string()))?;

        let watch_state = Arc::clone(&state);
        tokio::spawn(async move {
            // Keep the watcher alive as long as events are handled.
            let _watcher = watcher;

            while let Some(event) = rx.recv().await {
                let mut relevant = is_relevant(&event, &routes_dir, &out_dir);
                while let Ok(more) = rx.try_recv() {
                    relevant |= is_relevant(&more, &routes_dir, &out_dir);
                }

                if relevant {
                    handle_change(&watch_state).await;
                }
            }
        });

        let app = router(state);

        tracing::info!("Starting dev server at http://{}", addr);

        if open_browser {
            let url = format!("http://{}", addr);
            if let Err(e) = open::that(&url) {
                tracing::warn!("Failed to open browser: {}", e);
            }
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        axum::serve(listener, app).await.map_err(ServerError::Serve)?;

        Ok(())
    }
}

/// Build the dev server router.
///
/// Files from the public directory are served first, under the site's
/// base. Anything else goes to the dispatcher.
pub(crate) fn router(state: Arc<ServerState>) -> Router {
    let base = state.site.base.trim_end_matches('/').to_string();
    let dispatch = any(dispatch_handler).with_state::<()>(Arc::clone(&state));
    let public = ServeDir::new(state.site.public_dir())
        .call_fallback_on_method_not_allowed(true)
        .fallback(dispatch.clone());

    let router = Router::new()
        .route(HMR_SOCKET_PATH, get(ws_handler))
        .route(HMR_SCRIPT_PATH, get(hmr_script_handler))
        .route(APP_SCRIPT_PATH, get(app_script_handler))
        .route(&format!("{}{}", base, THEME_CSS_PATH), get(theme_handler));

    // Public files live under the base, like in the built site
    let router = if base.is_empty() {
        router.fallback_service(public)
    } else {
        router.nest_service(&base, public).fallback_service(dispatch)
    };

    router.with_state(state)
}

fn is_relevant(event: &WatchEvent, routes_dir: &Path, out_dir: &Path) -> bool {
    if let WatchEvent::ConfigChanged(path) = event {
        tracing::warn!("{} changed, restart to apply it", path.display());
        return false;
    }

    let path = event.path();
    if path.starts_with(out_dir) {
        return false;
    }

    let hidden = path
        .strip_prefix(routes_dir)
        .map(|rel| {
            rel.components()
                .any(|c| c.as_os_str().to_str().is_some_and(|s| s.starts_with('.')))
        })
        .unwrap_or(false);

    !hidden
}

/// Rescan after a change and tell browsers to reload.
async fn handle_change(state: &ServerState) {
    match state.rescan().await {
        Ok(()) => state.hmr.send(HmrMessage::Reload),
        Err(e) => tracing::error!("Rescan failed: {}", e),
    }
}

/// Fallback handler: match the request against the route table.
///
/// Uses the original URI, since nesting under the base strips it.
async fn dispatch_handler(
    State(state): State<Arc<ServerState>>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    let dispatcher = state.dispatcher().await;
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let result =
        tokio::task::spawn_blocking(move || dispatcher.dispatch(&method, &path, &headers)).await;

    match result {
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::error!("Dispatch task failed: {}", e);
            DispatchResponse::internal_error().into_response()
        }
    }
}

/// Handler for the live reload WebSocket.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: Arc<ServerState>) {
    let mut rx = state.hmr.subscribe();

    if send_message(&mut socket, &HmrMessage::Connected).await.is_err() {
        return;
    }

    while let Some(msg) = next_message(&mut rx).await {
        if send_message(&mut socket, &msg).await.is_err() {
            break;
        }
    }
}

async fn send_message(socket: &mut WebSocket, msg: &HmrMessage) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("Failed to encode live reload message: {}", e);
            return Ok(());
        }
    };
    socket.send(Message::Text(json.into())).await
}

async fn hmr_script_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], hmr_client_script())
}

/// Serve the current site config as an ES module.
async fn app_script_handler(State(state): State<Arc<ServerState>>) -> Response {
    let dispatcher = state.dispatcher().await;

    match serde_json::to_string(dispatcher.site().as_ref()) {
        Ok(json) => (
            [(header::CONTENT_TYPE, "application/javascript")],
            format!("export const config = {};\n", json),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to serialize site config: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn theme_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], theme_css())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::fs;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    fn project() -> (TempDir, SiteConfig) {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("public")).unwrap();
        fs::create_dir_all(root.join("api")).unwrap();
        fs::write(root.join("index.md"), "---\ntitle: Home\n---\n# Welcome").unwrap();
        fs::write(root.join("api/ping.json"), r#"{ "GET": "pong" }"#).unwrap();
        fs::write(root.join("public/robots.txt"), "User-agent: *").unwrap();

        let site = SiteConfig {
            routes_dir: root.to_path_buf(),
            out_dir: root.join("dist"),
            ..Default::default()
        };
        (temp, site)
    }

    async fn request(app: Router, method: Method, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn serves_pages_endpoints_and_public_files() {
        let (_temp, site) = project();
        let app = router(Arc::new(ServerState::new(site).await.unwrap()));

        let (status, body) = request(app.clone(), Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>Home | svedocs</title>"));
        assert!(body.contains(HMR_SCRIPT_PATH));

        let (_, body) = request(app.clone(), Method::GET, "/api/ping").await;
        assert_eq!(body, "pong");

        let (_, body) = request(app.clone(), Method::GET, "/robots.txt").await;
        assert_eq!(body, "User-agent: *");

        let (status, body) = request(app, Method::POST, "/api/ping").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "not-found");
    }

    #[tokio::test]
    async fn serves_dev_assets() {
        let (_temp, site) = project();
        let app = router(Arc::new(ServerState::new(site).await.unwrap()));

        let (_, body) = request(app.clone(), Method::GET, APP_SCRIPT_PATH).await;
        assert!(body.starts_with("export const config = {"));
        assert!(body.contains(r#""title":"svedocs""#));

        let (_, body) = request(app.clone(), Method::GET, THEME_CSS_PATH).await;
        assert!(body.contains(".svedocs-content"));

        let (_, body) = request(app, Method::GET, HMR_SCRIPT_PATH).await;
        assert!(body.contains("WebSocket"));
    }

    #[tokio::test]
    async fn rescan_picks_up_new_files() {
        let (temp, site) = project();
        let state = Arc::new(ServerState::new(site).await.unwrap());
        let mut rx = state.hmr.subscribe();

        let (status, _) = request(router(Arc::clone(&state)), Method::GET, "/guide").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        fs::write(temp.path().join("guide.md"), "# Guide").unwrap();
        state.rescan().await.unwrap();

        let (status, body) = request(router(Arc::clone(&state)), Method::GET, "/guide").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Guide"));

        assert_eq!(
            rx.try_recv().unwrap(),
            HmrMessage::RoutesUpdated {
                routes: vec!["/".to_string(), "/guide".to_string()]
            }
        );
    }

    #[tokio::test]
    async fn serves_public_files_under_base() {
        let (_temp, site) = project();
        let site = SiteConfig {
            base: "/docs".to_string(),
            ..site
        };
        let app = router(Arc::new(ServerState::new(site).await.unwrap()));

        let (status, body) = request(app.clone(), Method::GET, "/docs/robots.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "User-agent: *");

        let (status, body) = request(app.clone(), Method::GET, "/docs/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>Home | svedocs</title>"));

        let (status, _) = request(app.clone(), Method::GET, "/docs/api/ping").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = request(app, Method::GET, "/robots.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "not-found");
    }

    #[test]
    fn ignores_output_and_hidden_paths() {
        let routes = Path::new("/site");
        let out = Path::new("/site/dist");

        assert!(is_relevant(&WatchEvent::Modified("/site/a.md".into()), routes, out));
        assert!(!is_relevant(&WatchEvent::Modified("/site/dist/index.html".into()), routes, out));
        assert!(!is_relevant(&WatchEvent::Created("/site/.git/HEAD".into()), routes, out));
    }
}
