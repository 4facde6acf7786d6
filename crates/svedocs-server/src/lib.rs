//! Request dispatch and the development server for svedocs.
//!
//! The [`Dispatcher`] matches requests against a route table and renders
//! pages or runs endpoint handlers. The [`DevServer`] keeps a dispatcher
//! up to date with the routes directory and reloads connected browsers
//! when files change.

pub mod dispatch;
pub mod server;
pub mod watcher;
pub mod websocket;

pub use dispatch::{DispatchResponse, Dispatcher, NOT_FOUND_BODY};
pub use server::{DevServer, APP_SCRIPT_PATH};
pub use watcher::{FileWatcher, WatchEvent};
pub use websocket::{HmrHub, HmrMessage};

use std::net::SocketAddr;

use svedocs_render::RenderError;
use svedocs_routes::ResolveError;

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid listen address: {0}")]
    Address(String),

    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("File watch error: {0}")]
    Watch(String),

    #[error("Route scan failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Render setup failed: {0}")]
    Render(#[from] RenderError),

    #[error("Background task failed: {0}")]
    Task(String),
}
