//! WebSocket live reload.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// URL path of the live reload socket.
pub const HMR_SOCKET_PATH: &str = "/__hmr";

/// URL path of the live reload client script.
pub const HMR_SCRIPT_PATH: &str = "/__hmr.js";

/// Messages sent to connected browsers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HmrMessage {
    /// Connection established
    Connected,

    /// Full page reload
    Reload,

    /// The route table was rebuilt
    RoutesUpdated {
        /// Page paths after the rescan
        routes: Vec<String>,
    },
}

/// Hub for broadcasting messages to all connected clients.
#[derive(Debug, Clone)]
pub struct HmrHub {
    sender: broadcast::Sender<HmrMessage>,
}

impl HmrHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a message to all connected clients.
    pub fn send(&self, msg: HmrMessage) {
        // No receivers is fine
        let _ = self.sender.send(msg);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HmrMessage> {
        self.sender.subscribe()
    }

    /// Number of connected clients.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Wait for the next message for one client.
///
/// A client that fell behind gets a [`HmrMessage::Reload`] in place of the
/// messages it missed. Returns `None` once the hub is gone.
pub async fn next_message(rx: &mut broadcast::Receiver<HmrMessage>) -> Option<HmrMessage> {
    match rx.recv().await {
        Ok(msg) => Some(msg),
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
            tracing::debug!("Live reload client lagged by {} messages", skipped);
            Some(HmrMessage::Reload)
        }
        Err(broadcast::error::RecvError::Closed) => None,
    }
}

impl Default for HmrHub {
    fn default() -> Self {
        Self::new()
    }
}

/// The client-side live reload script.
///
/// Connects back to the host that served the page, so it works behind any
/// host and port.
pub fn hmr_client_script() -> String {
    format!(
        r#"(function() {{
  'use strict';

  const protocol = location.protocol === 'https:' ? 'wss://' : 'ws://';
  const ws = new WebSocket(protocol + location.host + '{}');

  ws.onmessage = function(event) {{
    const msg = JSON.parse(event.data);

    switch (msg.type) {{
      case 'reload':
        location.reload();
        break;

      case 'routes_updated':
        console.log('[svedocs] routes updated:', msg.routes.length);
        break;

      case 'connected':
        console.log('[svedocs] live reload connected');
        break;
    }}
  }};

  ws.onclose = function() {{
    console.log('[svedocs] disconnected, retrying');
    setTimeout(function() {{ location.reload(); }}, 1000);
  }};
}})();
"#,
        HMR_SOCKET_PATH
    )
}
