//! File watching for route rescans.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Quiet period after the last filesystem event before changes are reported.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// File was created
    Created(PathBuf),

    /// File was removed
    Removed(PathBuf),

    /// File contents or metadata changed
    Modified(PathBuf),

    /// A `svedocs.config.*` file changed
    ConfigChanged(PathBuf),
}

impl WatchEvent {
    /// Path the event is about.
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(p) | Self::Removed(p) | Self::Modified(p) | Self::ConfigChanged(p) => p,
        }
    }
}

/// Watches directories and forwards debounced events.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Watch `paths` recursively.
    ///
    /// Returns the watcher and a channel to receive events. Dropping the
    /// watcher stops the events.
    pub fn new(
        paths: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), notify::Error> {
        // Raw notify events go to the debounce thread, batches to tokio
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        // Create the watcher
        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })?;

        // Watch all paths
        for path in paths {
            if path.exists() {
                watcher.watch(path, RecursiveMode::Recursive)?;
            } else {
                tracing::warn!("Not watching missing path {}", path.display());
            }
        }

        // Debounce thread
        std::thread::spawn(move || {
            while let Ok(first) = sync_rx.recv() {
                // Collect the burst, then report each path once.
                let mut batch = vec![first];
                while let Ok(next) = sync_rx.recv_timeout(DEBOUNCE) {
                    batch.push(next);
                }

                let mut events: Vec<WatchEvent> = Vec::new();
                for event in batch {
                    for path in &event.paths {
                        if let Some(e) = classify_event(path, &event.kind) {
                            if !events.iter().any(|seen| seen.path() == e.path()) {
                                events.push(e);
                            }
                        }
                    }
                }

                // Stop once the receiver is gone
                for event in events {
                    if async_tx.blocking_send(event).is_err() {
                        return;
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Classify a notify event.
fn classify_event(path: &Path, kind: &EventKind) -> Option<WatchEvent> {
    let is_config = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("svedocs.config."));

    match kind {
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) if is_config => {
            Some(WatchEvent::ConfigChanged(path.to_path_buf()))
        }
        EventKind::Create(_) => Some(WatchEvent::Created(path.to_path_buf())),
        EventKind::Remove(_) => Some(WatchEvent::Removed(path.to_path_buf())),
        EventKind::Modify(_) => Some(WatchEvent::Modified(path.to_path_buf())),
        _ => None,
    }
}
