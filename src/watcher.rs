/// Change detection for the currently open directory.
///
/// Notifications arrive on a channel from a background notify watcher and
/// are only drained when the owner polls, so a refresh is always deferred
/// to the next scheduling opportunity instead of running inside the
/// notification callback. Each pending change is tagged with the path it
/// was observed on; the session discards it if the user has navigated
/// away in the meantime.
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, TryRecvError, channel};
use std::time::Duration;

struct WatchHandle {
    // Held only to keep the background watcher alive.
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<notify::Event>>,
    path: PathBuf,
}

/// Watches one directory at a time for external changes.
///
/// State machine: `Idle` (no handle) and `Watching(path)`. A new `watch`
/// call replaces the previous handle, dropping its queued notifications.
#[derive(Default)]
pub struct DirectoryWatcher {
    handle: Option<WatchHandle>,
}

impl DirectoryWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts watching `path` non-recursively, replacing any prior watch.
    pub fn watch(&mut self, path: &Path) -> notify::Result<()> {
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default().with_poll_interval(Duration::from_millis(500)),
        )?;
        watcher.watch(path, RecursiveMode::NonRecursive)?;

        self.handle = Some(WatchHandle {
            _watcher: watcher,
            rx,
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Stops watching and drops any queued notifications.
    pub fn unwatch(&mut self) {
        self.handle = None;
    }

    /// The path currently being watched, if any.
    pub fn watched_path(&self) -> Option<&Path> {
        self.handle.as_ref().map(|h| h.path.as_path())
    }

    /// Drains queued notifications without blocking.
    ///
    /// Returns the watched path if at least one create, remove, modify or
    /// rename event was seen since the last poll. The caller decides
    /// whether that path still matches the open directory before acting.
    pub fn poll_change(&mut self) -> Option<PathBuf> {
        let handle = self.handle.as_mut()?;
        let mut changed = false;
        loop {
            match handle.rx.try_recv() {
                Ok(Ok(event)) => {
                    if !event.kind.is_access() {
                        changed = true;
                    }
                }
                Ok(Err(_)) => {}
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        changed.then(|| handle.path.clone())
    }
}
