//! Filesystem watcher feeding debounced batches to the indexer

use crate::indexer::{IndexStats, Indexer};
use anyhow::Result;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thicket_core::CACHE_DIR;
use thicket_parser::FileType;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Events emitted by the file watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// File or directory created
    Created(PathBuf),
    /// File or directory modified
    Modified(PathBuf),
    /// File or directory removed
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Created(p) | WatchEvent::Modified(p) | WatchEvent::Removed(p) => p,
        }
    }
}

/// File system watcher for monitoring code changes
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    event_rx: mpsc::UnboundedReceiver<WatchEvent>,
    watched_paths: HashSet<PathBuf>,
    root_path: PathBuf,
}

impl FileWatcher {
    /// Create a new file watcher for the given root path
    pub fn new(root_path: impl AsRef<Path>) -> Result<Self> {
        let root_path = root_path.as_ref().to_path_buf();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                debug!("File system event: {:?}", event);
                Self::handle_notify_event(event, &event_tx);
            }
            Err(e) => {
                error!("File system watch error: {}", e);
            }
        })?;

        Ok(Self {
            watcher,
            event_rx,
            watched_paths: HashSet::new(),
            root_path,
        })
    }

    /// Handle a notify event and convert to our watch events
    fn handle_notify_event(event: notify::Event, event_tx: &mpsc::UnboundedSender<WatchEvent>) {
        let make: fn(PathBuf) -> WatchEvent = match event.kind {
            notify::EventKind::Create(_) => WatchEvent::Created,
            notify::EventKind::Modify(_) => WatchEvent::Modified,
            notify::EventKind::Remove(_) => WatchEvent::Removed,
            _ => return,
        };
        for path in event.paths {
            if should_ignore_path(&path) {
                continue;
            }
            if let Err(e) = event_tx.send(make(path)) {
                warn!("Failed to send watch event: {}", e);
            }
        }
    }

    /// Watch a directory recursively
    pub fn watch_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!("Watching directory: {:?}", path);

        self.watcher.watch(path, RecursiveMode::Recursive)?;
        self.watched_paths.insert(path.to_path_buf());
        Ok(())
    }

    /// Stop watching a path
    pub fn unwatch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!("Stopping watch for: {:?}", path);

        self.watcher.unwatch(path)?;
        self.watched_paths.remove(path);
        Ok(())
    }

    /// Get the event receiver
    pub fn event_receiver(&mut self) -> &mut mpsc::UnboundedReceiver<WatchEvent> {
        &mut self.event_rx
    }

    /// Check if a path is being watched
    pub fn is_watching(&self, path: &Path) -> bool {
        self.watched_paths.contains(path)
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

/// Deduplicated work from a burst of events.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Batch {
    /// Supported source files touched by the burst
    pub paths: BTreeSet<PathBuf>,
    /// Files were created or removed, so cached filter matches are stale
    pub structural: bool,
}

impl Batch {
    pub fn from_events(events: impl IntoIterator<Item = WatchEvent>) -> Self {
        let mut batch = Batch::default();
        for event in events {
            if matches!(event, WatchEvent::Created(_) | WatchEvent::Removed(_)) {
                batch.structural = true;
            }
            if is_code_file(event.path()) {
                batch.paths.insert(event.path().to_path_buf());
            }
        }
        batch
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && !self.structural
    }
}

/// Runs the indexer on debounced batches of file changes.
pub struct WatcherService {
    watcher: FileWatcher,
    indexer: Arc<Indexer>,
    debounce: Duration,
}

impl WatcherService {
    pub fn new(indexer: Arc<Indexer>) -> Result<Self> {
        let watcher = FileWatcher::new(indexer.workspace().root())?;
        let debounce = Duration::from_millis(indexer.config().debounce_ms);
        Ok(Self {
            watcher,
            indexer,
            debounce,
        })
    }

    /// Start watching the project directory
    pub fn start_watching(&mut self) -> Result<()> {
        let root_path = self.watcher.root_path().to_path_buf();
        self.watcher.watch_directory(&root_path)?;
        info!("Started watching project directory: {:?}", root_path);
        Ok(())
    }

    /// Process batches until the event channel closes.
    pub async fn run(&mut self) -> Result<()> {
        while let Some(batch) = self.next_batch().await {
            self.process_batch(batch).await;
        }
        info!("Watcher channel closed");
        Ok(())
    }

    /// Wait for an event, then gather more until `debounce` passes without one.
    async fn next_batch(&mut self) -> Option<Batch> {
        let event_rx = self.watcher.event_receiver();
        let first = event_rx.recv().await?;
        let mut events = vec![first];
        loop {
            match tokio::time::timeout(self.debounce, event_rx.recv()).await {
                Ok(Some(event)) => events.push(event),
                Ok(None) | Err(_) => break,
            }
        }
        debug!("Debounced {} events", events.len());
        Some(Batch::from_events(events))
    }

    /// Index one batch. Pass errors are logged, never returned.
    pub async fn process_batch(&self, batch: Batch) -> Option<IndexStats> {
        if batch.structural {
            self.indexer.clear_filter_cache();
        }
        if batch.paths.is_empty() {
            return None;
        }
        let paths: Vec<PathBuf> = batch.paths.into_iter().collect();
        info!("Re-indexing {} changed files", paths.len());
        match self.indexer.index(&paths, false).await {
            Ok(stats) => {
                info!("Watcher pass: {}", stats);
                Some(stats)
            }
            Err(e) => {
                error!("Watcher pass failed: {}", e);
                None
            }
        }
    }
}

/// Check if a path is a code file we should process
fn is_code_file(path: &Path) -> bool {
    FileType::from_path(path).is_some()
}

/// Check if a path should be ignored (e.g., target/, .git/, etc.)
fn should_ignore_path(path: &Path) -> bool {
    path.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| matches!(name, "target" | ".git" | "node_modules") || name == CACHE_DIR)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_watcher_creation() {
        let temp_dir = TempDir::new().unwrap();
        let mut watcher = FileWatcher::new(temp_dir.path()).unwrap();
        watcher.watch_directory(temp_dir.path()).unwrap();
        assert!(watcher.is_watching(temp_dir.path()));
        watcher.unwatch(temp_dir.path()).unwrap();
        assert!(!watcher.is_watching(temp_dir.path()));
    }

    #[test]
    fn test_batch_dedups_and_flags_structure() {
        let batch = Batch::from_events([
            WatchEvent::Modified(PathBuf::from("/ws/a.rs")),
            WatchEvent::Modified(PathBuf::from("/ws/a.rs")),
            WatchEvent::Modified(PathBuf::from("/ws/notes.md")),
        ]);
        assert_eq!(batch.paths, BTreeSet::from([PathBuf::from("/ws/a.rs")]));
        assert!(!batch.structural);

        let batch = Batch::from_events([WatchEvent::Removed(PathBuf::from("/ws/old.py"))]);
        assert!(batch.structural);
        assert_eq!(batch.paths.len(), 1);
    }

    #[test]
    fn test_ignored_paths() {
        assert!(should_ignore_path(Path::new("/ws/target/debug/build.rs")));
        assert!(should_ignore_path(Path::new("/ws/.thicket/graph.bin")));
        assert!(!should_ignore_path(Path::new("/ws/src/main.rs")));
    }
}
