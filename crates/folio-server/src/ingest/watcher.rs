//! Auto-add watcher.
//!
//! Watches the auto-add directory and hands every settled `*.epub` file to
//! [`Catalog::add_book`] on the blocking thread pool. Imports are recorded
//! by content digest, so a file that stays in the directory is not added
//! again after a restart or a metadata change.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use folio_catalog::{BookSource, Catalog, CatalogError, SourceError};
use md5::{Digest, Md5};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::debouncer::{FsEventKind, ReadyFile, SettleDebouncer};
use crate::error::ServerError;

/// Opens a file as a book source.
pub type SourceOpener =
    Arc<dyn Fn(&Path) -> Result<Box<dyn BookSource>, SourceError> + Send + Sync>;

/// File name pattern picked up by the watcher.
const WATCH_PATTERN: &str = "*.epub";

/// Bounds of the interval at which settled paths are polled.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);
const MAX_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What [`ingest_file`] did with a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Added as a new book with this id.
    Added(String),
    /// The same content is already in the catalog under this id.
    AlreadyImported(String),
}

impl IngestOutcome {
    /// Id of the book holding the file's content.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Added(id) | Self::AlreadyImported(id) => id,
        }
    }
}

/// Auto-add settings.
#[derive(Clone, Debug)]
pub struct IngestOptions {
    /// Directory to watch (created if missing).
    pub dir: PathBuf,
    /// Quiet time required after the last event before a file is ingested.
    pub settle_delay: Duration,
    /// Delete the file after a successful import.
    pub remove_after_import: bool,
}

/// Watches the auto-add directory.
pub struct IngestWatcher {
    options: IngestOptions,
    catalog: Arc<Catalog>,
    opener: SourceOpener,
    watcher: Option<RecommendedWatcher>,
}

impl IngestWatcher {
    #[must_use]
    pub fn new(options: IngestOptions, catalog: Arc<Catalog>, opener: SourceOpener) -> Self {
        Self {
            options,
            catalog,
            opener,
            watcher: None,
        }
    }

    /// Start watching.
    ///
    /// Files already present in the directory are queued as if they had
    /// just been created. Must be called inside a tokio runtime; the
    /// background tasks live as long as the runtime, the watch itself as
    /// long as this value.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or watched.
    pub fn start(&mut self) -> Result<(), ServerError> {
        std::fs::create_dir_all(&self.options.dir)?;

        let (tx, mut rx) = mpsc::channel::<Event>(100);
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                // Callback runs on the notify thread.
                Ok(event) => {
                    let _ = tx.blocking_send(event);
                }
                Err(e) => tracing::warn!(error = %e, "Watch error"),
            }
        })?;
        watcher.watch(&self.options.dir, RecursiveMode::NonRecursive)?;
        self.watcher = Some(watcher);

        let debouncer = Arc::new(SettleDebouncer::new(self.options.settle_delay));
        let queued = queue_existing(&self.options.dir, &debouncer)?;
        tracing::info!(
            dir = %self.options.dir.display(),
            settle_ms = self.options.settle_delay.as_secs_f64() * 1000.0,
            queued,
            "Watching auto-add directory"
        );

        let debouncer_for_record = Arc::clone(&debouncer);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                record_event(&event, &debouncer_for_record);
            }
        });

        let catalog = Arc::clone(&self.catalog);
        let opener = Arc::clone(&self.opener);
        let remove = self.options.remove_after_import;
        let poll_interval = self
            .options
            .settle_delay
            .clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            loop {
                interval.tick().await;
                for ready in debouncer.drain_ready() {
                    spawn_ingest(ready, Arc::clone(&catalog), Arc::clone(&opener), remove);
                }
            }
        });

        Ok(())
    }
}

fn spawn_ingest(ready: ReadyFile, catalog: Arc<Catalog>, opener: SourceOpener, remove: bool) {
    tokio::task::spawn_blocking(move || {
        if !ready.path.is_file() {
            tracing::debug!(path = %ready.path.display(), "Settled path is gone, skipping");
            return;
        }
        if let Err(e) = ingest_file(&catalog, &opener, &ready.path, remove) {
            tracing::error!(
                path = %ready.path.display(),
                kind = ?ready.kind,
                error = %e,
                "Auto-add failed"
            );
        }
    });
}

/// Open `path`, add it to the catalog and optionally delete the file.
///
/// Content that was imported before, and whose book still exists, is not
/// added twice. A failed import leaves the file where it is. There is no
/// retry.
///
/// # Errors
///
/// Returns the opener's or the catalog's error.
pub fn ingest_file(
    catalog: &Catalog,
    opener: &SourceOpener,
    path: &Path,
    remove_after_import: bool,
) -> Result<IngestOutcome, CatalogError> {
    let start = Instant::now();
    let digest = file_digest(path)?;

    let outcome = if let Some(id) = catalog.imported_book(&digest)? {
        tracing::info!(path = %path.display(), id = %id, "Already imported, skipping");
        IngestOutcome::AlreadyImported(id)
    } else {
        let mut source = opener(path)?;
        let id = catalog.add_book(source.as_mut())?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Err(e) = catalog.record_import(&digest, &id, &file_name) {
            tracing::warn!(path = %path.display(), error = %e, "Cannot record import");
        }
        tracing::info!(
            path = %path.display(),
            id = %id,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Imported book"
        );
        IngestOutcome::Added(id)
    };

    if remove_after_import && let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "Cannot remove imported file");
    }
    Ok(outcome)
}

/// Hex MD5 of a file's content.
fn file_digest(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Record a raw filesystem event into the debouncer.
fn record_event(event: &Event, debouncer: &SettleDebouncer) {
    let kind = match event.kind {
        EventKind::Create(_) => FsEventKind::Created,
        // chmod, touch and the like leave the content alone.
        EventKind::Modify(ModifyKind::Metadata(_)) => return,
        EventKind::Modify(_) => FsEventKind::Modified,
        EventKind::Remove(_) => FsEventKind::Removed,
        _ => return,
    };

    for path in event.paths.iter().filter(|p| matches_pattern(p)) {
        debouncer.record(path.clone(), kind);
        tracing::debug!(
            path = %path.display(),
            ?kind,
            pending = debouncer.len(),
            "Recorded auto-add event"
        );
    }
}

/// Queue every matching file already in `dir`.
fn queue_existing(dir: &Path, debouncer: &SettleDebouncer) -> std::io::Result<usize> {
    let mut queued = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && matches_pattern(&path) {
            debouncer.record(path, FsEventKind::Created);
            queued += 1;
        }
    }
    Ok(queued)
}

/// Whether the file name matches the watch pattern, ignoring case.
fn matches_pattern(path: &Path) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let options = glob::MatchOptions {
        case_sensitive: false,
        ..glob::MatchOptions::new()
    };
    glob::Pattern::new(WATCH_PATTERN)
        .is_ok_and(|pattern| pattern.matches_with(&name.to_string_lossy(), options))
}
