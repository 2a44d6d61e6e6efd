//! Auto-add: watch a directory and ingest EPUB files dropped into it.

mod debouncer;
mod watcher;

pub use watcher::{IngestOptions, IngestOutcome, IngestWatcher, SourceOpener, ingest_file};
