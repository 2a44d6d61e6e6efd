//! Settle-delay debouncing for the auto-add watcher.
//!
//! A file dropped into the auto-add directory produces a burst of create and
//! modify events while it is being written. Each event pushes the path's
//! deadline out by the settle delay; a path becomes ready only once it has
//! been quiet that long. A removal cancels the pending ingest.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Kind of filesystem event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FsEventKind {
    Created,
    Modified,
    Removed,
}

/// A settled path ready for ingestion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ReadyFile {
    pub(crate) path: PathBuf,
    pub(crate) kind: FsEventKind,
}

struct Pending {
    kind: FsEventKind,
    deadline: Instant,
}

/// Thread-safe settle debouncer.
pub(crate) struct SettleDebouncer {
    pending: Mutex<HashMap<PathBuf, Pending>>,
    settle: Duration,
}

impl SettleDebouncer {
    pub(crate) fn new(settle: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            settle,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Pending>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an event for `path`, restarting its settle timer.
    pub(crate) fn record(&self, path: PathBuf, kind: FsEventKind) {
        let mut pending = self.lock();
        let deadline = Instant::now() + self.settle;

        match pending.entry(path) {
            Entry::Vacant(entry) => {
                if kind != FsEventKind::Removed {
                    entry.insert(Pending { kind, deadline });
                }
            }
            Entry::Occupied(mut entry) => match Self::coalesce(entry.get().kind, kind) {
                Some(kind) => {
                    let pending = entry.get_mut();
                    pending.kind = kind;
                    pending.deadline = deadline;
                }
                None => {
                    entry.remove();
                }
            },
        }
    }

    /// Coalesce two event kinds. `None` cancels the pending ingest.
    fn coalesce(existing: FsEventKind, new: FsEventKind) -> Option<FsEventKind> {
        use FsEventKind::{Created, Modified, Removed};

        match (existing, new) {
            (_, Removed) | (Removed, _) => None,
            (Created, _) | (_, Created) => Some(Created),
            (Modified, Modified) => Some(Modified),
        }
    }

    /// Take every path whose settle deadline has passed.
    pub(crate) fn drain_ready(&self) -> Vec<ReadyFile> {
        let mut pending = self.lock();
        let now = Instant::now();
        let mut ready = Vec::new();

        pending.retain(|path, event| {
            if event.deadline <= now {
                ready.push(ReadyFile {
                    path: path.clone(),
                    kind: event.kind,
                });
                false
            } else {
                true
            }
        });
        ready.sort_by(|a, b| a.path.cmp(&b.path));
        ready
    }

    /// Number of paths still settling.
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_event_not_ready_before_settle() {
        let debouncer = SettleDebouncer::new(Duration::from_secs(60));
        debouncer.record(PathBuf::from("/inbox/a.epub"), FsEventKind::Created);

        assert!(debouncer.drain_ready().is_empty());
        assert_eq!(debouncer.len(), 1);
    }

    #[test]
    fn test_burst_coalesces_to_one_ingest() {
        let debouncer = SettleDebouncer::new(Duration::from_millis(10));
        let path = PathBuf::from("/inbox/a.epub");

        debouncer.record(path.clone(), FsEventKind::Created);
        debouncer.record(path.clone(), FsEventKind::Modified);
        debouncer.record(path.clone(), FsEventKind::Modified);

        thread::sleep(Duration::from_millis(20));

        assert_eq!(
            debouncer.drain_ready(),
            vec![ReadyFile {
                path,
                kind: FsEventKind::Created
            }]
        );
        assert_eq!(debouncer.len(), 0);
    }

    #[test]
    fn test_removed_cancels_pending() {
        let debouncer = SettleDebouncer::new(Duration::from_millis(10));
        let path = PathBuf::from("/inbox/a.epub");

        debouncer.record(path.clone(), FsEventKind::Created);
        debouncer.record(path, FsEventKind::Removed);

        thread::sleep(Duration::from_millis(20));
        assert!(debouncer.drain_ready().is_empty());
    }

    #[test]
    fn test_removed_alone_is_ignored() {
        let debouncer = SettleDebouncer::new(Duration::from_millis(10));
        debouncer.record(PathBuf::from("/inbox/a.epub"), FsEventKind::Removed);

        assert_eq!(debouncer.len(), 0);
    }

    #[test]
    fn test_paths_are_independent() {
        let debouncer = SettleDebouncer::new(Duration::from_millis(10));

        debouncer.record(PathBuf::from("/inbox/b.epub"), FsEventKind::Modified);
        debouncer.record(PathBuf::from("/inbox/a.epub"), FsEventKind::Created);

        thread::sleep(Duration::from_millis(20));

        let paths: Vec<PathBuf> = debouncer.drain_ready().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("/inbox/a.epub"), PathBuf::from("/inbox/b.epub")]
        );
    }

    #[test]
    fn test_coalesce_all_combinations() {
        use FsEventKind::{Created, Modified, Removed};

        assert_eq!(SettleDebouncer::coalesce(Created, Created), Some(Created));
        assert_eq!(SettleDebouncer::coalesce(Created, Modified), Some(Created));
        assert_eq!(SettleDebouncer::coalesce(Created, Removed), None);
        assert_eq!(SettleDebouncer::coalesce(Modified, Created), Some(Created));
        assert_eq!(SettleDebouncer::coalesce(Modified, Modified), Some(Modified));
        assert_eq!(SettleDebouncer::coalesce(Modified, Removed), None);
    }
}
