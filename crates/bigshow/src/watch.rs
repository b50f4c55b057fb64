//! Watches the deck and the position token on a background thread.
//!
//! Parent directories are watched rather than the files themselves, so
//! editors that save by rename and tokens that do not exist yet are seen.
//! Changes reach the UI thread over a channel; `wake` asks it to look.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use notify_debouncer_mini::notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};

use crate::error::{Error, Result};

pub const DEBOUNCE: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Deck,
    Position,
}

#[derive(Debug, Clone, PartialEq)]
struct Target {
    path: PathBuf,
    change: Change,
}

pub struct FileWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
    changes: Receiver<Change>,
}

impl FileWatcher {
    pub fn start(watched: &[(PathBuf, Change)], wake: impl Fn() + Send + 'static) -> Result<Self> {
        let targets: Vec<Target> = watched
            .iter()
            .map(|(path, change)| Target {
                path: normalize(path),
                change: *change,
            })
            .collect();

        let (tx, changes) = mpsc::channel();
        let routes = targets.clone();
        let mut debouncer = new_debouncer(DEBOUNCE, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let paths: Vec<PathBuf> = events.into_iter().map(|e| e.path).collect();
                    let hits = classify(&routes, &paths);
                    if hits.is_empty() {
                        return;
                    }
                    for change in hits {
                        if tx.send(change).is_err() {
                            return;
                        }
                    }
                    wake();
                }
                Err(e) => log::warn!("file watcher error: {e}"),
            }
        })
        .map_err(|source| Error::Watch {
            path: targets.first().map(|t| t.path.clone()).unwrap_or_default(),
            source,
        })?;

        let mut dirs: Vec<PathBuf> = targets
            .iter()
            .filter_map(|t| t.path.parent().map(Path::to_path_buf))
            .collect();
        dirs.sort();
        dirs.dedup();
        for dir in &dirs {
            debouncer
                .watcher()
                .watch(dir, RecursiveMode::NonRecursive)
                .map_err(|source| Error::Watch {
                    path: dir.clone(),
                    source,
                })?;
            log::debug!("watching {}", dir.display());
        }

        Ok(Self {
            _debouncer: debouncer,
            changes,
        })
    }

    /// Changes seen since the last call, each kind at most once.
    pub fn drain(&self) -> Vec<Change> {
        let mut seen = Vec::new();
        for change in self.changes.try_iter() {
            if !seen.contains(&change) {
                seen.push(change);
            }
        }
        seen
    }
}

/// Which watched files the changed `paths` touch, in watch order.
fn classify(targets: &[Target], paths: &[PathBuf]) -> Vec<Change> {
    targets
        .iter()
        .filter(|t| paths.iter().any(|p| *p == t.path))
        .map(|t| t.change)
        .collect()
}

/// Absolute form of `path`, resolving the parent when the file itself does
/// not exist yet.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}
