//! Dependency watching.
//!
//! One watcher per render job. The watch set — entry file plus everything
//! the compiler reported reading — is watched path by path, non-recursive.
//! Raw events are debounced, and the change callback runs on the watcher
//! thread itself, so re-renders for one job never overlap.
//!
//! The callback returns the new watch set when the dependency graph
//! changed (a successful re-render with a different include list); the
//! thread then re-registers its watches. On a failed re-render the
//! callback returns `None` and the last known-good watch set stays active.

mod debounce;
pub use debounce::{Debouncer, SETTLE_MS};

use std::path::PathBuf;
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use crossbeam::channel::{self, RecvTimeoutError};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::logger::Logger;

/// Handle to a spawned watcher thread. Dropping it detaches the thread;
/// watchers hold no cross-process resources and stop at process exit.
pub struct WatchHandle {
    #[allow(dead_code)]
    thread: JoinHandle<()>,
}

/// Watch `paths`, invoking `on_change` once per settled change burst.
pub fn spawn(
    paths: Vec<PathBuf>,
    logger: Logger,
    mut on_change: impl FnMut() -> Option<Vec<PathBuf>> + Send + 'static,
) -> Result<WatchHandle> {
    let (tx, rx) = channel::unbounded();
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
        let _ = tx.send(event);
    })
    .context("failed to create file watcher")?;

    for path in &paths {
        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", path.display()))?;
    }

    let thread = std::thread::spawn(move || {
        let mut watched = paths;
        let mut debouncer = Debouncer::new();

        loop {
            match rx.recv_timeout(debouncer.sleep_duration()) {
                Ok(Ok(event)) => debouncer.add_event(&event),
                Ok(Err(err)) => logger.warn("watch", &format!("watch error: {err}")),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if let Some(changed) = debouncer.take_if_settled() {
                if let Some(path) = changed.iter().next() {
                    logger.info("watch", &format!("changed: {}", path.display()));
                }
                if let Some(new_paths) = on_change() {
                    rewatch(&mut watcher, &mut watched, new_paths, &logger);
                }
            }
        }
    });

    Ok(WatchHandle { thread })
}

/// Swap the registered watches over to the new watch set.
fn rewatch(
    watcher: &mut RecommendedWatcher,
    watched: &mut Vec<PathBuf>,
    new_paths: Vec<PathBuf>,
    logger: &Logger,
) {
    for path in watched.iter() {
        if !new_paths.contains(path)
            && let Err(err) = watcher.unwatch(path)
        {
            logger.warn("watch", &format!("failed to unwatch {}: {err}", path.display()));
        }
    }
    for path in &new_paths {
        if !watched.contains(path)
            && let Err(err) = watcher.watch(path, RecursiveMode::NonRecursive)
        {
            logger.warn("watch", &format!("failed to watch {}: {err}", path.display()));
        }
    }
    *watched = new_paths;
    logger.info("watch", &format!("watching {} files", watched.len()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    fn wait_for(count: &AtomicUsize, expected: usize, timeout: Duration) -> bool {
        let start = std::time::Instant::now();
        while start.elapsed() < timeout {
            if count.load(Ordering::SeqCst) >= expected {
                return true;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        false
    }

    #[test]
    fn test_change_fires_once_per_burst() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("style.css");
        fs::write(&file, "body{}").unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let _handle = spawn(vec![file.clone()], Logger::new(false), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            None
        })
        .unwrap();

        // Two writes in quick succession: one coalesced invocation.
        fs::write(&file, "body{color:red}").unwrap();
        fs::write(&file, "body{color:blue}").unwrap();

        assert!(wait_for(&fired, 1, Duration::from_secs(5)));
        std::thread::sleep(Duration::from_millis(2 * SETTLE_MS + 100));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_untouched_file_never_fires() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("style.css");
        fs::write(&file, "body{}").unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let _handle = spawn(vec![file], Logger::new(false), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            None
        })
        .unwrap();

        std::thread::sleep(Duration::from_millis(3 * SETTLE_MS));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
