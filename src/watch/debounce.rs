//! Event coalescing for file-system watches.
//!
//! A settle timer: each raw event (re)arms the window, and the pending
//! changes are released only once the window elapses with no further
//! events — at most one handler invocation per burst of editor writes.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashSet;

/// Stability window for coalescing editor write bursts.
pub const SETTLE_MS: u64 = 128;

#[derive(Debug, Default)]
pub struct Debouncer {
    changed: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a raw notify event. Metadata-only modifications (mtime/chmod
    /// noise) and editor temp files are ignored.
    pub fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        match event.kind {
            EventKind::Create(_) | EventKind::Remove(_) => {}
            EventKind::Modify(modify) => {
                if matches!(modify, notify::event::ModifyKind::Metadata(_)) {
                    return;
                }
            }
            _ => return,
        }

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            self.changed.insert(path.clone());
            self.last_event = Some(Instant::now());
        }
    }

    /// Release the changed paths if the settle window has elapsed.
    pub fn take_if_settled(&mut self) -> Option<FxHashSet<PathBuf>> {
        if !self.is_settled() {
            return None;
        }
        self.last_event = None;
        Some(std::mem::take(&mut self.changed))
    }

    fn is_settled(&self) -> bool {
        !self.changed.is_empty()
            && self
                .last_event
                .is_some_and(|at| at.elapsed() >= Duration::from_millis(SETTLE_MS))
    }

    /// How long the watch loop may sleep before the next possible release.
    pub fn sleep_duration(&self) -> Duration {
        match self.last_event {
            None => Duration::from_secs(86400),
            Some(at) => Duration::from_millis(SETTLE_MS)
                .saturating_sub(at.elapsed())
                .max(Duration::from_millis(1)),
        }
    }
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
