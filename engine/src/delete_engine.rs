//! Delete Engine.
//!
//! Empties a directory tree bottom-up and recreates the root as an empty
//! directory. Removal failures are logged and the walk continues. A shared
//! cancellation flag is checked before every removal.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info_span;

use crate::events::{EventSink, Reporter};
use crate::fs_ops::{self, RemovalEntry};
use crate::model::{DeleteReport, Outcome};

/// Cancellation flag shared between a delete run and its caller.
///
/// Cancellation is advisory: the engine observes it before each removal.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    canceled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

/// Empty `root` and recreate it.
///
/// Outcome:
/// - `Canceled` as soon as cancellation is observed, even after earlier failures
/// - `Failure` if any entry could not be removed or the root could not be recreated
/// - `Success` otherwise
///
/// A missing root is not an error; it is simply created.
pub fn run_delete(root: &Path, cancel: &CancelToken, sink: &dyn EventSink) -> DeleteReport {
    let span = info_span!("delete_run", root = %root.display());
    let _enter = span.enter();

    let reporter = Reporter::new(sink);
    let started_at = Utc::now();
    let mut removed = 0u64;
    let mut failed = 0u64;

    let finish = |outcome: Outcome, removed: u64, failed: u64| {
        reporter.finished(outcome);
        DeleteReport {
            root: root.to_path_buf(),
            outcome,
            removed,
            failed,
            started_at,
            finished_at: Utc::now(),
        }
    };

    if cancel.is_canceled() {
        reporter.warning(format!("Delete of {} canceled before start", root.display()));
        return finish(Outcome::Canceled, removed, failed);
    }

    if root.exists() {
        let plan = fs_ops::plan_removal(root);

        for err in &plan.walk_errors {
            let path = err.path().unwrap_or(root);
            reporter.error(format!("Failed to read {}: {err}", path.display()));
            failed += 1;
        }

        let total = plan.entries.len();
        for (index, entry) in plan.entries.iter().enumerate() {
            if cancel.is_canceled() {
                reporter.warning(format!(
                    "Delete canceled after removing {removed} of {total} entries"
                ));
                return finish(Outcome::Canceled, removed, failed);
            }

            reporter.info(removal_message(entry));
            match fs_ops::remove_entry(entry) {
                Ok(()) => removed += 1,
                Err(e) => {
                    reporter.error(e.describe());
                    failed += 1;
                }
            }
            reporter.progress(percent(index + 1, total));
        }
    } else {
        reporter.info(format!("{} does not exist; creating it", root.display()));
    }

    if let Err(e) = fs::create_dir_all(root) {
        reporter.error(format!("Failed to recreate {}: {e}", root.display()));
        failed += 1;
    }
    reporter.progress(100);

    let outcome = if failed > 0 {
        Outcome::Failure
    } else {
        Outcome::Success
    };
    reporter.info(format!(
        "Cleared {}: {removed} removed, {failed} failed ({outcome})",
        root.display()
    ));
    finish(outcome, removed, failed)
}

fn removal_message(entry: &RemovalEntry) -> String {
    if entry.is_dir {
        format!("Removing directory {}", entry.path.display())
    } else {
        format!("Removing file {}", entry.path.display())
    }
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (done * 100 / total).min(100) as u8
}
