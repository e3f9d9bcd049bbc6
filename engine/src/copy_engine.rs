//! Copy Engine.
//!
//! Duplicates each requested source file into the destination directory as
//! many times as requested. Runs sequentially; per-copy failures are logged and
//! counted, never propagated. There is no mid-run cancellation.
//!
//! Output naming:
//! - one copy: `<name><ext>`
//! - n copies: `<name> (1)<ext>` .. `<name> (n)<ext>`
//!
//! where `<name>` is the key itself, or the key formatted through the job's
//! template when one is set. Source paths always use the raw key.

use chrono::Utc;
use tracing::info_span;

use crate::error::EngineError;
use crate::events::{EventSink, Reporter};
use crate::fs_ops;
use crate::model::{CopyJob, CopyReport, ItemKey, Outcome, ProgressState};

#[derive(Debug, Default)]
struct Tally {
    copied: u64,
    failed: u64,
    skipped: u64,
}

impl Tally {
    fn had_errors(&self) -> bool {
        self.failed > 0 || self.skipped > 0
    }
}

/// Run a copy job to completion.
///
/// The job is consumed: a job executes at most once. Progress is reported after
/// every unit (success, skipped-missing, or failure) and ends at exactly 100.
/// The outcome is `Success` or `SuccessWithErrors`; never `Failure`.
pub fn run_copy_job(job: CopyJob, sink: &dyn EventSink) -> CopyReport {
    let span = info_span!("copy_job", job_id = %job.id());
    let _enter = span.enter();

    let reporter = Reporter::new(sink);
    let started_at = Utc::now();
    let requests = job.requests();
    let mut progress = ProgressState::new(requests.total_copies());
    let mut tally = Tally::default();

    reporter.info(format!(
        "Copying {} file(s) for {} item(s) from {} to {}",
        progress.total_units(),
        requests.len(),
        job.source_dir().display(),
        job.dest_dir().display()
    ));

    for (key, count) in requests.ordered() {
        copy_item(&job, key, count, &mut progress, &mut tally, &reporter);
    }

    if progress.total_units() == 0 {
        reporter.progress(progress.percent());
    }

    let outcome = if tally.had_errors() {
        Outcome::SuccessWithErrors
    } else {
        Outcome::Success
    };

    reporter.info(format!(
        "Finished: {} copied, {} failed, {} skipped ({})",
        tally.copied, tally.failed, tally.skipped, outcome
    ));
    reporter.finished(outcome);

    CopyReport {
        job_id: job.id(),
        outcome,
        copied: tally.copied,
        failed: tally.failed,
        skipped: tally.skipped,
        started_at,
        finished_at: Utc::now(),
    }
}

/// Name before the copy suffix and extension are applied.
fn resolved_base_name(job: &CopyJob, key: &ItemKey) -> String {
    match (job.template(), key.canonical_digits()) {
        (Some(template), Some(digits)) => template.format_digits(digits),
        _ => key.as_str().to_string(),
    }
}

fn copy_item(
    job: &CopyJob,
    key: &ItemKey,
    count: u32,
    progress: &mut ProgressState,
    tally: &mut Tally,
    reporter: &Reporter<'_>,
) {
    let ext = job.extension();
    let source_name = format!("{key}{ext}");
    let source = job.source_dir().join(&source_name);
    let base_name = resolved_base_name(job, key);

    for i in 1..=count {
        let output_name = if count == 1 {
            format!("{base_name}{ext}")
        } else {
            format!("{base_name} ({i}){ext}")
        };
        let dest = job.dest_dir().join(&output_name);
        let existed = dest.exists();

        match fs_ops::copy_file(&source, &dest) {
            Ok(bytes) => {
                if existed {
                    reporter.warning(format!("Overwrote existing file {output_name}"));
                }
                reporter.info(format!("Copied {source_name} -> {output_name} ({bytes} bytes)"));
                tally.copied += 1;
                reporter.progress(progress.advance(1));
            }
            Err(EngineError::SourceMissing { .. }) => {
                // Missing source skips every remaining copy of this key.
                let remaining = u64::from(count - i + 1);
                reporter.error(format!(
                    "Source file {source_name} for item {key} not found; skipping {remaining} {}",
                    if remaining == 1 { "copy" } else { "copies" }
                ));
                tally.skipped += remaining;
                reporter.progress(progress.advance(remaining));
                return;
            }
            Err(e) => {
                reporter.error(format!("Failed to copy {output_name}: {}", e.describe()));
                tally.failed += 1;
                reporter.progress(progress.advance(1));
            }
        }
    }
}
