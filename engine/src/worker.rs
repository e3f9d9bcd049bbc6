//! Background workers.
//!
//! Each engine run gets one dedicated thread. The caller keeps a handle with
//! the event receiver and joins it for the final report. Only delete runs can
//! be canceled.

use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver};
use uuid::Uuid;

use crate::copy_engine::run_copy_job;
use crate::delete_engine::{run_delete, CancelToken};
use crate::error::{EngineError, EngineResult};
use crate::events::{ChannelSink, EngineEvent};
use crate::model::{CopyJob, CopyReport, DeleteReport};

/// Handle to a running copy job.
#[derive(Debug)]
pub struct CopyHandle {
    job_id: Uuid,
    events: Receiver<EngineEvent>,
    thread: JoinHandle<CopyReport>,
}

impl CopyHandle {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Progress, log, and finish events in emission order.
    pub fn events(&self) -> &Receiver<EngineEvent> {
        &self.events
    }

    /// Wait for the run to finish.
    pub fn join(self) -> EngineResult<CopyReport> {
        self.thread.join().map_err(|_| EngineError::WorkerPanicked)
    }
}

/// Handle to a running delete run.
#[derive(Debug)]
pub struct DeleteHandle {
    cancel: CancelToken,
    events: Receiver<EngineEvent>,
    thread: JoinHandle<DeleteReport>,
}

impl DeleteHandle {
    /// Request cancellation. The engine stops before its next removal.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A clone of the cancellation flag, e.g. for a signal handler.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn events(&self) -> &Receiver<EngineEvent> {
        &self.events
    }

    pub fn join(self) -> EngineResult<DeleteReport> {
        self.thread.join().map_err(|_| EngineError::WorkerPanicked)
    }
}

/// Spawn a background worker thread to execute a copy job.
pub fn spawn_copy(job: CopyJob) -> EngineResult<CopyHandle> {
    let (tx, rx) = unbounded();
    let job_id = job.id();

    let thread = thread::Builder::new()
        .name("copy-engine".to_string())
        .spawn(move || {
            let sink = ChannelSink::new(tx);
            run_copy_job(job, &sink)
        })
        .map_err(|source| EngineError::WorkerSpawn { source })?;

    Ok(CopyHandle {
        job_id,
        events: rx,
        thread,
    })
}

/// Spawn a background worker thread to empty `root`.
pub fn spawn_delete(root: impl Into<PathBuf>) -> EngineResult<DeleteHandle> {
    spawn_delete_with(root, CancelToken::new())
}

/// Same as `spawn_delete`, using a caller-provided cancellation flag.
pub fn spawn_delete_with(root: impl Into<PathBuf>, cancel: CancelToken) -> EngineResult<DeleteHandle> {
    let root = root.into();
    let (tx, rx) = unbounded();
    let worker_cancel = cancel.clone();

    let thread = thread::Builder::new()
        .name("delete-engine".to_string())
        .spawn(move || {
            let sink = ChannelSink::new(tx);
            run_delete(&root, &worker_cancel, &sink)
        })
        .map_err(|source| EngineError::WorkerSpawn { source })?;

    Ok(DeleteHandle {
        cancel,
        events: rx,
        thread,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemKey, Outcome, RequestMultiset};
    use std::fs;

    #[test]
    fn test_spawn_copy_streams_events_then_finishes() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir(&src).expect("Failed to create src dir");
        fs::write(src.join("1.jpg"), b"one").expect("Failed to write");
        fs::write(src.join("2.jpg"), b"two").expect("Failed to write");

        let mut requests = RequestMultiset::new();
        requests.add_many(ItemKey::new("1").expect("key"), 2);
        requests.add(ItemKey::new("2").expect("key"));
        let job = CopyJob::new(&src, &dst, requests, ".jpg", None).expect("Failed to create job");

        let handle = spawn_copy(job).expect("Failed to spawn copy worker");
        let events: Vec<_> = handle.events().iter().collect();
        let report = handle.join().expect("worker finished");

        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(events.last(), Some(&EngineEvent::Finished(Outcome::Success)));
        let progress: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![33, 66, 100]);
    }

    #[test]
    fn test_spawn_delete_canceled_up_front() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp_dir.path().join("out");
        fs::create_dir(&root).expect("Failed to create dir");
        fs::write(root.join("keep.txt"), b"k").expect("Failed to write");

        let token = CancelToken::new();
        token.cancel();
        let handle = spawn_delete_with(&root, token).expect("Failed to spawn delete worker");
        let report = handle.join().expect("worker finished");

        assert_eq!(report.outcome, Outcome::Canceled);
        assert!(root.join("keep.txt").exists());
    }

    #[test]
    fn test_spawn_delete_empties_root() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp_dir.path().join("out");
        fs::create_dir_all(root.join("x").join("y")).expect("Failed to create dirs");
        fs::write(root.join("x").join("y").join("z.txt"), b"z").expect("Failed to write");

        let handle = spawn_delete(&root).expect("Failed to spawn delete worker");
        let report = handle.join().expect("worker finished");

        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(report.removed, 3);
        assert!(root.is_dir());
        assert_eq!(fs::read_dir(&root).expect("read dir").count(), 0);
    }
}
