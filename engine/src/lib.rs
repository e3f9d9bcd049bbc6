//! # Multicopy Engine - File Duplication Library
//!
//! A headless engine that duplicates named source files into a destination
//! directory, a requested number of times each, and a companion engine that
//! empties a directory tree before reuse.
//! Designed as the foundation for multiple front ends (CLI, GUI, automation).
//!
//! ## Overview
//!
//! - Request multisets built from raw name lists
//! - Deterministic duplicate naming, optionally through a numeric template
//! - Per-item error isolation: failures are logged and counted, the run continues
//! - Progress and log events via a sink trait (decoupled from UI technology)
//! - Cooperative cancellation for delete runs
//!
//! ## Basic Usage
//!
//! ```no_run
//! use multicopy_engine::{request, spawn_copy, CopyJob, EngineEvent};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let built = request::build(["1", "1", "2"], false);
//! let job = CopyJob::new("photos", "out", built.requests, ".jpg", None)?;
//!
//! let handle = spawn_copy(job)?;
//! for event in handle.events() {
//!     if let EngineEvent::Progress(p) = event {
//!         println!("{p}%");
//!     }
//! }
//! let report = handle.join()?;
//! println!("{}", report.outcome);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **model**: Core data structures (ItemKey, RequestMultiset, CopyJob, Outcome)
//! - **request**: Request multiset construction
//! - **naming**: Numeric name templates
//! - **events**: Progress/log event protocol and sinks
//! - **fs_ops**: Low-level filesystem operations
//! - **copy_engine**: The Copy Engine
//! - **delete_engine**: The Delete Engine and its cancellation flag
//! - **worker**: Background threads for both engines
//! - **error**: Error types

pub mod copy_engine;
pub mod delete_engine;
pub mod error;
pub mod events;
pub mod fs_ops;
pub mod model;
pub mod naming;
pub mod request;
pub mod worker;

// Re-export main types and functions
pub use copy_engine::run_copy_job;
pub use delete_engine::{run_delete, CancelToken};
pub use error::{EngineError, EngineResult};
pub use events::{ChannelSink, EngineEvent, EventSink, LogLine, NullSink, Severity};
pub use model::{
    CopyJob, CopyReport, DeleteReport, ItemKey, Outcome, ProgressState, RequestMultiset,
};
pub use naming::{NameTemplate, DEFAULT_PLACEHOLDER};
pub use request::BuildResult;
pub use worker::{spawn_copy, spawn_delete, spawn_delete_with, CopyHandle, DeleteHandle};
