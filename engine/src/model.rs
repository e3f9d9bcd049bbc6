//! Core data model for copy and delete runs.
//!
//! This module defines the data structures that feed the engines:
//! - ItemKey / RequestMultiset: which files to duplicate and how many times
//! - CopyJob: the immutable snapshot handed to the Copy Engine
//! - ProgressState: unit accounting owned by a running engine
//! - Outcome, CopyReport, DeleteReport: terminal results of a run

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::naming::NameTemplate;

/// Trimmed, non-empty identifier of one distinct requested file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ItemKey(String);

impl ItemKey {
    /// Build a key from a raw entry. Returns None when the trimmed entry is empty.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(ItemKey(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the key consists only of ASCII digits.
    pub fn is_numeric(&self) -> bool {
        is_all_digits(&self.0)
    }

    /// Canonical digit string with leading zeros stripped ("007" -> "7", "000" -> "0").
    ///
    /// Returns None for non-numeric keys.
    pub fn canonical_digits(&self) -> Option<&str> {
        if !self.is_numeric() {
            return None;
        }
        let stripped = self.0.trim_start_matches('0');
        Some(if stripped.is_empty() { "0" } else { stripped })
    }

    /// True if the key names a single entry inside a directory: no separators,
    /// no root or drive prefix, and not `.` or `..`.
    pub fn is_plain_file_name(&self) -> bool {
        is_plain_file_name(&self.0)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ItemKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

pub(crate) fn has_separator(s: &str) -> bool {
    s.contains(['/', '\\'])
}

fn is_plain_file_name(s: &str) -> bool {
    if has_separator(s) {
        return false;
    }
    let mut components = Path::new(s).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

pub(crate) fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Compare two digit strings by numeric value without parsing them.
fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Mapping from ItemKey to requested copy count (always >= 1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMultiset {
    counts: HashMap<ItemKey, u32>,
}

impl RequestMultiset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more request for `key`.
    pub fn add(&mut self, key: ItemKey) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    /// Add `count` requests for `key` at once. A zero count is ignored.
    pub fn add_many(&mut self, key: ItemKey, count: u32) {
        if count > 0 {
            *self.counts.entry(key).or_insert(0) += count;
        }
    }

    pub fn count(&self, key: &str) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all requested counts.
    pub fn total_copies(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    /// True if every key is purely numeric (false for an empty multiset).
    pub fn all_numeric(&self) -> bool {
        !self.counts.is_empty() && self.counts.keys().all(ItemKey::is_numeric)
    }

    /// Entries in run order: numeric ascending when all keys are numeric,
    /// lexical ascending otherwise. Ties in numeric order fall back to lexical.
    pub fn ordered(&self) -> Vec<(&ItemKey, u32)> {
        let mut entries: Vec<_> = self.counts.iter().map(|(k, &c)| (k, c)).collect();
        if self.all_numeric() {
            entries.sort_by(|(a, _), (b, _)| {
                cmp_numeric(a.as_str(), b.as_str()).then_with(|| a.cmp(b))
            });
        } else {
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        }
        entries
    }
}

/// Immutable snapshot consumed by the Copy Engine exactly once.
#[derive(Debug)]
pub struct CopyJob {
    id: Uuid,
    source_dir: PathBuf,
    dest_dir: PathBuf,
    requests: RequestMultiset,
    extension: String,
    template: Option<NameTemplate>,
}

impl CopyJob {
    /// Create a new copy job.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidJob` if the extension does not start with `.`
    /// or contains a path separator, if source and destination are the same
    /// directory, if some key is not a plain file name, or if a template is given
    /// while some key is not purely numeric.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        source_dir: P,
        dest_dir: Q,
        requests: RequestMultiset,
        extension: &str,
        template: Option<NameTemplate>,
    ) -> EngineResult<Self> {
        let source_dir = source_dir.as_ref();
        let dest_dir = dest_dir.as_ref();

        if !extension.starts_with('.') {
            return Err(EngineError::InvalidJob {
                reason: format!("extension {extension:?} must start with '.'"),
            });
        }
        if has_separator(extension) {
            return Err(EngineError::InvalidJob {
                reason: format!("extension {extension:?} must not contain a path separator"),
            });
        }

        if same_directory(source_dir, dest_dir) {
            return Err(EngineError::InvalidJob {
                reason: format!(
                    "source and destination are the same directory: {}",
                    source_dir.display()
                ),
            });
        }

        if let Some((key, _)) = requests
            .ordered()
            .into_iter()
            .find(|(k, _)| !k.is_plain_file_name())
        {
            return Err(EngineError::InvalidJob {
                reason: format!("key {:?} is not a plain file name", key.as_str()),
            });
        }

        if template.is_some() {
            if let Some((key, _)) = requests.ordered().into_iter().find(|(k, _)| !k.is_numeric()) {
                return Err(EngineError::InvalidJob {
                    reason: format!("key {:?} is not numeric but a name template is set", key.as_str()),
                });
            }
        }

        Ok(CopyJob {
            id: Uuid::new_v4(),
            source_dir: source_dir.to_path_buf(),
            dest_dir: dest_dir.to_path_buf(),
            requests,
            extension: extension.to_string(),
            template,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    pub fn requests(&self) -> &RequestMultiset {
        &self.requests
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn template(&self) -> Option<&NameTemplate> {
        self.template.as_ref()
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Unit accounting for one run. `completed_units` never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    total_units: u64,
    completed_units: u64,
}

impl ProgressState {
    pub fn new(total_units: u64) -> Self {
        ProgressState {
            total_units,
            completed_units: 0,
        }
    }

    /// Advance by `units` (saturating at the total) and return the new percentage.
    pub fn advance(&mut self, units: u64) -> u8 {
        self.completed_units = self.completed_units.saturating_add(units).min(self.total_units);
        self.percent()
    }

    /// floor(completed / total * 100); an empty run counts as complete.
    pub fn percent(&self) -> u8 {
        if self.total_units == 0 {
            return 100;
        }
        let pct = u128::from(self.completed_units) * 100 / u128::from(self.total_units);
        pct.min(100) as u8
    }

    pub fn total_units(&self) -> u64 {
        self.total_units
    }

    pub fn completed_units(&self) -> u64 {
        self.completed_units
    }
}

/// Terminal classification of one engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every item was processed without error
    Success,
    /// The run finished but some items failed
    SuccessWithErrors,
    /// Reserved for failures before a copy job exists; also a failed delete run
    Failure,
    /// Delete run aborted by request
    Canceled,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success | Outcome::SuccessWithErrors)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "Success"),
            Outcome::SuccessWithErrors => write!(f, "Success with errors"),
            Outcome::Failure => write!(f, "Failure"),
            Outcome::Canceled => write!(f, "Canceled"),
        }
    }
}

/// Summary of a finished copy run.
#[derive(Debug, Clone, Serialize)]
pub struct CopyReport {
    pub job_id: Uuid,
    pub outcome: Outcome,
    /// Destination files written
    pub copied: u64,
    /// Copies that failed with an I/O error
    pub failed: u64,
    /// Copies skipped because their source was missing
    pub skipped: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Summary of a finished delete run.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteReport {
    pub root: PathBuf,
    pub outcome: Outcome,
    /// Files and directories removed
    pub removed: u64,
    /// Entries that could not be removed or read
    pub failed: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
