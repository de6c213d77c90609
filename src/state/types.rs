//! Processing state types
//!
//! These types are serialized to JSON and persisted between invocations.

use crate::controller::RunOptions;
use crate::policy::CollisionWindow;
use crate::profile::SchemaProfile;
use crate::types::WriteDisposition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Queue
// ============================================================================

/// One queued input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Location of the file on disk
    pub path: PathBuf,
}

impl FileRef {
    /// Create a file reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File name for logs
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned())
    }

    /// Path on disk
    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ============================================================================
// Log
// ============================================================================

/// What happened to one file, or to the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Rows staged and committed
    Loaded {
        rows: usize,
        dropped: usize,
        disposition: WriteDisposition,
        /// Destination rows deleted by an overwrite
        #[serde(default)]
        overwritten: usize,
        /// The collision probe failed and the load went ahead anyway
        #[serde(default)]
        unverified: bool,
    },
    /// The cutoff filter left nothing to load
    NoRowsAdmitted { dropped: usize },
    /// The file's date window already exists in the destination
    SkippedDuplicate { window: CollisionWindow },
    /// Per-file error, queue continues
    Failed { error: String },
    /// Fatal error, run halted at this file
    Halted { error: String },
    /// Final tally once the queue is exhausted
    Summary {
        files: usize,
        loaded: usize,
        skipped: usize,
        failed: usize,
        rows: usize,
    },
}

/// One audit log line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// File the entry is about, absent for run-level entries
    #[serde(default)]
    pub file: Option<String>,
    /// What happened
    pub outcome: Outcome,
    /// When it happened
    pub at: DateTime<Utc>,
}

impl LogEntry {
    /// Entry about one file
    pub fn file(file: &FileRef, outcome: Outcome) -> Self {
        Self {
            file: Some(file.name()),
            outcome,
            at: Utc::now(),
        }
    }

    /// Run-level entry
    pub fn run(outcome: Outcome) -> Self {
        Self {
            file: None,
            outcome,
            at: Utc::now(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{file}: ")?;
        }

        match &self.outcome {
            Outcome::Loaded {
                rows,
                dropped,
                disposition,
                overwritten,
                unverified,
            } => {
                write!(f, "loaded {rows} rows ({disposition})")?;
                if *dropped > 0 {
                    write!(f, ", {dropped} dropped by cutoff")?;
                }
                if *overwritten > 0 {
                    write!(f, ", {overwritten} existing rows overwritten")?;
                }
                if *unverified {
                    write!(f, ", duplicate check unavailable")?;
                }
                Ok(())
            }
            Outcome::NoRowsAdmitted { dropped } => {
                write!(f, "no rows admitted ({dropped} dropped by cutoff)")
            }
            Outcome::SkippedDuplicate { window } => {
                write!(f, "skipped, duplicate window {window}")
            }
            Outcome::Failed { error } => write!(f, "failed: {error}"),
            Outcome::Halted { error } => write!(f, "halted: {error}"),
            Outcome::Summary {
                files,
                loaded,
                skipped,
                failed,
                rows,
            } => write!(
                f,
                "completed {files} files: {loaded} loaded, {skipped} skipped, {failed} failed, {rows} rows"
            ),
        }
    }
}

// ============================================================================
// Processing State
// ============================================================================

/// Coarse controller phase derived from the state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Queue empty, not started, or halted
    Idle,
    /// Files remain and the last step asked to continue
    Running,
    /// Every queued file has been processed
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Running => write!(f, "running"),
            Phase::Completed => write!(f, "completed"),
        }
    }
}

/// Progress through a file queue
///
/// `index` never exceeds `queue.len()`; equality means completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingState {
    /// Scopes staging keys to this run
    pub run_id: String,
    /// Files in processing order
    pub queue: Vec<FileRef>,
    /// Next file to process
    pub index: usize,
    /// Whether the controller expects another step
    pub running: bool,
    /// Audit log, one entry per processed file plus the summary
    pub log: Vec<LogEntry>,
    /// Whether this run already replaced the destination table
    #[serde(default)]
    pub table_replaced: bool,
}

impl Default for ProcessingState {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ProcessingState {
    /// Fresh state for a queue of files
    pub fn new(queue: Vec<FileRef>) -> Self {
        Self {
            run_id: new_run_id(),
            queue,
            index: 0,
            running: false,
            log: Vec::new(),
            table_replaced: false,
        }
    }

    /// The `{[], 0, false, []}` state, with a fresh run id
    #[must_use]
    pub fn reset() -> Self {
        Self::default()
    }

    /// Number of queued files
    pub fn total(&self) -> usize {
        self.queue.len()
    }

    /// Whether every queued file has been processed
    pub fn is_complete(&self) -> bool {
        self.index >= self.queue.len()
    }

    /// The file the next step will process
    pub fn current(&self) -> Option<&FileRef> {
        self.queue.get(self.index)
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        if self.queue.is_empty() {
            Phase::Idle
        } else if self.is_complete() {
            Phase::Completed
        } else if self.running {
            Phase::Running
        } else {
            Phase::Idle
        }
    }

    /// Whether the last step hit a fatal error
    pub fn is_halted(&self) -> bool {
        !self.running
            && self
                .log
                .last()
                .is_some_and(|e| matches!(e.outcome, Outcome::Halted { .. }))
    }

    /// Tally of the per-file outcomes logged so far
    pub fn summary(&self) -> Outcome {
        let mut loaded = 0;
        let mut skipped = 0;
        let mut failed = 0;
        let mut rows = 0;

        for entry in &self.log {
            match &entry.outcome {
                Outcome::Loaded { rows: n, .. } => {
                    loaded += 1;
                    rows += n;
                }
                Outcome::NoRowsAdmitted { .. } | Outcome::SkippedDuplicate { .. } => skipped += 1,
                Outcome::Failed { .. } => failed += 1,
                Outcome::Halted { .. } | Outcome::Summary { .. } => {}
            }
        }

        Outcome::Summary {
            files: self.queue.len(),
            loaded,
            skipped,
            failed,
            rows,
        }
    }

    /// The caller-facing `{index, running, log}` view
    pub fn view(&self) -> StateView {
        StateView {
            index: self.index,
            running: self.running,
            log: self.log.iter().map(ToString::to_string).collect(),
            total: self.queue.len(),
            phase: self.phase(),
        }
    }
}

/// Progress as rendered by operator front-ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateView {
    /// Next file to process
    pub index: usize,
    /// Whether more steps are expected
    pub running: bool,
    /// Rendered log lines
    pub log: Vec<String>,
    /// Queue length
    pub total: usize,
    /// Current phase
    pub phase: Phase,
}

fn new_run_id() -> String {
    let date = Utc::now().format("%Y%m%d");
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{date}-{}", &id[..8])
}

// ============================================================================
// Session
// ============================================================================

/// Everything a resumed invocation needs: the selected profile, the
/// operator's options, and the processing state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Selected profile, fixed for the session
    pub profile: SchemaProfile,
    /// Cutoff and overwrite settings
    pub options: RunOptions,
    /// Progress through the queue
    pub state: ProcessingState,
}

impl Session {
    /// Start a session over a queue of files
    pub fn new(profile: SchemaProfile, options: RunOptions, queue: Vec<FileRef>) -> Self {
        Self {
            profile,
            options,
            state: ProcessingState::new(queue),
        }
    }
}
