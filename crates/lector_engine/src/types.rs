use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use lector_core::{JobState, RunSummary};

/// Events a worker reports over its lifetime: zero or more progress
/// percentages, then exactly one terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    Progress(u8),
    Finished(Result<Extraction, ExtractError>),
}

/// Successful outcome of one document extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub duration: Duration,
}

/// Failed outcome of one document extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractError {
    pub kind: ExtractFailure,
    pub message: String,
    pub duration: Duration,
}

impl ExtractError {
    pub fn new(kind: ExtractFailure, message: impl Into<String>, duration: Duration) -> Self {
        Self {
            kind,
            message: message.into(),
            duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractFailure {
    UnsupportedFormat { extension: Option<String> },
    Cancelled,
    Io,
    Engine,
}

impl fmt::Display for ExtractFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractFailure::UnsupportedFormat { extension: Some(ext) } => {
                write!(f, "unsupported document format .{ext}")
            }
            ExtractFailure::UnsupportedFormat { extension: None } => {
                write!(f, "unsupported document format")
            }
            ExtractFailure::Cancelled => write!(f, "cancelled"),
            ExtractFailure::Io => write!(f, "io error"),
            ExtractFailure::Engine => write!(f, "extraction error"),
        }
    }
}

/// Notifications the controller delivers over its event channel.
///
/// Per job the order is: zero or more `JobProgress`, then (on success) one
/// `JobText`, then the terminal `JobState`. Terminal notification of job
/// *i* always precedes the `Running` notification of job *i+1*. `Tick`
/// events interleave freely; `RunSummary` is always last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// A job entered a new state.
    JobState {
        path: PathBuf,
        state: JobState,
        message: Option<String>,
        duration: Option<Duration>,
    },
    /// Progress of the in-flight job, as reported by its worker.
    JobProgress { path: PathBuf, percent: u8 },
    /// Extracted text of a job about to be marked `Succeeded`.
    JobText { path: PathBuf, text: String },
    /// Periodic heartbeat while a run is active.
    Tick {
        completed: usize,
        total: usize,
        elapsed_label: String,
        remaining_label: Option<String>,
    },
    /// Aggregate outcome, emitted exactly once per run.
    RunSummary(RunSummary),
}
