use std::path::PathBuf;

use thiserror::Error;

/// Usage errors, rejected synchronously at the call that caused them.
///
/// None of these mutate queue or run state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("a batch run is already active")]
    AlreadyRunning,
    #[error("no documents queued for processing")]
    EmptyBatch,
    #[error("document is already in the queue: {}", .0.display())]
    DuplicateJob(PathBuf),
    #[error("cannot remove {} while a run is active", .0.display())]
    RemoveWhileRunning(PathBuf),
    #[error("cannot clear the queue while a run is active")]
    ClearWhileRunning,
    #[error("no such document in the queue: {}", .0.display())]
    UnknownJob(PathBuf),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
