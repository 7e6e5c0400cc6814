use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ControlError;

/// Lifecycle of a single document job.
///
/// Transitions are monotonic: a job never returns to an earlier state and
/// reaches at most one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Queued,
    Running,
    Succeeded,
    Failed,
    Stopped,
    Cancelled,
}

impl JobState {
    /// True for states from which no further transition occurs.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Stopped | JobState::Cancelled
        )
    }

    // Position in the forward-only lifecycle; terminal states share a rank.
    fn rank(self) -> u8 {
        match self {
            JobState::Pending => 0,
            JobState::Queued => 1,
            JobState::Running => 2,
            JobState::Succeeded
            | JobState::Failed
            | JobState::Stopped
            | JobState::Cancelled => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
            JobState::Stopped => "stopped",
            JobState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One document's extraction task and its tracked state.
///
/// Identity is the document path, unique within the queue. Owned by
/// [`JobQueue`]; read by listeners via snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub path: PathBuf,
    pub display_name: String,
    pub state: JobState,
    pub message: Option<String>,
    pub duration: Option<Duration>,
    /// Position in submission order.
    pub index: usize,
}

impl Job {
    fn new(path: PathBuf, index: usize) -> Self {
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            display_name,
            state: JobState::Pending,
            message: None,
            duration: None,
            index,
        }
    }
}

/// Ordered job list with safe mutation and query primitives.
///
/// Only ever mutated from the controller's single execution context, so it
/// carries no concurrency control of its own.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: Vec<Job>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one job in `Pending` state at the end of the queue.
    ///
    /// A path already present is rejected and the queue is left untouched.
    pub fn submit(&mut self, path: impl Into<PathBuf>) -> Result<(), ControlError> {
        let path = path.into();
        if self.jobs.iter().any(|job| job.path == path) {
            return Err(ControlError::DuplicateJob(path));
        }
        let index = self.jobs.len();
        self.jobs.push(Job::new(path, index));
        Ok(())
    }

    /// Transitions every `Pending` job to `Queued`, returning their paths in
    /// submission order. Called once at batch start.
    pub fn mark_queued(&mut self) -> Vec<PathBuf> {
        let mut queued = Vec::new();
        for job in &mut self.jobs {
            if job.state == JobState::Pending {
                job.state = JobState::Queued;
                queued.push(job.path.clone());
            }
        }
        queued
    }

    /// First job still waiting its turn, or `None` when exhausted.
    pub fn next_queued(&self) -> Option<&Job> {
        self.jobs.iter().find(|job| job.state == JobState::Queued)
    }

    pub fn job(&self, path: &Path) -> Option<&Job> {
        self.jobs.iter().find(|job| job.path == path)
    }

    /// Applies one forward transition.
    ///
    /// Returns `false` without mutating when the job is unknown, already
    /// terminal, or the transition would move backwards; the caller decides
    /// whether that attempt is worth logging.
    pub fn transition(
        &mut self,
        path: &Path,
        state: JobState,
        message: Option<String>,
        duration: Option<Duration>,
    ) -> bool {
        let Some(job) = self.jobs.iter_mut().find(|job| job.path == path) else {
            return false;
        };
        if job.state.is_terminal() || state.rank() <= job.state.rank() {
            return false;
        }
        job.state = state;
        if message.is_some() {
            job.message = message;
        }
        if duration.is_some() {
            job.duration = duration;
        }
        true
    }

    /// Marks every job still `Queued` as `Cancelled` in one pass, returning
    /// their paths in submission order.
    pub fn cancel_queued(&mut self) -> Vec<PathBuf> {
        let mut cancelled = Vec::new();
        for job in &mut self.jobs {
            if job.state == JobState::Queued {
                job.state = JobState::Cancelled;
                cancelled.push(job.path.clone());
            }
        }
        cancelled
    }

    /// Removes one job. The caller enforces the no-active-run rule; a
    /// `Running` job is refused here as well.
    pub fn remove(&mut self, path: &Path) -> Result<(), ControlError> {
        let Some(pos) = self.jobs.iter().position(|job| job.path == path) else {
            return Err(ControlError::UnknownJob(path.to_path_buf()));
        };
        if self.jobs[pos].state == JobState::Running {
            return Err(ControlError::RemoveWhileRunning(path.to_path_buf()));
        }
        self.jobs.remove(pos);
        for (index, job) in self.jobs.iter_mut().enumerate() {
            job.index = index;
        }
        Ok(())
    }

    /// Removes all jobs.
    pub fn clear(&mut self) {
        self.jobs.clear();
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
