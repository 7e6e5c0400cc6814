use std::time::Duration;

use crate::job::{Job, JobState};

/// Bookkeeping for one invocation of start: how many jobs joined the run,
/// how far the sequential cursor has advanced, and whether a stop was
/// requested.
///
/// Invariant: the cursor only moves forward, one completed job at a time;
/// jobs before it are terminal, jobs at or after it are still to come.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRun {
    total: usize,
    cursor: usize,
    cancel_requested: bool,
}

impl BatchRun {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            cursor: 0,
            cancel_requested: false,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Index of the job currently running or about to run.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Advances past one completed job.
    pub fn advance(&mut self) {
        debug_assert!(self.cursor < self.total);
        self.cursor = (self.cursor + 1).min(self.total);
    }

    /// Raises the cancellation flag. Returns `false` when it was already
    /// raised, so repeated stop requests collapse into one.
    pub fn request_cancel(&mut self) -> bool {
        if self.cancel_requested {
            return false;
        }
        self.cancel_requested = true;
        true
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    pub fn exhausted(&self) -> bool {
        self.cursor >= self.total
    }
}

/// Aggregate outcome of a finished run, emitted once after completion or
/// cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub stopped: usize,
    pub cancelled: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Tallies the terminal jobs of a finished run. Non-terminal jobs (for
    /// example submitted while the run was active) are not part of it.
    pub fn tally<'a>(jobs: impl IntoIterator<Item = &'a Job>, elapsed: Duration) -> Self {
        let mut summary = Self {
            total: 0,
            succeeded: 0,
            failed: 0,
            stopped: 0,
            cancelled: 0,
            elapsed,
        };
        for job in jobs {
            match job.state {
                JobState::Succeeded => summary.succeeded += 1,
                JobState::Failed => summary.failed += 1,
                JobState::Stopped => summary.stopped += 1,
                JobState::Cancelled => summary.cancelled += 1,
                JobState::Pending | JobState::Queued | JobState::Running => continue,
            }
            summary.total += 1;
        }
        summary
    }
}
