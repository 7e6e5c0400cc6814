//! Lector core: pure batch state machine, configuration snapshot and
//! progress estimation. No IO, no clocks, no concurrency of its own.
mod config;
mod error;
mod estimate;
mod job;
mod run;

pub use config::{is_supported_document, Config, OutputMode, SUPPORTED_EXTENSIONS};
pub use error::ControlError;
pub use estimate::{estimate, format_duration};
pub use job::{Job, JobQueue, JobState};
pub use run::{BatchRun, RunSummary};
