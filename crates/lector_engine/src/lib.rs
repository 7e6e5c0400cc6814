//! Lector engine: batch controller, extraction worker seam and output
//! persistence.
mod controller;
mod output;
mod types;
mod worker;

pub use controller::{BatchController, ControllerSettings, SubmitStats};
pub use output::{ensure_destination_dir, OutputError, SequentialTextWriter};
pub use types::{BatchEvent, ExtractError, ExtractFailure, Extraction, WorkerEvent};
pub use worker::{ChannelSink, Extractor, ProgressSink, SimulatedExtractor};
