use std::path::Path;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use lector_core::{is_supported_document, Config};

use crate::{ExtractError, ExtractFailure, Extraction, WorkerEvent};

/// Receives progress percentages from a worker as they happen.
pub trait ProgressSink: Send + Sync {
    fn progress(&self, percent: u8);
}

/// Sink that forwards progress onto the controller's worker-event channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<WorkerEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<WorkerEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelSink {
    fn progress(&self, percent: u8) {
        let _ = self.tx.send(WorkerEvent::Progress(percent));
    }
}

/// One document's extraction capability.
///
/// Implementations run in their own task, may emit progress through the
/// sink (non-decreasing, 100 only on success), and resolve to exactly one
/// terminal outcome. Once the token is cancelled they must return within
/// bounded time.
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(
        &self,
        path: &Path,
        config: &Config,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Extraction, ExtractError>;
}

/// Staged stand-in for a real recognition engine.
///
/// Walks a fixed number of passes, polling the cancellation token before
/// each, and produces placeholder text. The pass delay is configurable so
/// tests can run it at full speed.
#[derive(Debug, Clone)]
pub struct SimulatedExtractor {
    passes: u32,
    pass_delay: Duration,
}

impl SimulatedExtractor {
    pub fn new(passes: u32, pass_delay: Duration) -> Self {
        Self { passes, pass_delay }
    }
}

impl Default for SimulatedExtractor {
    fn default() -> Self {
        Self {
            passes: 10,
            pass_delay: Duration::from_millis(300),
        }
    }
}

#[async_trait::async_trait]
impl Extractor for SimulatedExtractor {
    async fn extract(
        &self,
        path: &Path,
        config: &Config,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Extraction, ExtractError> {
        let started = Instant::now();

        if !is_supported_document(path) {
            let extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_string);
            return Err(ExtractError::new(
                ExtractFailure::UnsupportedFormat { extension },
                "unsupported document format",
                started.elapsed(),
            ));
        }

        for pass in 0..self.passes {
            if cancel.is_cancelled() {
                return Err(ExtractError::new(
                    ExtractFailure::Cancelled,
                    "extraction stopped by user",
                    started.elapsed(),
                ));
            }
            tokio::time::sleep(self.pass_delay).await;
            sink.progress((((pass + 1) * 100) / self.passes) as u8);
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let text = format!(
            "[ Extracted text from: {name} ]\n\n\
             Recognized at {} dpi, language set {}.\n\
             Placeholder output produced by the staged extraction engine.\n",
            config.dpi, config.language,
        );
        Ok(Extraction {
            text,
            duration: started.elapsed(),
        })
    }
}
