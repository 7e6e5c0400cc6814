use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lector_core::Config;
use lector_engine::{ExtractFailure, Extractor, ProgressSink, SimulatedExtractor};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct TestSink {
    percents: Arc<Mutex<Vec<u8>>>,
}

impl TestSink {
    fn take(&self) -> Vec<u8> {
        self.percents.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn progress(&self, percent: u8) {
        self.percents.lock().unwrap().push(percent);
    }
}

fn fast_extractor() -> SimulatedExtractor {
    SimulatedExtractor::new(4, Duration::from_millis(1))
}

#[tokio::test]
async fn reports_monotonic_progress_and_text() {
    let extractor = fast_extractor();
    let sink = TestSink::default();
    let cancel = CancellationToken::new();

    let extraction = extractor
        .extract(Path::new("scan.pdf"), &Config::default(), &sink, &cancel)
        .await
        .expect("extraction");

    let percents = sink.take();
    assert_eq!(percents, vec![25, 50, 75, 100]);
    assert!(extraction.text.contains("scan.pdf"));
    assert!(extraction.duration > Duration::ZERO);
}

#[tokio::test]
async fn honors_a_cancelled_token() {
    let extractor = fast_extractor();
    let sink = TestSink::default();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = extractor
        .extract(Path::new("scan.pdf"), &Config::default(), &sink, &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ExtractFailure::Cancelled);
    assert_eq!(err.message, "extraction stopped by user");
    // No progress is reported past the cancellation point.
    assert!(sink.take().is_empty());
}

#[tokio::test]
async fn rejects_unsupported_document_formats() {
    let extractor = fast_extractor();
    let sink = TestSink::default();
    let cancel = CancellationToken::new();

    let err = extractor
        .extract(Path::new("notes.txt"), &Config::default(), &sink, &cancel)
        .await
        .unwrap_err();

    assert_eq!(
        err.kind,
        ExtractFailure::UnsupportedFormat {
            extension: Some("txt".to_string())
        }
    );
    assert!(sink.take().is_empty());
}
