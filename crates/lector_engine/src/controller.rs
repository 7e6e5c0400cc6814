use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use lector_core::{
    estimate, format_duration, BatchRun, Config, ControlError, Job, JobQueue, JobState, RunSummary,
};
use tokio::runtime::Runtime;
use tokio::sync::mpsc as worker_mpsc;
use tokio_util::sync::CancellationToken;

use crate::output::SequentialTextWriter;
use crate::worker::{ChannelSink, Extractor};
use crate::{BatchEvent, ExtractError, Extraction, WorkerEvent};

/// Timing tunables for the controller.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Cadence of `BatchEvent::Tick` while a run is active.
    pub tick_interval: Duration,
    /// Longest the controller waits for the next event from an in-flight
    /// worker before treating it as malfunctioning.
    pub worker_watchdog: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            worker_watchdog: Duration::from_secs(30),
        }
    }
}

/// Outcome of a `submit` call: how many documents were added and which
/// ones were skipped as duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitStats {
    pub added: usize,
    pub skipped: Vec<PathBuf>,
}

struct ActiveRun {
    tracker: BatchRun,
    /// Paths that joined this run, in submission order.
    members: Vec<PathBuf>,
    config: Config,
    started: Instant,
    /// Observed by the in-flight worker; cancelled on `stop`.
    cancel: CancellationToken,
    /// Cancelled by the drive loop on exit; stops the tick task.
    done: CancellationToken,
}

struct Shared {
    queue: JobQueue,
    run: Option<ActiveRun>,
}

/// Owns the job queue, drives sequential extraction one worker at a time
/// and reports every state change over the event channel handed out at
/// construction.
///
/// The command surface is synchronous and validates usage errors before
/// touching any state; execution happens on the controller's own runtime.
pub struct BatchController {
    shared: Arc<Mutex<Shared>>,
    event_tx: mpsc::Sender<BatchEvent>,
    extractor: Arc<dyn Extractor>,
    settings: ControllerSettings,
    runtime: Runtime,
}

impl BatchController {
    /// Builds a controller around the given extraction capability. Returns
    /// the controller and the receiving end of its event channel.
    pub fn new(
        extractor: Arc<dyn Extractor>,
        settings: ControllerSettings,
    ) -> std::io::Result<(Self, mpsc::Receiver<BatchEvent>)> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .build()?;
        let (event_tx, event_rx) = mpsc::channel();
        let controller = Self {
            shared: Arc::new(Mutex::new(Shared {
                queue: JobQueue::new(),
                run: None,
            })),
            event_tx,
            extractor,
            settings,
            runtime,
        };
        Ok((controller, event_rx))
    }

    /// Adds documents to the queue in `Pending` state, preserving order.
    /// Paths already present are skipped and reported back.
    pub fn submit(&self, paths: &[PathBuf]) -> SubmitStats {
        let mut shared = lock(&self.shared);
        let mut stats = SubmitStats::default();
        for path in paths {
            match shared.queue.submit(path.clone()) {
                Ok(()) => stats.added += 1,
                Err(err) => {
                    engine_debug!("submit skipped: {err}");
                    stats.skipped.push(path.clone());
                }
            }
        }
        stats
    }

    /// Starts a run over the given paths plus every document already
    /// submitted and still `Pending`.
    ///
    /// Fails with `AlreadyRunning` while a run is active and `EmptyBatch`
    /// when there is nothing to process; neither failure mutates any state.
    /// Returns immediately; execution and notification happen on the
    /// controller's runtime.
    pub fn start(&self, paths: &[PathBuf], config: Config) -> Result<(), ControlError> {
        config.validate()?;
        let mut shared = lock(&self.shared);
        if shared.run.is_some() {
            return Err(ControlError::AlreadyRunning);
        }
        for path in paths {
            match shared.queue.submit(path.clone()) {
                Ok(()) => {}
                Err(ControlError::DuplicateJob(dup)) => {
                    engine_debug!("start: {} is already queued", dup.display());
                }
                Err(err) => return Err(err),
            }
        }
        if !shared
            .queue
            .jobs()
            .iter()
            .any(|job| job.state == JobState::Pending)
        {
            return Err(ControlError::EmptyBatch);
        }

        let members = shared.queue.mark_queued();
        engine_info!("batch started: {} document(s)", members.len());
        for path in &members {
            let _ = self.event_tx.send(BatchEvent::JobState {
                path: path.clone(),
                state: JobState::Queued,
                message: None,
                duration: None,
            });
        }

        let run = ActiveRun {
            tracker: BatchRun::new(members.len()),
            members,
            config,
            started: Instant::now(),
            cancel: CancellationToken::new(),
            done: CancellationToken::new(),
        };
        let done = run.done.clone();
        shared.run = Some(run);
        drop(shared);

        self.runtime.spawn(drive(
            self.shared.clone(),
            self.event_tx.clone(),
            self.extractor.clone(),
            self.settings.clone(),
        ));
        self.runtime.spawn(tick(
            self.shared.clone(),
            self.event_tx.clone(),
            self.settings.tick_interval,
            done,
        ));
        Ok(())
    }

    /// Requests cancellation of the active run: the in-flight worker is
    /// asked to stop cooperatively and no further queued job is started.
    ///
    /// A no-op without an active run; repeated calls have the same effect
    /// as one.
    pub fn stop(&self) {
        let mut shared = lock(&self.shared);
        let Some(run) = shared.run.as_mut() else {
            engine_debug!("stop requested with no active run");
            return;
        };
        if !run.tracker.request_cancel() {
            return;
        }
        engine_info!("stop requested; cancelling the in-flight worker");
        run.cancel.cancel();
    }

    /// Removes one document from the queue. Refused while a run is active.
    pub fn remove(&self, path: &Path) -> Result<(), ControlError> {
        let mut shared = lock(&self.shared);
        if shared.run.is_some() {
            return Err(ControlError::RemoveWhileRunning(path.to_path_buf()));
        }
        shared.queue.remove(path)
    }

    /// Removes every document from the queue. Refused while a run is active.
    pub fn clear(&self) -> Result<(), ControlError> {
        let mut shared = lock(&self.shared);
        if shared.run.is_some() {
            return Err(ControlError::ClearWhileRunning);
        }
        shared.queue.clear();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared).run.is_some()
    }

    /// Snapshot of the queue for listeners.
    pub fn jobs(&self) -> Vec<Job> {
        lock(&self.shared).queue.jobs().to_vec()
    }
}

fn lock(shared: &Arc<Mutex<Shared>>) -> MutexGuard<'_, Shared> {
    shared.lock().expect("lock controller state")
}

/// Sequential drive loop: one job, one worker, one terminal event at a
/// time, until the queue is exhausted or a stop is requested.
async fn drive(
    shared: Arc<Mutex<Shared>>,
    event_tx: mpsc::Sender<BatchEvent>,
    extractor: Arc<dyn Extractor>,
    settings: ControllerSettings,
) {
    loop {
        let next = {
            let guard = lock(&shared);
            let Some(run) = guard.run.as_ref() else {
                return;
            };
            if run.tracker.cancel_requested() {
                None
            } else {
                guard.queue.next_queued().map(|job| {
                    (
                        job.path.clone(),
                        run.config.clone(),
                        run.cancel.child_token(),
                    )
                })
            }
        };
        let Some((path, config, cancel)) = next else {
            break;
        };

        set_state(&shared, &event_tx, &path, JobState::Running, None, None);
        {
            let guard = lock(&shared);
            if let Some(run) = guard.run.as_ref() {
                engine_info!(
                    "processing {}/{}: {}",
                    run.tracker.cursor() + 1,
                    run.tracker.total(),
                    path.display()
                );
            }
        }

        let (worker_tx, mut worker_rx) = worker_mpsc::unbounded_channel();
        let worker = tokio::spawn({
            let extractor = extractor.clone();
            let worker_path = path.clone();
            let worker_cancel = cancel.clone();
            async move {
                let sink = ChannelSink::new(worker_tx.clone());
                let result = extractor
                    .extract(&worker_path, &config, &sink, &worker_cancel)
                    .await;
                let _ = worker_tx.send(WorkerEvent::Finished(result));
            }
        });

        // Pump worker events; every await is bounded by the watchdog, which
        // a progress event re-arms.
        let mut outcome: Option<Result<Extraction, ExtractError>> = None;
        loop {
            match tokio::time::timeout(settings.worker_watchdog, worker_rx.recv()).await {
                Ok(Some(WorkerEvent::Progress(percent))) => {
                    let _ = event_tx.send(BatchEvent::JobProgress {
                        path: path.clone(),
                        percent,
                    });
                }
                Ok(Some(WorkerEvent::Finished(result))) => {
                    outcome = Some(result);
                    break;
                }
                Ok(None) => {
                    // Channel closed without a terminal event: the worker
                    // task died.
                    break;
                }
                Err(_) => {
                    engine_error!("worker for {} went silent; abandoning it", path.display());
                    cancel.cancel();
                    worker.abort();
                    break;
                }
            }
        }

        let stopping = {
            let guard = lock(&shared);
            guard
                .run
                .as_ref()
                .map(|run| run.tracker.cancel_requested())
                .unwrap_or(true)
        };

        if stopping {
            // Late terminal events are logged, never applied.
            match outcome {
                Some(Ok(extraction)) => engine_info!(
                    "stopped worker for {} reported success after {}",
                    path.display(),
                    format_duration(extraction.duration)
                ),
                Some(Err(err)) => engine_info!(
                    "stopped worker for {} reported: {}",
                    path.display(),
                    err.message
                ),
                None => {}
            }
            set_state(&shared, &event_tx, &path, JobState::Stopped, None, None);
            advance(&shared);
            break;
        }

        match outcome {
            Some(Ok(extraction)) => {
                let _ = event_tx.send(BatchEvent::JobText {
                    path: path.clone(),
                    text: extraction.text.clone(),
                });
                match persist_text(&shared, &path, &extraction) {
                    Ok(written) => {
                        if let Some(target) = written {
                            engine_info!("wrote {}", target.display());
                        }
                        set_state(
                            &shared,
                            &event_tx,
                            &path,
                            JobState::Succeeded,
                            None,
                            Some(extraction.duration),
                        );
                    }
                    Err(err) => {
                        engine_error!("could not write output for {}: {err}", path.display());
                        set_state(
                            &shared,
                            &event_tx,
                            &path,
                            JobState::Failed,
                            Some(err.to_string()),
                            Some(extraction.duration),
                        );
                    }
                }
            }
            Some(Err(err)) => {
                engine_warn!("extraction failed for {}: {}", path.display(), err.message);
                set_state(
                    &shared,
                    &event_tx,
                    &path,
                    JobState::Failed,
                    Some(err.message),
                    Some(err.duration),
                );
            }
            None => {
                set_state(
                    &shared,
                    &event_tx,
                    &path,
                    JobState::Failed,
                    Some("extraction worker stopped responding".to_string()),
                    None,
                );
            }
        }
        advance(&shared);
    }

    finish(&shared, &event_tx);
}

fn set_state(
    shared: &Arc<Mutex<Shared>>,
    event_tx: &mpsc::Sender<BatchEvent>,
    path: &Path,
    state: JobState,
    message: Option<String>,
    duration: Option<Duration>,
) {
    let applied = {
        let mut guard = lock(shared);
        guard
            .queue
            .transition(path, state, message.clone(), duration)
    };
    if applied {
        let _ = event_tx.send(BatchEvent::JobState {
            path: path.to_path_buf(),
            state,
            message,
            duration,
        });
    } else {
        engine_warn!("ignored transition of {} to {}", path.display(), state);
    }
}

fn advance(shared: &Arc<Mutex<Shared>>) {
    let mut guard = lock(shared);
    if let Some(run) = guard.run.as_mut() {
        run.tracker.advance();
    }
}

/// On success, writes the extracted text to the run's destination directory
/// when the output mode asks for text. Returns the written path, if any.
fn persist_text(
    shared: &Arc<Mutex<Shared>>,
    path: &Path,
    extraction: &Extraction,
) -> Result<Option<PathBuf>, crate::OutputError> {
    let destination = {
        let guard = lock(shared);
        let Some(run) = guard.run.as_ref() else {
            return Ok(None);
        };
        if !run.config.output_mode.writes_text() {
            engine_debug!(
                "output mode {} writes no text; nothing stored for {}",
                run.config.output_mode.label(),
                path.display()
            );
            return Ok(None);
        }
        run.config.destination_dir.clone()
    };
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "extracted".to_string());
    let writer = SequentialTextWriter::new(destination);
    writer.write(&stem, &extraction.text).map(Some)
}

/// Closes out the run: cancels the queued tail if a stop was requested,
/// tallies the summary over this run's jobs and emits it.
fn finish(shared: &Arc<Mutex<Shared>>, event_tx: &mpsc::Sender<BatchEvent>) {
    let (cancelled, summary, done) = {
        let mut guard = lock(shared);
        let Some(run) = guard.run.take() else {
            return;
        };
        let cancelled = if run.tracker.cancel_requested() {
            guard.queue.cancel_queued()
        } else {
            Vec::new()
        };
        let elapsed = run.started.elapsed();
        let members = run.members;
        let summary = RunSummary::tally(
            guard
                .queue
                .jobs()
                .iter()
                .filter(|job| members.contains(&job.path)),
            elapsed,
        );
        (cancelled, summary, run.done)
    };
    for path in cancelled {
        let _ = event_tx.send(BatchEvent::JobState {
            path,
            state: JobState::Cancelled,
            message: None,
            duration: None,
        });
    }
    engine_info!(
        "batch finished: {} total, {} succeeded, {} failed, {} stopped, {} cancelled in {}",
        summary.total,
        summary.succeeded,
        summary.failed,
        summary.stopped,
        summary.cancelled,
        format_duration(summary.elapsed)
    );
    done.cancel();
    let _ = event_tx.send(BatchEvent::RunSummary(summary));
}

/// Periodic heartbeat: elapsed plus an estimate extrapolated from the jobs
/// finished so far. Ends when the drive loop signals completion.
async fn tick(
    shared: Arc<Mutex<Shared>>,
    event_tx: mpsc::Sender<BatchEvent>,
    interval: Duration,
    done: CancellationToken,
) {
    let mut timer = tokio::time::interval(interval);
    // The zeroth tick fires immediately; skip it.
    timer.tick().await;
    loop {
        tokio::select! {
            _ = done.cancelled() => break,
            _ = timer.tick() => {}
        }
        let snapshot = {
            let guard = lock(&shared);
            guard.run.as_ref().map(|run| {
                (
                    run.started.elapsed(),
                    run.tracker.cursor(),
                    run.tracker.total(),
                )
            })
        };
        let Some((elapsed, completed, total)) = snapshot else {
            break;
        };
        let (elapsed_label, remaining_label) = estimate(elapsed, completed, total);
        let _ = event_tx.send(BatchEvent::Tick {
            completed,
            total,
            elapsed_label,
            remaining_label,
        });
    }
}
