use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use engine_logging::{engine_info, engine_warn};
use lector_core::{format_duration, Config, JobState, OutputMode, RunSummary};
use lector_engine::{BatchController, BatchEvent, ControllerSettings, SimulatedExtractor};

use crate::config_store;
use crate::logging::{self, LogDestination};

/// Batch document-to-text extraction from the command line.
#[derive(Debug, Parser)]
#[command(name = "lector", version, about)]
struct Cli {
    /// Documents to extract, processed in order.
    #[arg(required = true)]
    documents: Vec<PathBuf>,

    /// Override the configured destination directory.
    #[arg(long)]
    destination: Option<PathBuf>,

    /// Override the configured recognition language (e.g. "spa+eng").
    #[arg(long)]
    language: Option<String>,

    /// Override the configured resolution in dots per inch.
    #[arg(long)]
    dpi: Option<u32>,

    /// Override the configured output mode: text, document or both.
    #[arg(long)]
    output_mode: Option<OutputMode>,

    /// Mirror the log to the terminal in addition to the log file.
    #[arg(long)]
    verbose: bool,
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(if cli.verbose {
        LogDestination::Both
    } else {
        LogDestination::File
    });

    let mut config = config_store::load();
    if let Some(language) = cli.language {
        config.language = language;
    }
    if let Some(dpi) = cli.dpi {
        config.dpi = dpi;
    }
    if let Some(mode) = cli.output_mode {
        config.output_mode = mode;
    }
    if let Some(destination) = cli.destination {
        config.destination_dir = destination;
    }

    let extractor = Arc::new(SimulatedExtractor::default());
    let (controller, events) = BatchController::new(extractor, ControllerSettings::default())
        .context("could not start the batch controller")?;

    controller.start(&cli.documents, config.clone())?;
    engine_info!("run started over {} document(s)", cli.documents.len());

    let summary = pump_events(&events);
    if let Some(summary) = summary {
        render_summary(&summary);
        if should_open_destination(&config, &summary) {
            open_destination(&config.destination_dir);
        }
    }
    Ok(())
}

/// Consumes controller events until the run summary arrives, rendering each
/// one as it comes in.
fn pump_events(events: &mpsc::Receiver<BatchEvent>) -> Option<RunSummary> {
    // Progress and ticks redraw one status line; job transitions get their
    // own lines, so the status line must be closed off first.
    let mut status_line_open = false;
    loop {
        let event = match events.recv_timeout(Duration::from_secs(120)) {
            Ok(event) => event,
            Err(err) => {
                engine_warn!("controller went quiet ({err}); giving up on this run");
                return None;
            }
        };
        match event {
            BatchEvent::JobState {
                path,
                state,
                message,
                duration,
            } => {
                close_status_line(&mut status_line_open);
                render_job_state(&path, state, message.as_deref(), duration);
            }
            BatchEvent::JobProgress { path, percent } => {
                print!("\r  {} {percent:>3}%", display_name(&path));
                let _ = std::io::stdout().flush();
                status_line_open = true;
            }
            BatchEvent::JobText { path, text } => {
                close_status_line(&mut status_line_open);
                println!("{}", "-".repeat(46));
                println!("  {}", display_name(&path));
                println!("{}", "-".repeat(46));
                println!("{text}");
            }
            BatchEvent::Tick {
                completed,
                total,
                elapsed_label,
                remaining_label,
            } => {
                match remaining_label {
                    Some(remaining) => {
                        print!("\r{completed}/{total} · {elapsed_label} ~{remaining} remaining")
                    }
                    None => print!("\relapsed {elapsed_label}"),
                }
                let _ = std::io::stdout().flush();
                status_line_open = true;
            }
            BatchEvent::RunSummary(summary) => {
                close_status_line(&mut status_line_open);
                return Some(summary);
            }
        }
    }
}

fn render_job_state(path: &Path, state: JobState, message: Option<&str>, duration: Option<Duration>) {
    let name = display_name(path);
    match state {
        JobState::Queued => println!("  queued     {name}"),
        JobState::Running => println!("  running    {name}"),
        JobState::Succeeded => {
            let took = duration.map(format_duration).unwrap_or_default();
            println!("  ok         {name}  {took}");
        }
        JobState::Failed => {
            println!("  failed     {name}: {}", message.unwrap_or("unknown error"));
        }
        JobState::Stopped => println!("  stopped    {name}"),
        JobState::Cancelled => println!("  cancelled  {name}"),
        JobState::Pending => {}
    }
}

fn render_summary(summary: &RunSummary) {
    println!();
    println!(
        "{} document(s) in {}: {} ok, {} failed, {} stopped, {} cancelled",
        summary.total,
        format_duration(summary.elapsed),
        summary.succeeded,
        summary.failed,
        summary.stopped,
        summary.cancelled,
    );
}

fn close_status_line(open: &mut bool) {
    if *open {
        println!();
        *open = false;
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// The destination is opened only after a run that was not stopped, actually
/// produced files and was configured to do so.
fn should_open_destination(config: &Config, summary: &RunSummary) -> bool {
    config.open_destination_on_finish
        && config.output_mode.writes_text()
        && summary.stopped == 0
        && summary.succeeded > 0
        && config.destination_dir.is_dir()
}

fn open_destination(dir: &Path) {
    let opener = if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    match std::process::Command::new(opener).arg(dir).spawn() {
        Ok(_) => engine_info!("opened destination {}", dir.display()),
        Err(err) => engine_warn!("could not open {}: {err}", dir.display()),
    }
}
