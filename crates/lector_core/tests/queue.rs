use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use lector_core::{ControlError, JobQueue, JobState};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn queue_of(paths: &[&str]) -> JobQueue {
    let mut queue = JobQueue::new();
    for path in paths {
        queue.submit(PathBuf::from(path)).unwrap();
    }
    queue
}

#[test]
fn submit_preserves_order_and_rejects_duplicates() {
    init_logging();
    let mut queue = queue_of(&["b.pdf", "a.pdf"]);

    let err = queue.submit(PathBuf::from("b.pdf")).unwrap_err();
    assert_eq!(err, ControlError::DuplicateJob(PathBuf::from("b.pdf")));

    let names: Vec<_> = queue.jobs().iter().map(|j| j.display_name.clone()).collect();
    assert_eq!(names, vec!["b.pdf", "a.pdf"]);
    let indexes: Vec<_> = queue.jobs().iter().map(|j| j.index).collect();
    assert_eq!(indexes, vec![0, 1]);
    assert!(queue.jobs().iter().all(|j| j.state == JobState::Pending));
}

#[test]
fn mark_queued_promotes_only_pending_jobs() {
    init_logging();
    let mut queue = queue_of(&["a.pdf", "b.pdf"]);

    let queued = queue.mark_queued();
    assert_eq!(queued, vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);

    // A job already past Queued is untouched by a second pass.
    assert!(queue.transition(Path::new("a.pdf"), JobState::Running, None, None));
    queue.submit(PathBuf::from("c.pdf")).unwrap();
    let queued = queue.mark_queued();
    assert_eq!(queued, vec![PathBuf::from("c.pdf")]);
    assert_eq!(queue.job(Path::new("a.pdf")).unwrap().state, JobState::Running);
}

#[test]
fn next_queued_walks_submission_order() {
    init_logging();
    let mut queue = queue_of(&["a.pdf", "b.pdf", "c.pdf"]);
    queue.mark_queued();

    assert_eq!(queue.next_queued().unwrap().display_name, "a.pdf");
    assert!(queue.transition(Path::new("a.pdf"), JobState::Running, None, None));
    assert_eq!(queue.next_queued().unwrap().display_name, "b.pdf");
    assert!(queue.transition(Path::new("a.pdf"), JobState::Succeeded, None, None));
    assert_eq!(queue.next_queued().unwrap().display_name, "b.pdf");
}

#[test]
fn transitions_are_monotonic_and_terminal_once() {
    init_logging();
    let mut queue = queue_of(&["a.pdf"]);
    queue.mark_queued();
    let path = Path::new("a.pdf");

    // Backwards is refused.
    assert!(!queue.transition(path, JobState::Pending, None, None));
    assert!(queue.transition(path, JobState::Running, None, None));
    assert!(!queue.transition(path, JobState::Queued, None, None));

    // First terminal state sticks; a second one is refused.
    assert!(queue.transition(
        path,
        JobState::Failed,
        Some("unsupported format".to_string()),
        Some(Duration::from_millis(300)),
    ));
    assert!(!queue.transition(path, JobState::Succeeded, None, None));

    let job = queue.job(path).unwrap();
    assert_eq!(job.state, JobState::Failed);
    assert_eq!(job.message.as_deref(), Some("unsupported format"));
    assert_eq!(job.duration, Some(Duration::from_millis(300)));
}

#[test]
fn transition_on_unknown_path_is_refused() {
    init_logging();
    let mut queue = queue_of(&["a.pdf"]);
    assert!(!queue.transition(Path::new("ghost.pdf"), JobState::Queued, None, None));
}

#[test]
fn cancel_queued_marks_the_whole_tail() {
    init_logging();
    let mut queue = queue_of(&["a.pdf", "b.pdf", "c.pdf"]);
    queue.mark_queued();
    assert!(queue.transition(Path::new("a.pdf"), JobState::Running, None, None));

    let cancelled = queue.cancel_queued();
    assert_eq!(cancelled, vec![PathBuf::from("b.pdf"), PathBuf::from("c.pdf")]);
    assert_eq!(queue.job(Path::new("a.pdf")).unwrap().state, JobState::Running);
    assert_eq!(queue.job(Path::new("b.pdf")).unwrap().state, JobState::Cancelled);
    assert_eq!(queue.job(Path::new("c.pdf")).unwrap().state, JobState::Cancelled);
}

#[test]
fn remove_reindexes_and_guards_running_jobs() {
    init_logging();
    let mut queue = queue_of(&["a.pdf", "b.pdf", "c.pdf"]);
    queue.mark_queued();
    assert!(queue.transition(Path::new("b.pdf"), JobState::Running, None, None));

    let err = queue.remove(Path::new("b.pdf")).unwrap_err();
    assert_eq!(err, ControlError::RemoveWhileRunning(PathBuf::from("b.pdf")));

    let err = queue.remove(Path::new("ghost.pdf")).unwrap_err();
    assert_eq!(err, ControlError::UnknownJob(PathBuf::from("ghost.pdf")));

    queue.remove(Path::new("a.pdf")).unwrap();
    let indexes: Vec<_> = queue.jobs().iter().map(|j| j.index).collect();
    assert_eq!(indexes, vec![0, 1]);
    assert_eq!(queue.jobs()[0].display_name, "b.pdf");
}

#[test]
fn clear_empties_the_queue() {
    init_logging();
    let mut queue = queue_of(&["a.pdf", "b.pdf"]);
    queue.clear();
    assert!(queue.is_empty());
    assert_eq!(queue.len(), 0);
    assert!(queue.next_queued().is_none());
}

#[test]
fn display_name_is_the_file_name() {
    init_logging();
    let mut queue = JobQueue::new();
    queue.submit(PathBuf::from("docs/scan.pdf")).unwrap();
    assert_eq!(queue.jobs()[0].display_name, "scan.pdf");
}
