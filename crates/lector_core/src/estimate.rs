use std::time::Duration;

/// Renders a duration as a compact label: `"45s"`, `"3m 07s"`, `"1h 02m 05s"`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

/// Elapsed/remaining labels for a run that has finished `completed` of
/// `total` jobs in `elapsed`.
///
/// The remaining label is `None` until the first job completes; before that
/// there is no observed throughput to extrapolate from. Otherwise the total
/// is estimated as `elapsed / (completed / total)` and the remainder clamped
/// at zero.
pub fn estimate(elapsed: Duration, completed: usize, total: usize) -> (String, Option<String>) {
    let elapsed_label = format_duration(elapsed);
    if completed == 0 || total == 0 {
        return (elapsed_label, None);
    }
    let estimated_total = elapsed.as_secs_f64() / (completed as f64 / total as f64);
    let remaining = (estimated_total - elapsed.as_secs_f64()).max(0.0);
    let remaining_label = format_duration(Duration::from_secs_f64(remaining));
    (elapsed_label, Some(remaining_label))
}
