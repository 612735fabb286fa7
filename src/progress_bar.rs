//! Terminal progress bar for album runs.

use std::time::Duration;

use album_downloader::{DownloadTask, ProgressObserver, TaskOutcome};
use indicatif::{ProgressBar, ProgressStyle};

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

pub(crate) fn should_show_progress(stderr_is_terminal: bool, quiet: bool, dumb_terminal: bool) -> bool {
    stderr_is_terminal && !quiet && !dumb_terminal
}

/// indicatif-backed [`ProgressObserver`].
///
/// Starts as a spinner and switches to a bar once the album header reports
/// how many photos to expect.
pub(crate) struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub(crate) fn new(visible: bool) -> Self {
        let bar = if visible {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar.set_message("Scanning album...");
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for ProgressReporter {
    fn album_total(&self, photos: usize) {
        self.bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        self.bar.set_length(u64::try_from(photos).unwrap_or(u64::MAX));
    }

    fn skipped_during_scan(&self, _filename: &str) {
        self.bar.inc(1);
    }

    fn task_finished(&self, task: &DownloadTask, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Requeued => {}
            TaskOutcome::Downloaded { .. } => {
                self.bar.inc(1);
                self.bar.set_message(task.filename.clone());
            }
            TaskOutcome::Skipped | TaskOutcome::Failed { .. } => self.bar.inc(1),
        }
    }

    fn cooldown_started(&self, duration: Duration) {
        self.bar.set_message(format!(
            "rate limited, pausing {} min",
            duration.as_secs().div_ceil(60)
        ));
    }
}
