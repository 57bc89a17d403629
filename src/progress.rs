use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};

use crate::session::{SessionEvent, SessionOutcome};

/// Renders session events as an overall bar, a per-file byte bar, and log lines.
pub struct ProgressReporter {
    overall: ProgressBar,
    file: ProgressBar,
}

impl ProgressReporter {
    pub fn new(multi: &MultiProgress) -> Self {
        let overall = multi.add(ProgressBar::new(0));
        if let Ok(style) =
            ProgressStyle::default_bar().template("{prefix:>8} [{bar:40.cyan/blue}] {pos}/{len} clips")
        {
            overall.set_style(style.progress_chars("#>-"));
        }
        overall.set_prefix("Total");

        let file = multi.add(ProgressBar::new(0));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{prefix:>8} [{bar:40.green/white}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
        {
            file.set_style(style.progress_chars("#>-"));
        }
        file.set_prefix("Clip");
        file.enable_steady_tick(Duration::from_millis(250));

        Self { overall, file }
    }

    pub fn handle(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Message(text) => info!("{text}"),
            SessionEvent::FileProgress {
                downloaded,
                total,
                filename,
            } => {
                self.file.set_length(*total);
                self.file.set_message(filename.clone());
                self.file.set_position(*downloaded);
            }
            SessionEvent::Overall { completed, total } => {
                self.overall.set_length(*total as u64);
                self.overall.set_position(*completed as u64);
            }
            SessionEvent::Finished(outcome) => {
                self.overall.finish_and_clear();
                self.file.finish_and_clear();
                report(outcome);
            }
        }
    }
}

fn report(outcome: &SessionOutcome) {
    match outcome {
        SessionOutcome::Completed(result) => {
            let status = if result.cancelled { "cancelled" } else { "complete" };
            info!("Download {status}!");
            info!("Clips downloaded: {}/{}", result.successful, result.total);
            if result.failed > 0 {
                warn!("Failures: {}", result.failed);
            } else {
                info!("Failures: 0");
            }
            info!("Output directory: {}", result.output_dir.display());
        }
        SessionOutcome::Failed { message } => error!("{message}"),
    }
}
