use crate::ports::ProgressPort;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Hashing progress on stderr. One bar is reused for every scanned argument.
pub struct ProgressBarAdapter {
    bar: ProgressBar,
}

impl ProgressBarAdapter {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files {msg}")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { bar }
    }

    /// A hidden bar swallows every update.
    pub fn with_quiet(self, quiet: bool) -> Self {
        if quiet {
            Self {
                bar: ProgressBar::hidden(),
            }
        } else {
            self
        }
    }
}

impl Default for ProgressBarAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressPort for ProgressBarAdapter {
    fn start(&self, total: u64) {
        self.bar.reset();
        self.bar.set_length(total);
        self.bar.set_message("hashing");
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn update(&self, processed: u64) {
        self.bar.set_position(processed);
    }

    fn finish(&self) {
        self.bar.disable_steady_tick();
        self.bar.finish_with_message("done");
    }
}

/// Observer that ignores every event.
pub struct SilentProgress;

impl ProgressPort for SilentProgress {
    fn start(&self, _total: u64) {}
    fn update(&self, _processed: u64) {}
    fn finish(&self) {}
}
