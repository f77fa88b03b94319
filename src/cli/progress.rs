use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use scan_batch::{capture::CapturedImage, BatchObserver, BatchResult};

/// Renders session events on the terminal
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");

        let bar = ProgressBar::hidden();
        bar.set_style(style);
        Self { bar }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchObserver for ProgressObserver {
    fn on_capture_added(&self, image: &CapturedImage) {
        println!("  {} #{:<3} {}", "+".green(), image.order, image.local_ref);
    }

    fn on_upload_progress(&self, completed: usize, total: usize) {
        if completed == 0 {
            self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
            self.bar.set_length(total as u64);
            self.bar.set_message("uploading");
        }
        self.bar.set_position(completed as u64);
    }

    fn on_batch_complete(&self, result: &BatchResult) {
        self.bar.finish_with_message(format!(
            "{} uploaded, {} failed",
            result.succeeded,
            result.failed()
        ));
    }
}
