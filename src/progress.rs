//! Progress tracking and reporting

use indicatif::{ProgressBar, ProgressStyle};

pub struct ProgressTracker {
    progress_bar: ProgressBar,
}

impl ProgressTracker {
    /// Bar tracking a known number of files
    #[must_use]
    pub fn for_files(total_files: u64) -> Self {
        let pb = ProgressBar::new(total_files);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} files ({eta})")
                .unwrap()
                .progress_chars("#>-"),
        );

        Self { progress_bar: pb }
    }

    pub fn inc(&self, files: u64) {
        self.progress_bar.inc(files);
    }

    pub fn finish(&self) {
        self.progress_bar.finish_with_message("Transfer completed");
    }
}
