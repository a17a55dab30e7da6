//! Progress bars for chunked operations

use gmmflash_core::flash::{Phase, Progress};
use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporter using indicatif progress bars
pub struct IndicatifProgress {
    bar: Option<ProgressBar>,
}

impl IndicatifProgress {
    pub fn new() -> Self {
        Self { bar: None }
    }

    fn create_bar(total: u64, phase: Phase) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(&format!(
                    "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                    phase.as_str()
                ))
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}

impl Progress for IndicatifProgress {
    fn begin(&mut self, phase: Phase, total_bytes: u32) {
        if let Some(pb) = self.bar.take() {
            pb.abandon();
        }
        self.bar = Some(Self::create_bar(total_bytes as u64, phase));
    }

    fn advance(&mut self, done_bytes: u32) {
        if let Some(pb) = &self.bar {
            pb.set_position(done_bytes as u64);
        }
    }

    fn end(&mut self) {
        if let Some(pb) = self.bar.take() {
            pb.finish();
        }
    }
}

impl Drop for IndicatifProgress {
    fn drop(&mut self) {
        // A failed operation leaves the bar where it stopped
        if let Some(pb) = self.bar.take() {
            pb.abandon();
        }
    }
}
