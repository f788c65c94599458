// ============================================================
// Layer 6 — Metrics Logger and Console Reporter
// ============================================================
// Two RunObservers:
//
//   ConsoleReporter — prints the progress lines to stdout:
//     Iteration 101: Training Loss = 1.2345 and Accuracy = 0.578
//     Epoch 1: Overall Loss = 1.3012 and Accuracy = 0.531
//
//   MetricsLogger   — appends one CSV row per epoch so learning
//                     curves can be plotted after the run.
//
// Output file: checkpoints/metrics.csv
//
// Example CSV output:
//   phase,epoch,loss,accuracy
//   train,1,1.734120,0.372000
//   train,2,1.301200,0.531000
//   validation,1,1.402300,0.498000
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::stats::{BatchProgress, EpochSummary};
use crate::domain::traits::RunObserver;

/// Prints per-batch and per-epoch lines to stdout.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn iteration_line(progress: &BatchProgress) -> String {
        format!(
            "Iteration {}: Training Loss = {:.4} and Accuracy = {:.3}",
            progress.iteration, progress.loss, progress.accuracy
        )
    }

    pub fn epoch_line(summary: &EpochSummary) -> String {
        format!(
            "Epoch {}: Overall Loss = {:.4} and Accuracy = {:.3}",
            summary.epoch, summary.mean_loss, summary.accuracy
        )
    }
}

impl RunObserver for ConsoleReporter {
    fn on_iteration(&mut self, progress: &BatchProgress) {
        println!("{}", Self::iteration_line(progress));
    }

    fn on_epoch(&mut self, summary: &EpochSummary) {
        println!("{}", Self::epoch_line(summary));
    }
}

/// Logs epoch summaries to a CSV file for later analysis.
pub struct MetricsLogger {
    /// Full path to the CSV file
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet, so
    /// repeated runs append to the same log.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "phase,epoch,loss,accuracy")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's summary as a new row.
    pub fn log(&self, m: &EpochSummary) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(f, "{},{},{:.6},{:.6}", m.phase, m.epoch, m.mean_loss, m.accuracy)?;

        tracing::debug!(
            "Logged {} epoch {} metrics: loss={:.4}, accuracy={:.4}",
            m.phase,
            m.epoch,
            m.mean_loss,
            m.accuracy,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

impl RunObserver for MetricsLogger {
    fn on_epoch(&mut self, summary: &EpochSummary) {
        // A lost CSV row must not abort training
        if let Err(e) = self.log(summary) {
            tracing::warn!("Could not append to '{}': {:#}", self.csv_path.display(), e);
        }
    }
}
