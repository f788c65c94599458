// ============================================================
// Layer 3 — Epoch Statistics
// ============================================================
// Accumulates loss and correctness over one pass of the data.
//
// Loss is accumulated as `batch_loss * actual_batch_size` and
// divided by the record count at the end. Averaging the
// per-batch means instead would over-weight a short final batch.
//
//   batches: [2, 2, 1] records, losses [1.0, 1.0, 4.0]
//   weighted mean   = (2 + 2 + 4) / 5 = 1.6
//   mean of means   = 6 / 3          = 2.0   ← wrong

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::TrainError;

/// Which pass a run represents; shows up in reports and the metrics CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Train,
    TrainEval,
    Validation,
    Test,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Train => "train",
            Phase::TrainEval => "train_eval",
            Phase::Validation => "validation",
            Phase::Test => "test",
        };
        f.write_str(name)
    }
}

/// Progress of a single training batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgress {
    /// 1-based running batch counter across the whole run
    pub iteration: usize,
    pub loss: f64,
    pub accuracy: f64,
}

/// Final aggregates of one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    pub phase: Phase,
    /// 1-based epoch index within the run
    pub epoch: usize,
    pub mean_loss: f64,
    pub accuracy: f64,
}

/// Running sums for the epoch in progress.
#[derive(Debug, Clone, Default)]
pub struct EpochStats {
    loss_sum: f64,
    correct: usize,
    seen: usize,
}

impl EpochStats {
    /// Add one batch: its mean loss and per-record correctness flags.
    pub fn record(&mut self, batch_loss: f64, correct: &[bool]) {
        let actual_batch_size = correct.len();
        self.loss_sum += batch_loss * actual_batch_size as f64;
        self.correct += correct.iter().filter(|&&hit| hit).count();
        self.seen += actual_batch_size;
    }

    /// Divide by the dataset size. Zero records is an input error, not NaN;
    /// a pass that did not score every record exactly once is a failure.
    pub fn finish(&self, phase: Phase, epoch: usize, total: usize) -> Result<EpochSummary, TrainError> {
        if total == 0 {
            return Err(TrainError::invalid("cannot average over an empty dataset"));
        }
        if self.seen != total {
            return Err(TrainError::computation(anyhow::anyhow!(
                "epoch scored {} records but the dataset holds {}",
                self.seen,
                total
            )));
        }
        Ok(EpochSummary {
            phase,
            epoch,
            mean_loss: self.loss_sum / total as f64,
            accuracy: self.correct as f64 / total as f64,
        })
    }
}
