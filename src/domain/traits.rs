// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The runner, the checkpoint adapter and the use cases are
// written against these traits, never against concrete Burn
// types:
//
//   ImageSource        → CifarLoader
//   ModelHandle        → BurnModelHandle (and test fakes)
//   CheckpointAdapter  → CheckpointManager
//   RunObserver        → ConsoleReporter, MetricsLogger
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::path::PathBuf;

use anyhow::Result;

use crate::domain::error::TrainError;
use crate::domain::sample::{ImageItem, Minibatch};
use crate::domain::stats::{BatchProgress, EpochSummary};

// ─── ImageSource ──────────────────────────────────────────────────────────────
/// Any component that can produce the raw training and test records.
pub trait ImageSource {
    /// Shape shared by every record: [channels, height, width]
    fn record_shape(&self) -> [usize; 3];

    /// All records of the training distribution, in file order.
    fn load_train(&self) -> Result<Vec<ImageItem>>;

    /// All records of the test distribution, in file order.
    fn load_test(&self) -> Result<Vec<ImageItem>>;
}

// ─── ModelHandle ──────────────────────────────────────────────────────────────
/// The capabilities the runner invokes on a model.
///
/// `Scores` is whatever `predict` produces (logits on some device for the
/// Burn handle, plain vectors for test fakes). `loss` and `correct` read the
/// scores; `update_parameters` consumes them.
pub trait ModelHandle {
    type Scores;

    /// Forward pass. `training` selects training behaviour (batch statistics,
    /// gradient tracking) versus evaluation behaviour.
    fn predict(&mut self, batch: &Minibatch, training: bool) -> Result<Self::Scores>;

    /// Mean loss of the batch.
    fn loss(&self, scores: &Self::Scores, labels: &[usize]) -> Result<f64>;

    /// One flag per record: did the top-scoring class match the label?
    fn correct(&self, scores: &Self::Scores, labels: &[usize]) -> Result<Vec<bool>>;

    /// Whether `update_parameters` is available on this handle.
    fn can_update(&self) -> bool {
        false
    }

    /// Descend the loss for this batch, mutating the parameters in place.
    fn update_parameters(&mut self, _scores: Self::Scores, _labels: &[usize]) -> Result<()> {
        anyhow::bail!("this model handle has no parameter-update capability")
    }
}

// ─── CheckpointAdapter ────────────────────────────────────────────────────────
/// Persists and recovers the parameter state `S` between process invocations.
pub trait CheckpointAdapter<S> {
    /// Write `state` tagged with `step`; returns the file actually written.
    fn save(&self, state: &S, step: usize) -> Result<PathBuf, TrainError>;

    /// Overwrite `state` with the checkpoint of highest step and return that
    /// step. `TrainError::NotFound` leaves `state` untouched.
    fn restore(&self, state: &mut S) -> Result<usize, TrainError>;
}

// ─── RunObserver ──────────────────────────────────────────────────────────────
/// Side channel for progress reports. Observers never affect the result.
pub trait RunObserver {
    /// Called on the logging cadence while training.
    fn on_iteration(&mut self, _progress: &BatchProgress) {}

    /// Called once at the end of every epoch.
    fn on_epoch(&mut self, _summary: &EpochSummary) {}
}
