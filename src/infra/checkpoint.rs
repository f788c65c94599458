// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// What gets saved:
//   1. Model weights (.mpk) — one file per saved step
//   2. train_config.json       — model architecture + run config
//
// File naming convention:
//   checkpoints/
//     model-5.mpk         ← weights after 5 cumulative epochs
//     model-10.mpk        ← weights after 10 cumulative epochs
//     train_config.json   ← hyperparameters
//     metrics.csv         ← written by MetricsLogger
//
// restore() always picks the highest step present, so resuming
// continues from the most recent save.
//
// Burn's CompactRecorder:
//   - Serialises parameters to MessagePack (half precision)
//   - Appends its own extension, read back via FileRecorder
//   - Loading fails if the architecture doesn't match
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{
    fs,
    marker::PhantomData,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{CompactRecorder, FileRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::domain::error::TrainError;
use crate::domain::traits::CheckpointAdapter;

const CHECKPOINT_PREFIX: &str = "model-";
const CONFIG_FILE: &str = "train_config.json";

/// Saves/restores Burn modules under one directory.
/// `B` is the backend restored weights are loaded onto.
pub struct CheckpointManager<B: Backend> {
    dir:     PathBuf,
    device:  B::Device,
    _backend: PhantomData<B>,
}

impl<B: Backend> CheckpointManager<B> {
    pub fn new(dir: impl Into<PathBuf>, device: B::Device) -> Self {
        Self { dir: dir.into(), device, _backend: PhantomData }
    }

    /// Path handed to the recorder, which appends the extension itself.
    fn stem_path(&self, step: usize) -> PathBuf {
        self.dir.join(format!("{CHECKPOINT_PREFIX}{step}"))
    }

    /// Extension the recorder appends to every checkpoint it writes.
    fn extension() -> &'static str {
        <CompactRecorder as FileRecorder<B>>::file_extension()
    }

    /// Highest step saved in the directory, if any.
    pub fn latest_step(&self) -> Result<Option<usize>, TrainError> {
        if !self.dir.is_dir() {
            return Ok(None);
        }

        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read checkpoint directory '{}'", self.dir.display()))
            .map_err(TrainError::Storage)?;

        let mut latest = None;
        for entry in entries {
            let entry = entry
                .with_context(|| format!("Cannot list '{}'", self.dir.display()))
                .map_err(TrainError::Storage)?;
            let name = entry.file_name();
            if let Some(step) = name.to_str().and_then(|n| parse_step(n, Self::extension())) {
                latest = latest.max(Some(step));
            }
        }
        Ok(latest)
    }
}

impl<B: Backend, M: Module<B>> CheckpointAdapter<M> for CheckpointManager<B> {
    fn save(&self, state: &M, step: usize) -> Result<PathBuf, TrainError> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", self.dir.display()))
            .map_err(TrainError::Storage)?;

        let path     = self.stem_path(step);
        let recorder = CompactRecorder::new();
        <CompactRecorder as Recorder<B>>::record(&recorder, state.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))
            .map_err(TrainError::Storage)?;

        let saved = path.with_extension(Self::extension());
        tracing::debug!("Saved checkpoint: step {} → '{}'", step, saved.display());
        Ok(saved)
    }

    fn restore(&self, state: &mut M) -> Result<usize, TrainError> {
        let step = self
            .latest_step()?
            .ok_or_else(|| TrainError::NotFound(self.dir.clone()))?;
        self.load_step(state, step)?;
        Ok(step)
    }
}

impl<B: Backend> CheckpointManager<B> {
    /// Overwrite `state` with the weights saved at `step`.
    pub fn load_step<M: Module<B>>(&self, state: &mut M, step: usize) -> Result<(), TrainError> {
        let path = self.stem_path(step);
        tracing::info!("Loading checkpoint from step {}", step);

        let recorder = CompactRecorder::new();
        let record: M::Record = <CompactRecorder as Recorder<B>>::load(&recorder, path.clone(), &self.device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Does it match the model architecture?",
                    path.display())
            })
            .map_err(TrainError::Storage)?;

        // load_record() returns a new module with the loaded weights
        *state = state.clone().load_record(record);
        Ok(())
    }
}

/// ("model-12.mpk", "mpk") → Some(12)
fn parse_step(file_name: &str, extension: &str) -> Option<usize> {
    file_name
        .strip_prefix(CHECKPOINT_PREFIX)?
        .strip_suffix(extension)?
        .strip_suffix('.')?
        .parse()
        .ok()
}

/// Save the training configuration to JSON so `evaluate` can rebuild
/// the exact architecture before loading weights into it.
pub fn save_config(dir: impl AsRef<Path>, cfg: &TrainConfig) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create '{}'", dir.display()))?;

    let path = dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(cfg)?;
    fs::write(&path, json)
        .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

    tracing::debug!("Saved training config to '{}'", path.display());
    Ok(())
}

/// Load the training configuration written by `save_config`.
pub fn load_config(dir: impl AsRef<Path>) -> Result<TrainConfig> {
    let path = dir.as_ref().join(CONFIG_FILE);

    let json = fs::read_to_string(&path)
        .with_context(|| {
            format!(
                "Cannot read config from '{}'. \
                 Make sure you have run 'train' before 'evaluate'.",
                path.display()
            )
        })?;

    serde_json::from_str(&json)
        .with_context(|| format!("Malformed config '{}'", path.display()))
}
