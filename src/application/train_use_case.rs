// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a full training run in order:
//
//   Step 1: Load CIFAR-10 records          (Layer 4 - data)
//   Step 2: Split train/validation/test    (Layer 4 - data)
//   Step 3: Subtract the mean image        (Layer 4 - data)
//   Step 4: Build the model on the device  (Layer 5 - ml)
//   Step 5: Save config                    (Layer 6 - infra)
//   Step 6: Recover checkpoint (optional)  (Layer 6 - infra)
//   Step 7: Train for `epochs` epochs      (Layer 5 - ml)
//   Step 8: Final training + validation accuracy
//   Step 9: Save checkpoint at start step + epochs, where the start
//           step is the restored one, or prev_epochs without recovery
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    module::AutodiffModule,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    dataset::ImageDataset,
    loader::{CifarLoader, NUM_CLASSES},
    preprocessor::MeanImage,
    splitter::split_cifar,
};
use crate::domain::stats::{EpochSummary, Phase};
use crate::domain::traits::{CheckpointAdapter, ImageSource};
use crate::infra::{
    checkpoint::{save_config, CheckpointManager},
    metrics::{ConsoleReporter, MetricsLogger},
};
use crate::ml::{
    handle::{adam_config, BurnModelHandle},
    model::{ImageClassifier, ModelKind},
    resnet::ResNetConfig,
    runner::{run, RunPlan, TrainingContext},
    two_branch::TwoBranchCnnConfig,
};

/// Where tensors live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// NdArray backend on the CPU
    Cpu,
    /// WGPU backend on the default GPU adapter
    Wgpu,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Serialisable so it can be saved next to the checkpoints and
// reloaded by `evaluate` to rebuild the same architecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:        String,
    pub checkpoint_dir:  String,
    pub model:           ModelKind,
    pub device:          DeviceKind,
    pub epochs:          usize,
    pub batch_size:      usize,
    pub eval_batch_size: usize,
    pub lr:              f64,
    pub log_interval:    usize,
    pub recover:         bool,
    pub prev_epochs:     usize,
    pub seed:            Option<u64>,
    pub width:           usize,
    pub blocks:          usize,
    pub num_training:    usize,
    pub num_validation:  usize,
    pub num_test:        usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:        "data/cifar-10-batches-bin".to_string(),
            checkpoint_dir:  "checkpoints".to_string(),
            model:           ModelKind::ResNet,
            device:          DeviceKind::Wgpu,
            epochs:          1,
            batch_size:      64,
            eval_batch_size: 64,
            lr:              1e-3,
            log_interval:    100,
            recover:         false,
            prev_epochs:     0,
            seed:            None,
            width:           16,
            blocks:          2,
            num_training:    49_000,
            num_validation:  1_000,
            num_test:        1_000,
        }
    }
}

impl TrainConfig {
    pub fn resnet_config(&self, in_channels: usize) -> ResNetConfig {
        ResNetConfig::new(NUM_CLASSES)
            .with_in_channels(in_channels)
            .with_width(self.width)
            .with_blocks_per_stage(self.blocks)
    }

    /// Branch widths scale with `width`: a = b = 2w, c = 4w.
    pub fn two_branch_config(&self, in_channels: usize) -> TwoBranchCnnConfig {
        TwoBranchCnnConfig::new(NUM_CLASSES)
            .with_in_channels(in_channels)
            .with_a(self.width * 2)
            .with_b(self.width * 2)
            .with_c(self.width * 4)
    }
}

// ─── Prepared Data ────────────────────────────────────────────────────────────
/// Normalised splits ready for the runner.
pub struct PreparedData {
    pub train:        ImageDataset,
    pub validation:   ImageDataset,
    pub test:         ImageDataset,
    pub record_shape: [usize; 3],
}

/// Load, split and mean-normalise the records of `source`.
pub fn prepare_data(
    source:         &impl ImageSource,
    num_training:   usize,
    num_validation: usize,
    num_test:       usize,
) -> Result<PreparedData> {
    let record_shape = source.record_shape();
    let mut splits = split_cifar(
        source.load_train()?,
        source.load_test()?,
        num_training,
        num_validation,
        num_test,
    )?;

    match MeanImage::fit(&splits.train) {
        Some(mean) => {
            mean.apply(&mut splits.train);
            mean.apply(&mut splits.validation);
            mean.apply(&mut splits.test);
        }
        None => tracing::warn!("Training split is empty; skipping mean subtraction"),
    }

    tracing::info!(
        "Split: {} train, {} validation, {} test",
        splits.train.len(),
        splits.validation.len(),
        splits.test.len()
    );

    Ok(PreparedData {
        train:      ImageDataset::new(splits.train, record_shape)?,
        validation: ImageDataset::new(splits.validation, record_shape)?,
        test:       ImageDataset::new(splits.test, record_shape)?,
        record_shape,
    })
}

/// Final numbers of a training run.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub train:         EpochSummary,
    pub train_eval:    EpochSummary,
    pub validation:    EpochSummary,
    /// Step of the checkpoint training resumed from, if any
    pub restored_step: Option<usize>,
    /// Step the new checkpoint was saved under
    pub step:          usize,
    pub checkpoint:    PathBuf,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainReport> {
        let cfg = &self.config;

        // ── Steps 1-3: Load, split, normalise ────────────────────────────────
        tracing::info!("Loading CIFAR-10 from '{}'", cfg.data_dir);
        let loader = CifarLoader::new(&cfg.data_dir);
        let data   = prepare_data(&loader, cfg.num_training, cfg.num_validation, cfg.num_test)?;

        // ── Step 5: Save config for evaluation ────────────────────────────────
        save_config(&cfg.checkpoint_dir, cfg)?;

        match cfg.device {
            DeviceKind::Cpu => self.train_on::<Autodiff<NdArray>>(&data, NdArrayDevice::default()),
            DeviceKind::Wgpu => self.train_on::<Autodiff<Wgpu>>(&data, WgpuDevice::default()),
        }
    }

    // ── Step 4: Build model ───────────────────────────────────────────────────
    fn train_on<B: AutodiffBackend>(&self, data: &PreparedData, device: B::Device) -> Result<TrainReport> {
        let cfg         = &self.config;
        let in_channels = data.record_shape[0];
        tracing::info!("Setting up {} model on {:?}", cfg.model, device);

        match cfg.model {
            ModelKind::ResNet => {
                let model = cfg.resnet_config(in_channels).init::<B>(&device);
                self.train_model(model, data, device)
            }
            ModelKind::TwoBranch => {
                let model = cfg.two_branch_config(in_channels).init::<B>(&device);
                self.train_model(model, data, device)
            }
        }
    }

    fn train_model<B, M>(&self, mut model: M, data: &PreparedData, device: B::Device) -> Result<TrainReport>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B> + ImageClassifier<B>,
        M::InnerModule: ImageClassifier<B::InnerBackend>,
    {
        let cfg  = &self.config;
        let ckpt = CheckpointManager::<B>::new(&cfg.checkpoint_dir, device.clone());

        // ── Step 6: Recover saved model (if requested) ────────────────────────
        let mut restored_step = None;
        if cfg.recover {
            match ckpt.restore(&mut model) {
                Ok(step) => {
                    tracing::info!("Model restored from step {}", step);
                    restored_step = Some(step);
                }
                Err(e) if e.is_not_found() => {
                    tracing::warn!("{}; starting from fresh weights", e)
                }
                Err(e) => return Err(e.into()),
            }
        }
        let base_step = start_step(restored_step, cfg.prev_epochs);

        let handle = BurnModelHandle::<B, M, _>::new(model, adam_config().init(), cfg.lr, device, data.record_shape);
        let mut ctx = TrainingContext::new(handle, cfg.seed)
            .with_observer(ConsoleReporter)
            .with_observer(MetricsLogger::new(&cfg.checkpoint_dir)?);

        // ── Step 7: Train ─────────────────────────────────────────────────────
        tracing::info!("Training model...");
        let plan  = RunPlan::training(cfg.epochs, cfg.batch_size, cfg.log_interval);
        let train = run(&mut ctx, &data.train, &plan)?;

        // ── Step 8: Final accuracies ──────────────────────────────────────────
        tracing::info!("Final training accuracy:");
        let train_eval = run(
            &mut ctx,
            &data.train,
            &RunPlan::evaluation(Phase::TrainEval, cfg.eval_batch_size),
        )?;

        tracing::info!("Final validation accuracy:");
        let validation = run(
            &mut ctx,
            &data.validation,
            &RunPlan::evaluation(Phase::Validation, cfg.eval_batch_size),
        )?;

        // ── Step 9: Save checkpoint ───────────────────────────────────────────
        let step       = base_step + cfg.epochs;
        let checkpoint = ckpt.save(ctx.model().model(), step)?;
        tracing::info!("Checkpoint saved in file: {}", checkpoint.display());

        Ok(TrainReport { train, train_eval, validation, restored_step, step, checkpoint })
    }
}

/// Step the new epochs count from. A restored checkpoint wins over
/// `prev_epochs`, so a resumed save always lands above the step it loaded.
fn start_step(restored: Option<usize>, prev_epochs: usize) -> usize {
    match restored {
        Some(step) => {
            if prev_epochs != 0 && prev_epochs != step {
                tracing::warn!(
                    "--prev-epochs {} ignored; continuing from restored step {}",
                    prev_epochs,
                    step
                );
            }
            step
        }
        None => prev_epochs,
    }
}
