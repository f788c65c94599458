// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a trained checkpoint on the held-out test split:
//
//   Step 1: Load train_config.json   (Layer 6 - infra)
//   Step 2: Rebuild the same splits + mean image
//   Step 3: Rebuild the architecture on the saved device
//   Step 4: Restore the latest checkpoint (must exist)
//   Step 5: One evaluation pass over the test split
//
// The training split is reloaded only to recompute the mean
// image, so test records are centred exactly as during training.

use anyhow::{Context, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    module::AutodiffModule,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::{prepare_data, DeviceKind, PreparedData, TrainConfig};
use crate::data::loader::CifarLoader;
use crate::domain::stats::{EpochSummary, Phase};
use crate::domain::traits::CheckpointAdapter;
use crate::infra::{
    checkpoint::{load_config, CheckpointManager},
    metrics::{ConsoleReporter, MetricsLogger},
};
use crate::ml::{
    handle::{adam_config, BurnModelHandle},
    model::{ImageClassifier, ModelKind},
    runner::{run, RunPlan, TrainingContext},
};

#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    pub data_dir:       String,
    pub checkpoint_dir: String,
    pub batch_size:     usize,
    pub num_test:       usize,
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<EpochSummary> {
        // ── Step 1: Load training config ──────────────────────────────────────
        let trained = load_config(&self.config.checkpoint_dir)?;
        tracing::info!(
            "Evaluating {} model trained for {} epochs",
            trained.model,
            trained.prev_epochs + trained.epochs
        );

        // ── Step 2: Rebuild splits ────────────────────────────────────────────
        let loader = CifarLoader::new(&self.config.data_dir);
        let data   = prepare_data(
            &loader,
            trained.num_training,
            trained.num_validation,
            self.config.num_test,
        )?;

        match trained.device {
            DeviceKind::Cpu => self.evaluate_on::<Autodiff<NdArray>>(&trained, &data, NdArrayDevice::default()),
            DeviceKind::Wgpu => self.evaluate_on::<Autodiff<Wgpu>>(&trained, &data, WgpuDevice::default()),
        }
    }

    // ── Step 3: Rebuild architecture ──────────────────────────────────────────
    fn evaluate_on<B: AutodiffBackend>(
        &self,
        trained: &TrainConfig,
        data:    &PreparedData,
        device:  B::Device,
    ) -> Result<EpochSummary> {
        let in_channels = data.record_shape[0];
        match trained.model {
            ModelKind::ResNet => {
                let model = trained.resnet_config(in_channels).init::<B>(&device);
                self.evaluate_model(model, trained, data, device)
            }
            ModelKind::TwoBranch => {
                let model = trained.two_branch_config(in_channels).init::<B>(&device);
                self.evaluate_model(model, trained, data, device)
            }
        }
    }

    fn evaluate_model<B, M>(
        &self,
        mut model: M,
        trained:   &TrainConfig,
        data:      &PreparedData,
        device:    B::Device,
    ) -> Result<EpochSummary>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B> + ImageClassifier<B>,
        M::InnerModule: ImageClassifier<B::InnerBackend>,
    {
        // ── Step 4: Restore weights ───────────────────────────────────────────
        let ckpt = CheckpointManager::<B>::new(&self.config.checkpoint_dir, device.clone());
        let step = ckpt
            .restore(&mut model)
            .context("Cannot evaluate without a trained checkpoint")?;
        tracing::info!("Restored checkpoint from step {}", step);

        // ── Step 5: Test pass ─────────────────────────────────────────────────
        let handle  = BurnModelHandle::<B, M, _>::new(model, adam_config().init(), trained.lr, device, data.record_shape);
        let mut ctx = TrainingContext::new(handle, trained.seed)
            .with_observer(ConsoleReporter)
            .with_observer(MetricsLogger::new(&self.config.checkpoint_dir)?);

        tracing::info!("Final test accuracy:");
        let summary = run(
            &mut ctx,
            &data.test,
            &RunPlan::evaluation(Phase::Test, self.config.batch_size),
        )?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainUseCase;
    use crate::domain::error::TrainError;
    use crate::infra::checkpoint::save_config;
    use std::{fs, path::Path};

    const RECORD_PIXELS: usize = 3 * 32 * 32;

    /// Writes a miniature cifar-10-batches-bin: `per_file` records in each
    /// training batch and `test` records in the test batch.
    fn write_fake_cifar(dir: &Path, per_file: usize, test: usize) {
        let records = |count: usize, offset: usize| {
            let mut bytes = Vec::new();
            for i in 0..count {
                let label = ((i + offset) % 10) as u8;
                bytes.push(label);
                bytes.extend(std::iter::repeat(label * 20).take(RECORD_PIXELS));
            }
            bytes
        };
        for n in 1..=5 {
            fs::write(dir.join(format!("data_batch_{n}.bin")), records(per_file, n)).unwrap();
        }
        fs::write(dir.join("test_batch.bin"), records(test, 0)).unwrap();
    }

    fn tiny_config(data: &Path, ckpt: &Path) -> TrainConfig {
        TrainConfig {
            data_dir:        data.display().to_string(),
            checkpoint_dir:  ckpt.display().to_string(),
            device:          DeviceKind::Cpu,
            epochs:          1,
            batch_size:      4,
            eval_batch_size: 4,
            log_interval:    1,
            seed:            Some(7),
            width:           2,
            blocks:          1,
            num_training:    8,
            num_validation:  2,
            num_test:        2,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_train_then_evaluate_on_cpu() {
        let data = tempfile::tempdir().unwrap();
        let ckpt = tempfile::tempdir().unwrap();
        write_fake_cifar(data.path(), 2, 3);

        // recover with an empty directory only warns
        let cfg    = TrainConfig { recover: true, ..tiny_config(data.path(), ckpt.path()) };
        let report = TrainUseCase::new(cfg).execute().unwrap();

        assert_eq!(report.train.phase, Phase::Train);
        assert_eq!(report.validation.phase, Phase::Validation);
        assert_eq!(report.restored_step, None);
        assert_eq!(report.step, 1);
        assert!(report.checkpoint.exists(), "{} was not written", report.checkpoint.display());
        assert_eq!(report.checkpoint.parent(), Some(ckpt.path()));
        assert!((0.0..=1.0).contains(&report.train_eval.accuracy));

        let summary = EvaluateUseCase::new(EvaluateConfig {
            data_dir:       data.path().display().to_string(),
            checkpoint_dir: ckpt.path().display().to_string(),
            batch_size:     4,
            num_test:       2,
        })
        .execute()
        .unwrap();

        assert_eq!(summary.phase, Phase::Test);
        assert_eq!(summary.epoch, 1);
        assert!(summary.mean_loss.is_finite());
        assert!((0.0..=1.0).contains(&summary.accuracy));

        let csv = fs::read_to_string(ckpt.path().join("metrics.csv")).unwrap();
        assert!(csv.lines().any(|l| l.starts_with("test,1,")));
    }

    /// Head weights stored in the checkpoint saved at `step`.
    fn head_weights(cfg: &TrainConfig, step: usize) -> Vec<f32> {
        let device    = NdArrayDevice::default();
        let mut model = cfg.resnet_config(3).init::<Autodiff<NdArray>>(&device);
        CheckpointManager::<Autodiff<NdArray>>::new(&cfg.checkpoint_dir, device)
            .load_step(&mut model, step)
            .unwrap();
        model.head.weight.val().into_data().iter::<f32>().collect()
    }

    #[test]
    fn test_recover_continues_from_restored_step() {
        let data = tempfile::tempdir().unwrap();
        let ckpt = tempfile::tempdir().unwrap();
        write_fake_cifar(data.path(), 2, 3);
        let cfg = tiny_config(data.path(), ckpt.path());

        let first = TrainUseCase::new(TrainConfig { epochs: 2, ..cfg.clone() })
            .execute()
            .unwrap();
        assert_eq!(first.restored_step, None);
        assert_eq!(first.step, 2);

        // lr 0 leaves the linear head untouched, so it must keep the restored weights
        let resumed = TrainUseCase::new(TrainConfig { recover: true, lr: 0.0, ..cfg.clone() })
            .execute()
            .unwrap();
        assert_eq!(resumed.restored_step, Some(2));
        assert_eq!(resumed.step, 3);
        assert!(resumed.checkpoint.exists());

        let manager = CheckpointManager::<Autodiff<NdArray>>::new(ckpt.path(), NdArrayDevice::default());
        assert_eq!(manager.latest_step().unwrap(), Some(3));

        let restored = head_weights(&cfg, 2);
        let saved    = head_weights(&cfg, 3);
        assert_eq!(restored.len(), saved.len());
        for (a, b) in restored.iter().zip(&saved) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    fn test_evaluate_without_checkpoint_fails() {
        let data = tempfile::tempdir().unwrap();
        let ckpt = tempfile::tempdir().unwrap();
        write_fake_cifar(data.path(), 2, 3);
        save_config(ckpt.path(), &tiny_config(data.path(), ckpt.path())).unwrap();

        let err = EvaluateUseCase::new(EvaluateConfig {
            data_dir:       data.path().display().to_string(),
            checkpoint_dir: ckpt.path().display().to_string(),
            batch_size:     4,
            num_test:       2,
        })
        .execute()
        .unwrap_err();

        let not_found = err.downcast_ref::<TrainError>().map(TrainError::is_not_found);
        assert_eq!(not_found, Some(true));
    }

    #[test]
    fn test_evaluate_without_config_fails() {
        let ckpt = tempfile::tempdir().unwrap();
        let err  = EvaluateUseCase::new(EvaluateConfig {
            data_dir:       "unused".to_string(),
            checkpoint_dir: ckpt.path().display().to_string(),
            batch_size:     4,
            num_test:       2,
        })
        .execute()
        .unwrap_err();
        assert!(err.to_string().contains("run 'train'"));
    }
}
