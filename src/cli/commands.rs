// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `evaluate`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, enums)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::evaluate_use_case::EvaluateConfig;
use crate::application::train_use_case::{DeviceKind, TrainConfig};
use crate::ml::model::ModelKind;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a network on CIFAR-10 and save a checkpoint
    Train(TrainArgs),

    /// Score the latest checkpoint on the test split
    Evaluate(EvaluateArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelArg {
    /// Residual network with projection shortcuts
    #[value(name = "resnet")]
    ResNet,
    /// Parallel 3×3 and 5×5 branches fused by a 3×3 conv
    TwoBranch,
}

impl From<ModelArg> for ModelKind {
    fn from(m: ModelArg) -> Self {
        match m {
            ModelArg::ResNet    => ModelKind::ResNet,
            ModelArg::TwoBranch => ModelKind::TwoBranch,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceArg {
    Cpu,
    Wgpu,
}

impl From<DeviceArg> for DeviceKind {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Cpu  => DeviceKind::Cpu,
            DeviceArg::Wgpu => DeviceKind::Wgpu,
        }
    }
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding the extracted cifar-10-batches-bin files
    #[arg(long, default_value = "data/cifar-10-batches-bin")]
    pub data_dir: String,

    /// Directory for checkpoints, train_config.json and metrics.csv
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, value_enum, default_value_t = ModelArg::ResNet)]
    pub model: ModelArg,

    #[arg(long, value_enum, default_value_t = DeviceArg::Wgpu)]
    pub device: DeviceArg,

    /// Number of full passes through the training split
    #[arg(long, default_value_t = 1)]
    pub epochs: usize,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Batch size for the final accuracy passes
    #[arg(long, default_value_t = 64)]
    pub eval_batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Print training loss/accuracy every N iterations
    #[arg(long, default_value_t = 100)]
    pub log_interval: usize,

    /// Resume from the latest checkpoint in --checkpoint-dir
    #[arg(long)]
    pub recover: bool,

    /// Epochs already trained when not recovering; the new checkpoint
    /// is saved at prev_epochs + epochs. With --recover the restored
    /// checkpoint's step is used instead
    #[arg(long, default_value_t = 0)]
    pub prev_epochs: usize,

    /// Fix the shuffling order
    #[arg(long)]
    pub seed: Option<u64>,

    /// Base channel count (ResNet first stage, two-branch a = b = 2w, c = 4w)
    #[arg(long, default_value_t = 16)]
    pub width: usize,

    /// Residual blocks per ResNet stage
    #[arg(long, default_value_t = 2)]
    pub blocks: usize,

    #[arg(long, default_value_t = 49_000)]
    pub num_training: usize,

    #[arg(long, default_value_t = 1_000)]
    pub num_validation: usize,

    #[arg(long, default_value_t = 1_000)]
    pub num_test: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:        a.data_dir,
            checkpoint_dir:  a.checkpoint_dir,
            model:           a.model.into(),
            device:          a.device.into(),
            epochs:          a.epochs,
            batch_size:      a.batch_size,
            eval_batch_size: a.eval_batch_size,
            lr:              a.lr,
            log_interval:    a.log_interval,
            recover:         a.recover,
            prev_epochs:     a.prev_epochs,
            seed:            a.seed,
            width:           a.width,
            blocks:          a.blocks,
            num_training:    a.num_training,
            num_validation:  a.num_validation,
            num_test:        a.num_test,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory with the same CIFAR-10 files used during training
    #[arg(long, default_value = "data/cifar-10-batches-bin")]
    pub data_dir: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 1_000)]
    pub num_test: usize,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            data_dir:       a.data_dir,
            checkpoint_dir: a.checkpoint_dir,
            batch_size:     a.batch_size,
            num_test:       a.num_test,
        }
    }
}
