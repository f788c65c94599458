// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    — trains a CNN on CIFAR-10 and checkpoints it
//   2. `evaluate` — restores the checkpoint and scores the test split
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "cifar-convnet",
    version = "0.1.0",
    about = "Train convolutional networks on CIFAR-10 with Burn, then evaluate the checkpoint."
)]
pub struct Cli {
    /// The subcommand to run (train or evaluate)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

/// Handles the `train` subcommand.
fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on CIFAR-10 in: {}", args.data_dir);

    let report = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Training complete. Validation accuracy {:.3}, checkpoint saved to {}",
        report.validation.accuracy,
        report.checkpoint.display()
    );
    Ok(())
}

/// Handles the `evaluate` subcommand.
fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let summary = EvaluateUseCase::new(args.into()).execute()?;
    println!("\nTest accuracy: {:.3}", summary.accuracy);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{DeviceKind, TrainConfig};
    use crate::ml::model::ModelKind;

    #[test]
    fn test_train_flags_map_to_config() {
        let cli = Cli::try_parse_from([
            "cifar-convnet", "train",
            "--model", "two-branch",
            "--device", "cpu",
            "--epochs", "3",
            "--recover",
            "--prev-epochs", "2",
            "--seed", "42",
        ])
        .unwrap();

        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.model, ModelKind::TwoBranch);
        assert_eq!(cfg.device, DeviceKind::Cpu);
        assert_eq!(cfg.epochs, 3);
        assert!(cfg.recover);
        assert_eq!(cfg.prev_epochs, 2);
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.batch_size, 64);
        assert_eq!(cfg.num_training, 49_000);
    }

    #[test]
    fn test_evaluate_defaults() {
        let cli = Cli::try_parse_from(["cifar-convnet", "evaluate"]).unwrap();
        let Commands::Evaluate(args) = cli.command else {
            panic!("expected evaluate");
        };
        assert_eq!(args.checkpoint_dir, "checkpoints");
        assert_eq!(args.num_test, 1_000);
    }

    #[test]
    fn test_model_names_match_display() {
        for kind in [ModelKind::ResNet, ModelKind::TwoBranch] {
            let name = kind.to_string();
            let cli  = Cli::try_parse_from(["cifar-convnet", "train", "--model", name.as_str()])
                .unwrap_or_else(|e| panic!("--model {name} rejected: {e}"));
            let Commands::Train(args) = cli.command else {
                panic!("expected train");
            };
            assert_eq!(ModelKind::from(args.model), kind);
        }
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        assert!(Cli::try_parse_from(["cifar-convnet", "train", "--model", "vgg"]).is_err());
    }
}
