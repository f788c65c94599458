use std::fmt;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

/// Any network that maps a batch of images to per-class logits.
///
/// images: [batch, channels, height, width] → logits: [batch, num_classes]
pub trait ImageClassifier<B: Backend> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2>;
}

/// The architectures this crate can train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Residual network (ml::resnet)
    #[serde(rename = "resnet")]
    ResNet,
    /// Parallel 3×3 / 5×5 branches (ml::two_branch)
    TwoBranch,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::ResNet => f.write_str("resnet"),
            ModelKind::TwoBranch => f.write_str("two-branch"),
        }
    }
}
