// ============================================================
// Layer 5 — Burn Model Handle
// ============================================================
// Adapts a Burn module + optimiser to the ModelHandle trait the
// minibatch runner drives.
//
// Key Burn insight:
//   - Training uses the Autodiff backend B so loss.backward()
//     can produce gradients; BatchNorm uses batch statistics
//   - model.valid() returns the module on B::InnerBackend:
//     no autodiff graph, BatchNorm uses running statistics
//   - the evaluation batcher must therefore build tensors on
//     B::InnerBackend as well
//   - valid() copies the whole network, so the copy is kept until
//     the next training forward pass or update invalidates it
//
// Parameter update (Adam):
//   m = β1*m + (1-β1)*g        (mean)
//   v = β2*v + (1-β2)*g²       (variance)
//   θ = θ - lr * m / (√v + ε)  (update)
//
// Reference: Burn Book §5 (Training), Kingma & Ba (2015) Adam

use anyhow::{bail, ensure, Result};
use burn::{
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};

use crate::data::batcher::{ImageBatch, ImageBatcher};
use crate::domain::sample::Minibatch;
use crate::domain::traits::ModelHandle;
use crate::ml::model::ImageClassifier;

/// Adam with β1 = 0.9, β2 = 0.999, ε = 1e-8.
pub fn adam_config() -> AdamConfig {
    AdamConfig::new()
        .with_beta_1(0.9)
        .with_beta_2(0.999)
        .with_epsilon(1e-8)
}

/// Logits of one batch plus the targets they are scored against.
pub enum BatchScores<B: AutodiffBackend> {
    /// Computed on the autodiff backend; can be backpropagated
    Tracked {
        logits:  Tensor<B, 2>,
        targets: Tensor<B, 1, Int>,
    },
    /// Computed by the evaluation copy of the model
    Detached {
        logits:  Tensor<B::InnerBackend, 2>,
        targets: Tensor<B::InnerBackend, 1, Int>,
    },
}

impl<B: AutodiffBackend> BatchScores<B> {
    pub fn len(&self) -> usize {
        match self {
            BatchScores::Tracked { targets, .. } => targets.dims()[0],
            BatchScores::Detached { targets, .. } => targets.dims()[0],
        }
    }
}

pub struct BurnModelHandle<B, M, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    model:         M,
    optim:         O,
    lr:            f64,
    train_batcher: ImageBatcher<B>,
    eval_batcher:  ImageBatcher<B::InnerBackend>,
    /// `model.valid()`, built on the first evaluation batch
    eval_model:    Option<M::InnerModule>,
}

impl<B, M, O> BurnModelHandle<B, M, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + ImageClassifier<B>,
    M::InnerModule: ImageClassifier<B::InnerBackend>,
    O: Optimizer<M, B>,
{
    pub fn new(model: M, optim: O, lr: f64, device: B::Device, record_shape: [usize; 3]) -> Self {
        Self {
            model,
            optim,
            lr,
            train_batcher: ImageBatcher::new(device.clone(), record_shape),
            eval_batcher:  ImageBatcher::new(device, record_shape),
            eval_model:    None,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<B, M, O> ModelHandle for BurnModelHandle<B, M, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + ImageClassifier<B>,
    M::InnerModule: ImageClassifier<B::InnerBackend>,
    O: Optimizer<M, B>,
{
    type Scores = BatchScores<B>;

    fn predict(&mut self, batch: &Minibatch, training: bool) -> Result<Self::Scores> {
        ensure!(!batch.is_empty(), "cannot run the model on an empty minibatch");
        ensure!(
            batch.record_shape == self.train_batcher.record_shape,
            "minibatch shape {:?} does not match model input shape {:?}",
            batch.record_shape,
            self.train_batcher.record_shape,
        );

        if training {
            // BatchNorm running statistics move on every training forward
            self.eval_model = None;
            let ImageBatch { images, targets } = self.train_batcher.batch_minibatch(batch);
            let logits = self.model.forward(images);
            Ok(BatchScores::Tracked { logits, targets })
        } else {
            let ImageBatch { images, targets } = self.eval_batcher.batch_minibatch(batch);
            let model  = self.eval_model.get_or_insert_with(|| self.model.valid());
            let logits = model.forward(images);
            Ok(BatchScores::Detached { logits, targets })
        }
    }

    fn loss(&self, scores: &Self::Scores, labels: &[usize]) -> Result<f64> {
        ensure!(
            scores.len() == labels.len(),
            "{} scores for {} labels",
            scores.len(),
            labels.len()
        );
        let value = match scores {
            BatchScores::Tracked { logits, targets } => {
                scalar(cross_entropy(logits.clone(), targets.clone()))
            }
            BatchScores::Detached { logits, targets } => {
                scalar(cross_entropy(logits.clone(), targets.clone()))
            }
        };
        ensure!(value.is_finite(), "loss is not finite ({value})");
        Ok(value)
    }

    fn correct(&self, scores: &Self::Scores, labels: &[usize]) -> Result<Vec<bool>> {
        ensure!(
            scores.len() == labels.len(),
            "{} scores for {} labels",
            scores.len(),
            labels.len()
        );
        Ok(match scores {
            BatchScores::Tracked { logits, targets } => {
                correct_flags(logits.clone(), targets.clone())
            }
            BatchScores::Detached { logits, targets } => {
                correct_flags(logits.clone(), targets.clone())
            }
        })
    }

    fn can_update(&self) -> bool {
        true
    }

    fn update_parameters(&mut self, scores: Self::Scores, _labels: &[usize]) -> Result<()> {
        let BatchScores::Tracked { logits, targets } = scores else {
            bail!("parameter updates need scores computed in training mode");
        };

        // Backward pass + Adam update
        let loss  = cross_entropy(logits, targets);
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model      = self.optim.step(self.lr, self.model.clone(), grads);
        self.eval_model = None;
        Ok(())
    }
}

/// Mean softmax cross-entropy of the batch — shape [1].
fn cross_entropy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits, targets)
}

fn scalar<B: Backend>(loss: Tensor<B, 1>) -> f64 {
    loss.into_scalar().elem::<f64>()
}

/// argmax(1) returns shape [batch, 1] — flatten to [batch] before comparing.
fn correct_flags<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Vec<bool> {
    logits
        .argmax(1)
        .flatten::<1>(0, 1)
        .equal(targets)
        .float()
        .into_data()
        .iter::<f32>()
        .map(|hit| hit > 0.5)
        .collect()
}
