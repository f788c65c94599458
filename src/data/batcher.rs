// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<ImageItem> into
// device tensors.
//
// How batching works here:
//   Input:  N ImageItems, each with C*H*W channel-major pixels
//   Output: images  [N, C, H, W]  (float)
//           targets [N]           (int class indices)
//
//   All pixels are flattened into one Vec and reshaped:
//   [r1_p1 … r1_pCHW, r2_p1 … rN_pCHW] → [N, C, H, W]
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::sample::{ImageItem, Minibatch};

// ─── ImageBatch ───────────────────────────────────────────────────────────────
/// A batch of images ready for the forward pass.
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Pixel tensor — shape: [batch_size, channels, height, width]
    pub images: Tensor<B, 4>,

    /// Ground truth class indices — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

// ─── ImageBatcher ─────────────────────────────────────────────────────────────
/// Holds the target device and the record shape so tensors are
/// created on the right device with the right dimensions.
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device:       B::Device,
    pub record_shape: [usize; 3],
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device, record_shape: [usize; 3]) -> Self {
        Self { device, record_shape }
    }

    /// Batch a runner minibatch (clones its records).
    pub fn batch_minibatch(&self, minibatch: &Minibatch) -> ImageBatch<B> {
        self.batch(minibatch.items.clone())
    }
}

impl<B: Backend> Batcher<ImageItem, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageItem>) -> ImageBatch<B> {
        let batch_size = items.len();
        let [channels, height, width] = self.record_shape;

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|item| item.pixels.iter().copied())
            .collect();

        let labels: Vec<i32> = items
            .iter()
            .map(|item| item.label as i32)
            .collect();

        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([batch_size, channels, height, width]);

        let targets = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ImageBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shapes_and_targets() {
        let device  = Default::default();
        let batcher = ImageBatcher::<NdArray>::new(device, [2, 2, 2]);

        let items = vec![
            ImageItem::new((0..8).map(|v| v as f32).collect(), 4),
            ImageItem::new(vec![1.0; 8], 9),
            ImageItem::new(vec![2.0; 8], 0),
        ];
        let batch = batcher.batch(items);

        assert_eq!(batch.images.dims(), [3, 2, 2, 2]);
        assert_eq!(batch.targets.dims(), [3]);

        let targets: Vec<i64> = batch.targets.into_data().iter::<i64>().collect();
        assert_eq!(targets, vec![4, 9, 0]);

        let first: Vec<f32> = batch.images.into_data().iter::<f32>().take(8).collect();
        assert_eq!(first, (0..8).map(|v| v as f32).collect::<Vec<_>>());
    }
}
