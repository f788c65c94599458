// ============================================================
// Layer 5 — ResNet-style Classifier
// ============================================================
// A small residual network for 32×32 images:
//
//   stem     3×3 conv(in → w) + BN + ReLU
//   stage 1  n residual blocks,  w channels, stride 1
//   stage 2  n residual blocks, 2w channels, first block stride 2
//   stage 3  n residual blocks, 4w channels, first block stride 2
//   head     global average pool → linear(4w → classes)
//
// Residual block:
//
//   y = ReLU( BN(conv3×3( ReLU(BN(conv3×3(x))) )) + shortcut(x) )
//
// The shortcut is the identity unless the block changes channel
// count or resolution, in which case it is a 1×1 conv + BN.
//
// Reference: He et al. (2016) Deep Residual Learning
//            Burn Book §3 (Building Blocks)

use burn::{
    nn::{
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::layers::ConvBn;
use crate::ml::model::ImageClassifier;

#[derive(Config, Debug)]
pub struct ResNetConfig {
    pub num_classes: usize,
    #[config(default = 3)]
    pub in_channels: usize,
    /// Channels of the first stage; doubled at each later stage
    #[config(default = 16)]
    pub width: usize,
    #[config(default = 2)]
    pub blocks_per_stage: usize,
}

impl ResNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ResNet<B> {
        let stem = ConvBn::new([self.in_channels, self.width], 3, 1, device);

        let mut blocks  = Vec::new();
        let mut channels = self.width;
        for stage in 0..3 {
            let out = self.width << stage;
            for i in 0..self.blocks_per_stage.max(1) {
                let stride = if stage > 0 && i == 0 { 2 } else { 1 };
                blocks.push(ResidualBlock::new(channels, out, stride, device));
                channels = out;
            }
        }

        ResNet {
            stem,
            blocks,
            pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            head: LinearConfig::new(channels, self.num_classes).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct ResidualBlock<B: Backend> {
    conv1:    ConvBn<B>,
    conv2:    ConvBn<B>,
    shortcut: Option<ConvBn<B>>,
}

impl<B: Backend> ResidualBlock<B> {
    fn new(in_channels: usize, out_channels: usize, stride: usize, device: &B::Device) -> Self {
        let shortcut = (in_channels != out_channels || stride != 1)
            .then(|| ConvBn::new([in_channels, out_channels], 1, stride, device));
        Self {
            conv1: ConvBn::new([in_channels, out_channels], 3, stride, device),
            conv2: ConvBn::new([out_channels, out_channels], 3, 1, device),
            shortcut,
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let skip = match &self.shortcut {
            Some(projection) => projection.forward(x.clone()),
            None => x.clone(),
        };
        let y = relu(self.conv1.forward(x));
        relu(self.conv2.forward(y) + skip)
    }
}

#[derive(Module, Debug)]
pub struct ResNet<B: Backend> {
    pub stem:   ConvBn<B>,
    pub blocks: Vec<ResidualBlock<B>>,
    pub pool:   AdaptiveAvgPool2d,
    pub head:   Linear<B>,
}

impl<B: Backend> ImageClassifier<B> for ResNet<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = relu(self.stem.forward(images));
        for block in &self.blocks {
            x = block.forward(x);
        }
        // [batch, c, 1, 1] → [batch, c]
        let x = self.pool.forward(x).flatten::<2>(1, 3);
        self.head.forward(x)
    }
}
