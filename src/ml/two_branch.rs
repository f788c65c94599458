// ============================================================
// Layer 5 — Two-Branch CNN Classifier
// ============================================================
// Two parallel convolution branches with different receptive
// fields, concatenated on the channel axis:
//
//            ┌─ 3×3(in→a) ─ 3×3/2(a→a) ──┐
//   images ──┤                           ├─ concat ─ 3×3(a+b→c) ─ pool ─ linear
//            └─ 5×5(in→b) ─ 5×5/2(b→b) ──┘
//
// Every convolution is followed by batch norm and ReLU. Both
// branches downsample by two, so their outputs line up spatially.
//
// Reference: Szegedy et al. (2015) Going Deeper with Convolutions

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
pub struct TwoBranchCnnConfig {
    pub num_classes: usize,
    #[config(default = 3)]
    pub in_channels: usize,
    /// Channels of the 3×3 branch
    #[config(default = 32)]
    pub a: usize,
    /// Channels of the 5×5 branch
    #[config(default = 32)]
    pub b: usize,
    /// Channels after fusing the branches
    #[config(default = 64)]
    pub c: usize,
}

impl TwoBranchCnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TwoBranchCnn<B> {
        TwoBranchCnn {
            narrow_in:   ConvBn::new([self.in_channels, self.a], 3, 1, device),
            narrow_down: ConvBn::new([self.a, self.a], 3, 2, device),
            wide_in:     ConvBn::new([self.in_channels, self.b], 5, 1, device),
            wide_down:   ConvBn::new([self.b, self.b], 5, 2, device),
            fuse:        ConvBn::new([self.a + self.b, self.c], 3, 1, device),
            pool:        AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            head:        LinearConfig::new(self.c, self.num_classes).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct TwoBranchCnn<B: Backend> {
    pub narrow_in:   ConvBn<B>,
    pub narrow_down: ConvBn<B>,
    pub wide_in:     ConvBn<B>,
    pub wide_down:   ConvBn<B>,
    pub fuse:        ConvBn<B>,
    pub pool:        AdaptiveAvgPool2d,
    pub head:        Linear<B>,
}

impl<B: Backend> ImageClassifier<B> for TwoBranchCnn<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let narrow = relu(self.narrow_in.forward(images.clone()));
        let narrow = relu(self.narrow_down.forward(narrow));

        let wide = relu(self.wide_in.forward(images));
        let wide = relu(self.wide_down.forward(wide));

        let x = Tensor::cat(vec![narrow, wide], 1);
        let x = relu(self.fuse.forward(x));
        let x = self.pool.forward(x).flatten::<2>(1, 3);
        self.head.forward(x)
    }
}
