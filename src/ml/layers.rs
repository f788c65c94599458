use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig2d,
    },
    prelude::*,
};

/// Convolution followed by batch normalisation (no activation).
///
/// Odd kernels are padded by `kernel / 2`, so stride 1 keeps the spatial
/// size and stride 2 halves it (rounding up).
#[derive(Module, Debug)]
pub struct ConvBn<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B, 2>,
}

impl<B: Backend> ConvBn<B> {
    pub fn new(
        channels: [usize; 2],
        kernel:   usize,
        stride:   usize,
        device:   &B::Device,
    ) -> Self {
        let pad  = kernel / 2;
        // Bias is redundant in front of batch norm's shift
        let conv = Conv2dConfig::new(channels, [kernel, kernel])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(pad, pad))
            .with_bias(false)
            .init(device);
        let norm = BatchNormConfig::new(channels[1]).init(device);
        Self { conv, norm }
    }

    /// [batch, in, h, w] → [batch, out, h', w']
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.norm.forward(self.conv.forward(x))
    }
}
