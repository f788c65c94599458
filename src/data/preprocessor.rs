// ============================================================
// Layer 4 — Mean-Image Preprocessor
// ============================================================
// Centres pixel values by subtracting the per-pixel mean of the
// training split from every split.
//
//   mean[p] = (1/N) Σ_i train[i].pixels[p]
//   x[p]    = x[p] - mean[p]
//
// The mean is fitted on the training split only and then applied
// unchanged to validation and test, so no information from the
// held-out splits leaks into the inputs.
//
// Reference: cs231n data_utils (subtract_mean)

use crate::domain::sample::ImageItem;

/// Per-pixel mean of a set of images.
#[derive(Debug, Clone)]
pub struct MeanImage {
    mean: Vec<f32>,
}

impl MeanImage {
    /// Compute the mean image of `items`. Returns None for an empty set.
    pub fn fit(items: &[ImageItem]) -> Option<Self> {
        let first = items.first()?;

        // Sum in f64 — 49 000 records of values up to 255 lose precision in f32
        let mut sums = vec![0.0f64; first.pixels.len()];
        for item in items {
            for (sum, &p) in sums.iter_mut().zip(&item.pixels) {
                *sum += p as f64;
            }
        }

        let n = items.len() as f64;
        let mean = sums.into_iter().map(|s| (s / n) as f32).collect();
        Some(Self { mean })
    }

    /// Subtract the mean image from every record in place.
    pub fn apply(&self, items: &mut [ImageItem]) {
        for item in items {
            for (p, m) in item.pixels.iter_mut().zip(&self.mean) {
                *p -= m;
            }
        }
    }

    #[cfg(test)]
    pub fn values(&self) -> &[f32] {
        &self.mean
    }
}
