use burn::data::dataset::Dataset;

use crate::domain::error::TrainError;
use crate::domain::sample::{ImageItem, Minibatch};

/// N fixed-shape image records with their labels.
///
/// Every record holds exactly `channels * height * width` pixels; the
/// constructors reject anything else.
pub struct ImageDataset {
    items:        Vec<ImageItem>,
    record_shape: [usize; 3],
}

impl ImageDataset {
    pub fn new(items: Vec<ImageItem>, record_shape: [usize; 3]) -> Result<Self, TrainError> {
        let expected: usize = record_shape.iter().product();
        if let Some((index, item)) = items
            .iter()
            .enumerate()
            .find(|(_, item)| item.pixels.len() != expected)
        {
            return Err(TrainError::invalid(format!(
                "record {index} has {} values, shape {:?} needs {expected}",
                item.pixels.len(),
                record_shape,
            )));
        }
        Ok(Self { items, record_shape })
    }

    /// Pair separately materialised feature and label arrays.
    pub fn from_parts(
        features:     Vec<Vec<f32>>,
        labels:       Vec<usize>,
        record_shape: [usize; 3],
    ) -> Result<Self, TrainError> {
        if features.len() != labels.len() {
            return Err(TrainError::invalid(format!(
                "{} feature records but {} labels",
                features.len(),
                labels.len()
            )));
        }
        let items = features
            .into_iter()
            .zip(labels)
            .map(|(pixels, label)| ImageItem::new(pixels, label))
            .collect();
        Self::new(items, record_shape)
    }

    pub fn sample_count(&self) -> usize {
        self.items.len()
    }

    /// Collect the records at `indices`, in that order.
    pub fn gather(&self, indices: &[usize]) -> Result<Minibatch, TrainError> {
        let items = indices
            .iter()
            .map(|&i| {
                self.get(i).ok_or_else(|| {
                    TrainError::invalid(format!(
                        "index {i} out of range for {} records",
                        self.items.len()
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Minibatch::new(items, self.record_shape))
    }
}

impl Dataset<ImageItem> for ImageDataset {
    fn get(&self, index: usize) -> Option<ImageItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}
