// ============================================================
// Layer 3 — Image Sample Domain Types
// ============================================================
// An ImageItem is one fixed-shape feature record paired with
// its integer class label. A Minibatch is the ordered set of
// records gathered for one forward pass.
//
// Pixels are stored channel-major ([channels, height, width]
// flattened), which is both the CIFAR-10 binary layout and the
// layout Burn's Conv2d expects.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// One labelled image record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageItem {
    /// Flattened channel-major pixel values
    pub pixels: Vec<f32>,

    /// Class index in `0..num_classes`
    pub label: usize,
}

impl ImageItem {
    pub fn new(pixels: Vec<f32>, label: usize) -> Self {
        Self { pixels, label }
    }
}

/// The records of one chunk, in the order the runner visits them.
#[derive(Debug, Clone)]
pub struct Minibatch {
    /// Records in visiting order
    pub items: Vec<ImageItem>,

    /// Shape of every record: [channels, height, width]
    pub record_shape: [usize; 3],
}

impl Minibatch {
    pub fn new(items: Vec<ImageItem>, record_shape: [usize; 3]) -> Self {
        Self { items, record_shape }
    }

    /// Number of records actually present (the final chunk may be short)
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Labels in visiting order
    pub fn labels(&self) -> Vec<usize> {
        self.items.iter().map(|item| item.label).collect()
    }
}
