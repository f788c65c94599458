// ============================================================
// Layer 4 — Train/Validation/Test Splitter
// ============================================================
// Carves the CIFAR-10 records into three splits:
//
//   training   = train[0 .. num_training]
//   validation = train[num_training .. num_training + num_validation]
//   test       = test[0 .. num_test]
//
// The default sizes are 49 000 / 1 000 / 1 000, so the validation
// images are the last 1 000 records of data_batch_5.bin.
//
// Ranges are contiguous; the minibatch runner shuffles the record
// order every epoch anyway.
//
// Reference: Rust Book §8 (Vectors)

use anyhow::{bail, Result};

use crate::domain::sample::ImageItem;

/// The three splits used by a run.
#[derive(Debug, Clone)]
pub struct CifarSplits {
    pub train: Vec<ImageItem>,
    pub validation: Vec<ImageItem>,
    pub test: Vec<ImageItem>,
}

/// Split the loaded records into training, validation and test sets.
///
/// Fails if more records are requested than were loaded.
pub fn split_cifar(
    mut train_pool: Vec<ImageItem>,
    mut test_pool:  Vec<ImageItem>,
    num_training:   usize,
    num_validation: usize,
    num_test:       usize,
) -> Result<CifarSplits> {
    let needed = num_training + num_validation;
    if needed > train_pool.len() {
        bail!(
            "requested {} training + {} validation records but only {} were loaded",
            num_training,
            num_validation,
            train_pool.len()
        );
    }
    if num_test > test_pool.len() {
        bail!(
            "requested {} test records but only {} were loaded",
            num_test,
            test_pool.len()
        );
    }

    train_pool.truncate(needed);
    // split_off(n) leaves [0..n) in place and returns [n..)
    let validation = train_pool.split_off(num_training);
    test_pool.truncate(num_test);

    tracing::debug!(
        "Dataset split: {} training, {} validation, {} test",
        train_pool.len(),
        validation.len(),
        test_pool.len(),
    );

    Ok(CifarSplits { train: train_pool, validation, test: test_pool })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn pool(n: usize) -> Vec<ImageItem> {
        (0..n).map(|i| ImageItem::new(vec![i as f32], i % 10)).collect()
    }

    #[test]
    fn test_correct_split_sizes() {
        let splits = split_cifar(pool(100), pool(50), 80, 15, 10).unwrap();
        assert_eq!(splits.train.len(), 80);
        assert_eq!(splits.validation.len(), 15);
        assert_eq!(splits.test.len(), 10);
    }

    #[test]
    fn test_validation_follows_training_range() {
        let splits = split_cifar(pool(10), pool(10), 6, 3, 1).unwrap();
        assert_eq!(splits.train.last().unwrap().pixels, vec![5.0]);
        assert_eq!(splits.validation.first().unwrap().pixels, vec![6.0]);
        assert_eq!(splits.validation.last().unwrap().pixels, vec![8.0]);
    }

    #[test]
    fn test_rejects_oversized_request() {
        assert!(split_cifar(pool(10), pool(10), 8, 3, 1).is_err());
        assert!(split_cifar(pool(10), pool(10), 5, 5, 11).is_err());
    }

    #[test]
    fn test_exact_fit_uses_every_record() {
        let splits = split_cifar(pool(10), pool(4), 7, 3, 4).unwrap();
        assert_eq!(splits.train.len() + splits.validation.len(), 10);
        assert_eq!(splits.test.len(), 4);
    }
}
