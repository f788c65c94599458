// ============================================================
// Layer 4 — CIFAR-10 Binary Loader
// ============================================================
// Reads the "binary version" of CIFAR-10:
//
//   cifar-10-batches-bin/
//     data_batch_1.bin … data_batch_5.bin   (10 000 records each)
//     test_batch.bin                        (10 000 records)
//
// Every record is exactly 3073 bytes:
//
//   [label: u8][red: 1024 × u8][green: 1024 × u8][blue: 1024 × u8]
//
// Each colour plane is a 32×32 image stored row-major, so the
// pixel bytes are already channel-major [3, 32, 32] — the layout
// Burn's Conv2d expects. Pixels are widened to f32 unchanged
// (0.0 ..= 255.0); normalisation happens in the preprocessor.
//
// Reference: https://www.cs.toronto.edu/~kriz/cifar.html
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::sample::ImageItem;
use crate::domain::traits::ImageSource;

/// Shape of one CIFAR-10 image: [channels, height, width]
pub const CIFAR_SHAPE: [usize; 3] = [3, 32, 32];

/// Number of CIFAR-10 classes
pub const NUM_CLASSES: usize = 10;

const PIXELS_PER_RECORD: usize = 3 * 32 * 32;
const RECORD_BYTES: usize = 1 + PIXELS_PER_RECORD;

const TRAIN_FILES: [&str; 5] = [
    "data_batch_1.bin",
    "data_batch_2.bin",
    "data_batch_3.bin",
    "data_batch_4.bin",
    "data_batch_5.bin",
];
const TEST_FILE: &str = "test_batch.bin";

/// Loads CIFAR-10 records from a `cifar-10-batches-bin` directory.
pub struct CifarLoader {
    dir: PathBuf,
}

impl CifarLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn load_files(&self, names: &[&str]) -> Result<Vec<ImageItem>> {
        if !self.dir.is_dir() {
            bail!(
                "CIFAR-10 directory '{}' does not exist. \
                 Download and extract cifar-10-binary.tar.gz first.",
                self.dir.display()
            );
        }

        let mut items = Vec::new();
        for name in names {
            let path  = self.dir.join(name);
            let batch = load_batch_file(&path)?;
            tracing::debug!("Loaded {} records from '{}'", batch.len(), path.display());
            items.extend(batch);
        }
        Ok(items)
    }
}

impl ImageSource for CifarLoader {
    fn record_shape(&self) -> [usize; 3] {
        CIFAR_SHAPE
    }

    fn load_train(&self) -> Result<Vec<ImageItem>> {
        let items = self.load_files(&TRAIN_FILES)?;
        tracing::info!("Loaded {} CIFAR-10 training records", items.len());
        Ok(items)
    }

    fn load_test(&self) -> Result<Vec<ImageItem>> {
        let items = self.load_files(&[TEST_FILE])?;
        tracing::info!("Loaded {} CIFAR-10 test records", items.len());
        Ok(items)
    }
}

fn load_batch_file(path: &Path) -> Result<Vec<ImageItem>> {
    let bytes = fs::read(path)
        .with_context(|| format!("Cannot read CIFAR-10 batch '{}'", path.display()))?;
    parse_records(&bytes)
        .with_context(|| format!("Malformed CIFAR-10 batch '{}'", path.display()))
}

/// Decode a buffer of back-to-back 3073-byte records.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<ImageItem>> {
    if bytes.len() % RECORD_BYTES != 0 {
        bail!(
            "length {} is not a multiple of the {}-byte record size",
            bytes.len(),
            RECORD_BYTES
        );
    }

    bytes
        .chunks_exact(RECORD_BYTES)
        .enumerate()
        .map(|(index, record)| {
            let label = record[0] as usize;
            if label >= NUM_CLASSES {
                bail!("record {index} has label {label}, expected 0..{NUM_CLASSES}");
            }
            let pixels = record[1..].iter().map(|&b| b as f32).collect();
            Ok(ImageItem::new(pixels, label))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: u8, fill: u8) -> Vec<u8> {
        let mut bytes = vec![label];
        bytes.extend(std::iter::repeat(fill).take(PIXELS_PER_RECORD));
        bytes
    }

    #[test]
    fn test_parses_labels_and_pixels() {
        let mut bytes = record(3, 7);
        bytes.extend(record(9, 255));

        let items = parse_records(&bytes).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].label, 3);
        assert_eq!(items[0].pixels.len(), PIXELS_PER_RECORD);
        assert_eq!(items[0].pixels[0], 7.0);
        assert_eq!(items[1].label, 9);
        assert_eq!(items[1].pixels[PIXELS_PER_RECORD - 1], 255.0);
    }

    #[test]
    fn test_rejects_truncated_buffer() {
        let mut bytes = record(1, 0);
        bytes.pop();
        assert!(parse_records(&bytes).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_label() {
        let err = parse_records(&record(10, 0)).unwrap_err();
        assert!(err.to_string().contains("label 10"));
    }

    #[test]
    fn test_loads_batches_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        for (i, name) in TRAIN_FILES.iter().enumerate() {
            fs::write(dir.path().join(name), record(i as u8, 1)).unwrap();
        }
        fs::write(dir.path().join(TEST_FILE), [record(0, 2), record(1, 2)].concat()).unwrap();

        let loader = CifarLoader::new(dir.path());
        let train  = loader.load_train().unwrap();
        let test   = loader.load_test().unwrap();

        assert_eq!(train.len(), 5);
        assert_eq!(train.iter().map(|r| r.label).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        assert_eq!(test.len(), 2);
        assert_eq!(loader.record_shape(), CIFAR_SHAPE);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let loader = CifarLoader::new("/definitely/not/here");
        assert!(loader.load_train().is_err());
    }
}
