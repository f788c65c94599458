// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the CIFAR-10 binary files to tensor batches.
//
// The pipeline flows in this order:
//
//   data_batch_*.bin / test_batch.bin
//       │
//       ▼
//   CifarLoader      → decodes 3073-byte records into ImageItems
//       │
//       ▼
//   split_cifar      → training / validation / test ranges
//       │
//       ▼
//   MeanImage        → subtracts the training mean image
//       │
//       ▼
//   ImageDataset     → implements Burn's Dataset trait
//       │
//       ▼
//   ImageBatcher     → stacks a minibatch into tensors
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads CIFAR-10 binary batch files
pub mod loader;

/// Mean-image subtraction
pub mod preprocessor;

/// Contiguous train/validation/test split
pub mod splitter;

/// Implements Burn's Dataset trait for image records
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
