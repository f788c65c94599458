// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong in any specific
// business layer:
//
//   checkpoint.rs — Saving and restoring model weights with
//                   Burn's CompactRecorder, plus the
//                   TrainConfig JSON that lets `evaluate`
//                   rebuild the architecture.
//
//   metrics.rs    — Progress output: the console reporter and
//                   the per-epoch metrics CSV.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and restoring
pub mod checkpoint;

/// Console reporter and metrics CSV logger
pub mod metrics;
