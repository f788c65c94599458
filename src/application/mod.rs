// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training a network or scoring a checkpoint).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing here (that's Layer 1)
//   - No direct file formats (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Both use cases pick the Burn backend and the architecture
// here, then hand a concrete ModelHandle to the generic runner.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// The test-split evaluation workflow
pub mod evaluate_use_case;
