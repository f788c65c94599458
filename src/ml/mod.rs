// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The architectures, the Burn adapter behind the ModelHandle
// trait, and the generic minibatch runner.
//
//   model.rs      — ImageClassifier trait and ModelKind
//   layers.rs     — Conv + BatchNorm building block
//   resnet.rs     — residual network
//   two_branch.rs — 3×3 / 5×5 two-branch network
//   handle.rs     — BurnModelHandle: predict / loss / Adam update
//   runner.rs     — shuffle, chunk, score, accumulate, report
//
// runner.rs never touches Burn tensors: it only sees the
// ModelHandle trait, so it is tested with plain fake models.
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Classifier trait and architecture selector
pub mod model;

/// Shared convolution block
pub mod layers;

/// ResNet-style architecture
pub mod resnet;

/// Two-branch CNN architecture
pub mod two_branch;

/// Burn implementation of the ModelHandle capabilities
pub mod handle;

/// Generic minibatch training / evaluation loop
pub mod runner;
