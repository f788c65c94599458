// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that define the core
// concepts of the system.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Think of this layer as the "dictionary" of the system —
// it defines what things ARE, not how they work.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A labelled image record and a gathered minibatch of them
pub mod sample;

// Error taxonomy shared by the runner and the checkpoint adapter
pub mod error;

// Epoch accumulators and progress reports
pub mod stats;

// Core abstractions (traits) that other layers implement
pub mod traits;
