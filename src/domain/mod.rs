// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits that define the core concepts
// of the system. No Burn types, no file I/O, no ML code —
// everything here is testable without a tensor backend.

// A single source/target sentence pair from the parallel corpus
pub mod sentence_pair;

// Core abstractions (traits) that other layers implement
pub mod traits;
