// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by several other layers:
//
//   checkpoint.rs      — Saving and loading model weights with
//                        Burn's CompactRecorder, plus the model
//                        config JSON needed to rebuild the exact
//                        architecture at inference time.
//
//   tokenizer_store.rs — Word-level vocabulary persistence. The
//                        same tokenizer.json must serve training,
//                        evaluation, and translation.
//
//   metrics.rs         — CSV logging of per-epoch training
//                        metrics and final test metrics.

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Metrics CSV logger
pub mod metrics;
