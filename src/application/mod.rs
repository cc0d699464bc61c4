// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no ML math, no printing, no direct
// tensor code. Each use case wires the data, ml, and infra layers
// together for one user-visible goal.

// The training workflow
pub mod train_use_case;

// The greedy-decode translation workflow
pub mod translate_use_case;

// The test-set evaluation workflow
pub mod evaluate_use_case;
