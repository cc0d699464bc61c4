// ============================================================
// Layer 5 — Attention Masks
// ============================================================
// Burn attention consumes boolean masks: `true` means the
// position is HIDDEN from attention. Two kinds are needed:
//
//   padding mask — [batch, seq], true where the token is the
//                  padding id; keeps attention scores off the
//                  padded tail of every sequence
//   causal mask  — [batch, seq, seq], true strictly above the
//                  diagonal; position i may attend to j iff
//                  j <= i, which is what makes the decoder
//                  autoregressive
//
// Encoder self-attention gets NO causal mask — it is fully
// bidirectional over the non-padding source tokens.

use burn::nn::attention::generate_autoregressive_mask;
use burn::prelude::*;

/// Boolean padding mask: `true` where `tokens` equals the padding id.
///
/// `tokens` is batch-first [batch, seq]; the result broadcasts over
/// every attention computation that receives it.
pub fn padding_mask<B: Backend>(
    tokens: Tensor<B, 2, Int>,
    padding_idx: usize,
) -> Tensor<B, 2, Bool> {
    tokens.equal_elem(padding_idx as i32)
}

/// Causal (subsequent-position) mask of shape [batch, size, size].
///
/// Size 1 is trivially all-visible; size 0 yields an empty mask so
/// degenerate inputs fail later with a shape error instead of here.
pub fn causal_mask<B: Backend>(
    batch_size: usize,
    size: usize,
    device: &B::Device,
) -> Tensor<B, 3, Bool> {
    if size == 0 {
        return Tensor::<B, 3, Bool>::empty([batch_size, 0, 0], device);
    }
    generate_autoregressive_mask::<B>(batch_size, size, device)
}
