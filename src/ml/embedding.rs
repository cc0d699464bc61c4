// ============================================================
// Layer 5 — Token Embeddings
// ============================================================
// Three embedding concerns shared by both model families:
//
//   TokenEmbedding       — lookup scaled by √d_model, as in the
//                          Transformer paper (§3.4)
//   pretrained_embedding — an Embedding whose weight is copied
//                          from loaded word vectors, optionally
//                          frozen (gradients disabled for good)
//   zero_padding_row     — zeroes the padding id's row; Burn has
//                          no padding_idx, and padded positions
//                          are masked out downstream anyway

use burn::{
    module::Param,
    nn::{Embedding, EmbeddingConfig},
    prelude::*,
};

use crate::data::pretrained::WordVectors;

// ─── TokenEmbedding ───────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct TokenEmbeddingConfig {
    pub vocab_size: usize,
    pub emb_size: usize,
    #[config(default = 0)]
    pub padding_idx: usize,
}

impl TokenEmbeddingConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TokenEmbedding<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.emb_size).init(device);
        TokenEmbedding {
            embedding: zero_padding_row(embedding, self.padding_idx),
            emb_size: self.emb_size,
        }
    }
}

/// Token embedding whose lookup is scaled by √emb_size so the
/// embedding signal and the positional encoding have comparable
/// magnitudes.
#[derive(Module, Debug)]
pub struct TokenEmbedding<B: Backend> {
    pub embedding: Embedding<B>,
    pub emb_size: usize,
}

impl<B: Backend> TokenEmbedding<B> {
    /// tokens: [batch, seq] → [batch, seq, emb_size]
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        self.embedding.forward(tokens) * (self.emb_size as f64).sqrt()
    }
}

// ─── Pretrained / frozen embeddings ───────────────────────────────────────────

/// Build an Embedding from pretrained word vectors.
///
/// With `frozen`, the weight's gradient requirement is disabled at
/// construction: the optimizer never sees the parameter again, so the
/// matrix stays bit-identical for the lifetime of the model.
pub fn pretrained_embedding<B: Backend>(
    vectors: &WordVectors,
    frozen: bool,
    device: &B::Device,
) -> Embedding<B> {
    let weight = vectors.to_tensor::<B>(device);
    let weight = if frozen {
        weight.set_require_grad(false)
    } else {
        weight
    };
    let mut embedding = EmbeddingConfig::new(vectors.rows(), vectors.dim).init(device);
    embedding.weight = Param::from_tensor(weight);
    embedding
}

/// Zero the padding id's embedding row.
pub fn zero_padding_row<B: Backend>(
    mut embedding: Embedding<B>,
    padding_idx: usize,
) -> Embedding<B> {
    embedding.weight = embedding.weight.map(|w| {
        let [_, dim] = w.dims();
        let zeros = Tensor::zeros([1, dim], &w.device());
        w.slice_assign([padding_idx..padding_idx + 1, 0..dim], zeros)
    });
    embedding
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_scaled_lookup_shape() {
        let device = Default::default();
        let emb = TokenEmbeddingConfig::new(10, 16).init::<TestBackend>(&device);
        let tokens = Tensor::<TestBackend, 1, Int>::from_ints([1, 2, 3], &device).reshape([1, 3]);
        assert_eq!(emb.forward(tokens).dims(), [1, 3, 16]);
    }

    #[test]
    fn test_padding_row_is_zero() {
        let device = Default::default();
        let emb = TokenEmbeddingConfig::new(10, 8).init::<TestBackend>(&device);
        let tokens = Tensor::<TestBackend, 1, Int>::from_ints([0], &device).reshape([1, 1]);
        let looked_up: Vec<f32> = emb
            .forward(tokens)
            .into_data()
            .to_vec()
            .unwrap();
        assert!(looked_up.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_pretrained_weights_are_copied() {
        let device = Default::default();
        let wv = WordVectors::from_text("a 1.0 2.0\nb 3.0 4.0\n").unwrap();
        let emb = pretrained_embedding::<TestBackend>(&wv, true, &device);
        let data: Vec<f32> = emb.weight.val().into_data().to_vec().unwrap();
        assert_eq!(data, vec![1.0, 2.0, 3.0, 4.0]);
    }
}
