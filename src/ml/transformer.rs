// ============================================================
// Layer 5 — Transformer Seq2Seq
// ============================================================
// Encoder/decoder Transformer for translation with greedy
// autoregressive decoding. Blocks are built by hand from Burn's
// MultiHeadAttention / Linear / LayerNorm / Dropout primitives
// (post-norm residual layout).
//
// Two explicitly named entry points replace mode-switching on an
// optional target argument:
//
//   train_forward(source, target) — teacher-forced, parallel over
//       time; target is shifted by one position internally
//   infer_forward(source)         — greedy decode, one token per
//       step, strictly sequential
//
// All public tensors are TIME-MAJOR [seq, batch]; Burn's layers
// are batch-first, so both entry points transpose at the boundary.

use anyhow::{bail, Result};
use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig, LayerNorm, LayerNormConfig, Linear, LinearConfig,
        PositionalEncoding, PositionalEncodingConfig,
    },
    prelude::*,
    tensor::activation,
};

use crate::data::batcher::TranslationBatch;
use crate::ml::embedding::{TokenEmbedding, TokenEmbeddingConfig};
use crate::ml::masks::{causal_mask, padding_mask};

/// Fixed per-head width; the head count is derived from it.
pub const HEAD_DIM: usize = 64;

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct TransformerTranslatorConfig {
    pub src_vocab_size: usize,
    pub tgt_vocab_size: usize,
    #[config(default = 6)]
    pub num_layers: usize,
    /// Model dimension; must be divisible by HEAD_DIM
    #[config(default = 512)]
    pub emb_size: usize,
    #[config(default = 140)]
    pub max_len: usize,
    #[config(default = 2048)]
    pub d_ff: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
    #[config(default = 0)]
    pub padding_idx: usize,
    #[config(default = 1)]
    pub bos_idx: usize,
    #[config(default = 2)]
    pub eos_idx: usize,
}

impl TransformerTranslatorConfig {
    /// Attention head count derived from the model dimension.
    pub fn head_count(&self) -> usize {
        self.emb_size / HEAD_DIM
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<TransformerTranslator<B>> {
        if self.emb_size == 0 || self.emb_size % HEAD_DIM != 0 {
            bail!(
                "emb_size {} is not divisible by the per-head width {}",
                self.emb_size,
                HEAD_DIM
            );
        }

        let src_tok_emb = TokenEmbeddingConfig::new(self.src_vocab_size, self.emb_size)
            .with_padding_idx(self.padding_idx)
            .init(device);
        let tgt_tok_emb = TokenEmbeddingConfig::new(self.tgt_vocab_size, self.emb_size)
            .with_padding_idx(self.padding_idx)
            .init(device);
        let positional = PositionalEncodingConfig::new(self.emb_size)
            .with_max_sequence_size(self.max_len)
            .init(device);

        let encoder = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let decoder = (0..self.num_layers)
            .map(|_| self.build_decoder_block(device))
            .collect();

        let generator = LinearConfig::new(self.emb_size, self.tgt_vocab_size).init(device);

        Ok(TransformerTranslator {
            src_tok_emb,
            tgt_tok_emb,
            positional,
            encoder,
            decoder,
            generator,
            padding_idx: self.padding_idx,
            bos_idx: self.bos_idx,
            eos_idx: self.eos_idx,
            max_len: self.max_len,
        })
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        EncoderBlock {
            self_attn: self.build_attention(device),
            ffn_linear1: LinearConfig::new(self.emb_size, self.d_ff).init(device),
            ffn_linear2: LinearConfig::new(self.d_ff, self.emb_size).init(device),
            norm1: LayerNormConfig::new(self.emb_size).init(device),
            norm2: LayerNormConfig::new(self.emb_size).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }

    fn build_decoder_block<B: Backend>(&self, device: &B::Device) -> DecoderBlock<B> {
        DecoderBlock {
            self_attn: self.build_attention(device),
            cross_attn: self.build_attention(device),
            ffn_linear1: LinearConfig::new(self.emb_size, self.d_ff).init(device),
            ffn_linear2: LinearConfig::new(self.d_ff, self.emb_size).init(device),
            norm1: LayerNormConfig::new(self.emb_size).init(device),
            norm2: LayerNormConfig::new(self.emb_size).init(device),
            norm3: LayerNormConfig::new(self.emb_size).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }

    fn build_attention<B: Backend>(&self, device: &B::Device) -> MultiHeadAttention<B> {
        MultiHeadAttentionConfig::new(self.emb_size, self.head_count())
            .with_dropout(self.dropout)
            .init(device)
    }
}

// ─── Blocks ───────────────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    self_attn: MultiHeadAttention<B>,
    ffn_linear1: Linear<B>,
    ffn_linear2: Linear<B>,
    norm1: LayerNorm<B>,
    norm2: LayerNorm<B>,
    dropout: Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// Bidirectional self-attention: padding mask only, no causal mask.
    fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn = self
            .self_attn
            .forward(MhaInput::self_attn(x.clone()).mask_pad(pad_mask))
            .context;
        let x = self.norm1.forward(x + self.dropout.forward(attn));

        let ffn = self
            .ffn_linear2
            .forward(activation::relu(self.ffn_linear1.forward(x.clone())));
        self.norm2.forward(x + self.dropout.forward(ffn))
    }
}

#[derive(Module, Debug)]
pub struct DecoderBlock<B: Backend> {
    self_attn: MultiHeadAttention<B>,
    cross_attn: MultiHeadAttention<B>,
    ffn_linear1: Linear<B>,
    ffn_linear2: Linear<B>,
    norm1: LayerNorm<B>,
    norm2: LayerNorm<B>,
    norm3: LayerNorm<B>,
    dropout: Dropout,
}

impl<B: Backend> DecoderBlock<B> {
    fn forward(
        &self,
        x: Tensor<B, 3>,
        memory: Tensor<B, 3>,
        causal: Tensor<B, 3, Bool>,
        tgt_pad: Option<Tensor<B, 2, Bool>>,
        memory_pad: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        // Causal self-attention over the target prefix
        let mut input = MhaInput::self_attn(x.clone()).mask_attn(causal);
        if let Some(mask) = tgt_pad {
            input = input.mask_pad(mask);
        }
        let attn = self.self_attn.forward(input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn));

        // Cross-attention into the encoder memory
        let cross = MhaInput::new(x.clone(), memory.clone(), memory).mask_pad(memory_pad);
        let attn = self.cross_attn.forward(cross).context;
        let x = self.norm2.forward(x + self.dropout.forward(attn));

        let ffn = self
            .ffn_linear2
            .forward(activation::relu(self.ffn_linear1.forward(x.clone())));
        self.norm3.forward(x + self.dropout.forward(ffn))
    }
}

// ─── Model ────────────────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct TransformerTranslator<B: Backend> {
    pub src_tok_emb: TokenEmbedding<B>,
    pub tgt_tok_emb: TokenEmbedding<B>,
    pub positional: PositionalEncoding<B>,
    pub encoder: Vec<EncoderBlock<B>>,
    pub decoder: Vec<DecoderBlock<B>>,
    pub generator: Linear<B>,
    pub padding_idx: usize,
    pub bos_idx: usize,
    pub eos_idx: usize,
    pub max_len: usize,
}

impl<B: Backend> TransformerTranslator<B> {
    /// Encode a batch-first source into memory; also returns the source
    /// padding mask, which every decoder layer reuses for cross-attention.
    fn encode(&self, source_bf: Tensor<B, 2, Int>) -> (Tensor<B, 3>, Tensor<B, 2, Bool>) {
        let pad = padding_mask(source_bf.clone(), self.padding_idx);
        let mut x = self.positional.forward(self.src_tok_emb.forward(source_bf));
        for block in &self.encoder {
            x = block.forward(x, pad.clone());
        }
        (x, pad)
    }

    /// Decode a batch-first target prefix against the memory.
    fn decode(
        &self,
        target_bf: Tensor<B, 2, Int>,
        memory: Tensor<B, 3>,
        memory_pad: Tensor<B, 2, Bool>,
        tgt_pad: Option<Tensor<B, 2, Bool>>,
    ) -> Tensor<B, 3> {
        let [batch_size, steps] = target_bf.dims();
        let causal = causal_mask::<B>(batch_size, steps, &target_bf.device());

        let mut x = self.positional.forward(self.tgt_tok_emb.forward(target_bf));
        for block in &self.decoder {
            x = block.forward(
                x,
                memory.clone(),
                causal.clone(),
                tgt_pad.clone(),
                memory_pad.clone(),
            );
        }
        x
    }

    /// Teacher-forced forward pass.
    ///
    /// source: [src_len, batch], target: [tgt_len, batch] — both
    /// time-major, target bracketed with BOS/EOS. The decoder consumes
    /// target[..tgt_len-1]; the caller compares the result against
    /// target[1..]. Returns logits [tgt_len-1, batch, tgt_vocab].
    pub fn train_forward(
        &self,
        source: Tensor<B, 2, Int>,
        target: Tensor<B, 2, Int>,
    ) -> Tensor<B, 3> {
        let [tgt_len, _] = target.dims();
        let tgt_input = target.slice([0..tgt_len - 1]);

        let source_bf = source.swap_dims(0, 1);
        let target_bf = tgt_input.swap_dims(0, 1);

        let (memory, src_pad) = self.encode(source_bf);
        let tgt_pad = padding_mask(target_bf.clone(), self.padding_idx);
        let out = self.decode(target_bf, memory, src_pad, Some(tgt_pad));

        self.generator.forward(out).swap_dims(0, 1)
    }

    /// Greedy autoregressive decode for a single source sequence.
    ///
    /// source: [src_len, 1] time-major. The loop appends the argmax
    /// token each step and stops on EOS or at `max_len` tokens; either
    /// bound guarantees termination.
    pub fn greedy_decode(&self, source: Tensor<B, 2, Int>, max_len: usize) -> Vec<u32> {
        let device = source.device();
        let (memory, src_pad) = self.encode(source.swap_dims(0, 1));

        let mut tokens: Vec<i32> = vec![self.bos_idx as i32];
        while tokens.len() < max_len {
            let steps = tokens.len();
            let target = Tensor::<B, 1, Int>::from_ints(tokens.as_slice(), &device)
                .reshape([1, steps]);

            let out = self.decode(target, memory.clone(), src_pad.clone(), None);
            let last = out.slice([0..1, steps - 1..steps]); // [1, 1, emb]
            let logits = self.generator.forward(last); // [1, 1, vocab]

            let next = logits.argmax(2).into_scalar().elem::<i64>() as i32;
            tokens.push(next);
            if next as usize == self.eos_idx {
                break;
            }
        }

        tokens.into_iter().map(|t| t as u32).collect()
    }

    /// Inference entry point: greedy decode bounded by the configured
    /// maximum length.
    pub fn infer_forward(&self, source: Tensor<B, 2, Int>) -> Vec<u32> {
        self.greedy_decode(source, self.max_len)
    }

    // ── Loss / metrics ────────────────────────────────────────────────────────

    /// Padding-aware cross-entropy over flattened logits.
    /// preds: [steps, batch, vocab], target_out: [steps, batch].
    pub fn compute_loss(&self, preds: Tensor<B, 3>, target_out: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        let [steps, batch_size, vocab] = preds.dims();
        let logits = preds.reshape([steps * batch_size, vocab]);
        let targets = target_out.reshape([steps * batch_size]);

        CrossEntropyLossConfig::new()
            .with_pad_tokens(Some(vec![self.padding_idx]))
            .init(&logits.device())
            .forward(logits, targets)
    }

    /// Token-level accuracy with padding positions excluded entirely.
    pub fn compute_accuracy(&self, preds: Tensor<B, 3>, target_out: Tensor<B, 2, Int>) -> f64 {
        let [steps, batch_size, vocab] = preds.dims();
        let logits = preds.reshape([steps * batch_size, vocab]);
        let targets = target_out.reshape([steps * batch_size]);

        // argmax(1) returns [N, 1]; flatten before comparing
        let predicted = logits.argmax(1).flatten::<1>(0, 1);
        let valid = targets.clone().not_equal_elem(self.padding_idx as i32);

        let correct: i64 = (predicted.equal(targets).int() * valid.clone().int())
            .sum()
            .into_scalar()
            .elem::<i64>();
        let total: i64 = valid.int().sum().into_scalar().elem::<i64>();

        if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        }
    }

    // ── Step hooks ────────────────────────────────────────────────────────────

    pub fn training_step(&self, batch: &TranslationBatch<B>) -> Tensor<B, 1> {
        self.step_loss(batch)
    }

    pub fn validation_step(&self, batch: &TranslationBatch<B>) -> Tensor<B, 1> {
        self.step_loss(batch)
    }

    pub fn test_step(&self, batch: &TranslationBatch<B>) -> (Tensor<B, 1>, f64) {
        let [tgt_len, _] = batch.target.dims();
        let tgt_out = batch.target.clone().slice([1..tgt_len]);
        let preds = self.train_forward(batch.source.clone(), batch.target.clone());
        let loss = self.compute_loss(preds.clone(), tgt_out.clone());
        let acc = self.compute_accuracy(preds, tgt_out);
        (loss, acc)
    }

    fn step_loss(&self, batch: &TranslationBatch<B>) -> Tensor<B, 1> {
        let [tgt_len, _] = batch.target.dims();
        let tgt_out = batch.target.clone().slice([1..tgt_len]);
        let preds = self.train_forward(batch.source.clone(), batch.target.clone());
        self.compute_loss(preds, tgt_out)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn tiny_config() -> TransformerTranslatorConfig {
        TransformerTranslatorConfig::new(12, 12)
            .with_num_layers(1)
            .with_emb_size(64)
            .with_d_ff(32)
            .with_max_len(8)
            .with_dropout(0.0)
    }

    fn time_major(rows: &[&[i32]]) -> Tensor<TestBackend, 2, Int> {
        let device = Default::default();
        let batch = rows.len();
        let seq = rows[0].len();
        let flat: Vec<i32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Tensor::<TestBackend, 1, Int>::from_ints(flat.as_slice(), &device)
            .reshape([batch, seq])
            .swap_dims(0, 1)
    }

    #[test]
    fn test_head_count_is_derived_from_emb_size() {
        let cfg = TransformerTranslatorConfig::new(12, 12).with_emb_size(128);
        assert_eq!(cfg.head_count(), 2);
        let device = Default::default();
        assert!(cfg.init::<TestBackend>(&device).is_ok());
    }

    #[test]
    fn test_indivisible_emb_size_fails_construction() {
        let device = Default::default();
        let cfg = TransformerTranslatorConfig::new(12, 12).with_emb_size(100);
        assert!(cfg.init::<TestBackend>(&device).is_err());
    }

    #[test]
    fn test_train_forward_output_shape() {
        let device = Default::default();
        let model = tiny_config().init::<TestBackend>(&device).unwrap();
        let source = time_major(&[&[1, 5, 7, 2], &[1, 3, 2, 0]]);
        let target = time_major(&[&[1, 9, 4, 2, 0], &[1, 8, 2, 0, 0]]);
        let logits = model.train_forward(source, target);
        // [tgt_len - 1, batch, vocab]
        assert_eq!(logits.dims(), [4, 2, 12]);
    }

    #[test]
    fn test_greedy_decode_terminates_within_max_len() {
        let device = Default::default();
        let model = tiny_config().init::<TestBackend>(&device).unwrap();
        let source = time_major(&[&[1, 5, 7, 2]]);
        let decoded = model.infer_forward(source);

        assert!(!decoded.is_empty());
        assert!(decoded.len() <= 8);
        assert_eq!(decoded[0], 1); // starts from BOS
        // Either hit EOS or the length bound
        assert!(decoded.last() == Some(&2) || decoded.len() == 8);
    }

    #[test]
    fn test_loss_ignores_padding_positions() {
        let device = Default::default();
        let model = tiny_config().init::<TestBackend>(&device).unwrap();

        // Fixed logits over 2 timesteps of 1 example; second step padded
        let preds = Tensor::<TestBackend, 1>::from_floats(
            [
                0.5, -0.2, 0.1, 0.9, 0.0, 0.3, -0.4, 0.2, 0.8, -0.1, 0.6, 0.4, //
                0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0, 1.1, 1.2,
            ],
            &device,
        )
        .reshape([2, 1, 12]);

        let with_pad = Tensor::<TestBackend, 1, Int>::from_ints([4, 0], &device).reshape([2, 1]);
        let loss_padded: f32 = model
            .compute_loss(preds.clone(), with_pad)
            .into_scalar()
            .elem();

        // Same logits restricted to the one real position
        let only_real = preds.slice([0..1]);
        let real_target = Tensor::<TestBackend, 1, Int>::from_ints([4], &device).reshape([1, 1]);
        let loss_real: f32 = model
            .compute_loss(only_real, real_target)
            .into_scalar()
            .elem();

        assert!(
            (loss_padded - loss_real).abs() < 1e-5,
            "padded {loss_padded} vs real {loss_real}"
        );
    }

    #[test]
    fn test_accuracy_excludes_padding() {
        let device = Default::default();
        let model = tiny_config().init::<TestBackend>(&device).unwrap();

        // One-hot-ish logits predicting token 3 at both steps
        let mut raw = vec![0.0f32; 2 * 12];
        raw[3] = 5.0;
        raw[12 + 3] = 5.0;
        let preds = Tensor::<TestBackend, 1>::from_floats(raw.as_slice(), &device)
            .reshape([2, 1, 12]);

        // First step correct, second step is padding → accuracy 1.0
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([3, 0], &device).reshape([2, 1]);
        assert!((model.compute_accuracy(preds, targets) - 1.0).abs() < 1e-9);
    }
}
