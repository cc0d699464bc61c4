// ============================================================
// Layer 5 — Recurrent Seq2Seq (LSTM encoder / decoder)
// ============================================================
// The recurrent pair is a library building block: an external
// training loop owns teacher forcing and optimisation, feeding
// decoder outputs and states back in step by step.
//
// Variable-length handling: Burn has no packed sequences, so the
// encoder walks the time axis itself and freezes each example's
// (hidden, cell) state once that example's real length is
// exhausted, zeroing its outputs past the end. Final states are
// therefore taken at each example's true length, not at the
// padded width — the same contract packed sequences give.
// Unsorted lengths need no special handling in this form.

use anyhow::{bail, Context, Result};
use burn::{
    nn::{
        Embedding, EmbeddingConfig, Linear, LinearConfig, Lstm, LstmConfig, LstmState,
    },
    prelude::*,
};

use crate::data::pretrained::WordVectors;
use crate::ml::embedding::{pretrained_embedding, zero_padding_row};
use crate::ml::init::{init_first_lstm_layer, xavier_linear};

// ─── Encoder ──────────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct LstmEncoderConfig {
    /// Source vocabulary size
    pub input_dim: usize,
    /// Embedding and LSTM hidden dimension
    pub hidden_dim: usize,
    #[config(default = 0)]
    pub padding_idx: usize,
    #[config(default = 4)]
    pub num_layers: usize,
}

impl LstmEncoderConfig {
    /// Build the encoder. Pretrained vectors are optional here — when
    /// given they seed the (trainable) source embedding; when absent
    /// the embedding is learned from scratch.
    pub fn init<B: Backend>(
        &self,
        pretrained: Option<&WordVectors>,
        device: &B::Device,
    ) -> Result<LstmEncoder<B>> {
        let embedding = match pretrained {
            Some(wv) => {
                wv.check_shape(self.input_dim, self.hidden_dim)
                    .context("encoder pretrained vectors")?;
                pretrained_embedding(wv, false, device)
            }
            None => zero_padding_row(
                EmbeddingConfig::new(self.input_dim, self.hidden_dim).init(device),
                self.padding_idx,
            ),
        };

        Ok(LstmEncoder {
            embedding,
            layers: build_lstm_stack(self.hidden_dim, self.num_layers, device),
            padding_idx: self.padding_idx,
            hidden_dim: self.hidden_dim,
        })
    }
}

#[derive(Module, Debug)]
pub struct LstmEncoder<B: Backend> {
    pub embedding: Embedding<B>,
    pub layers: Vec<Lstm<B>>,
    pub padding_idx: usize,
    pub hidden_dim: usize,
}

impl<B: Backend> LstmEncoder<B> {
    /// source: [src_len, batch] time-major Int tensor, right-padded.
    ///
    /// Returns the padded hidden-state sequence [src_len, batch, hidden]
    /// (time-major, zeroed past each example's length) and the final
    /// (hidden, cell) state of every layer.
    ///
    /// An example made entirely of padding has length 0 — there is no
    /// meaningful state to return for it, so the whole batch is
    /// rejected before the recurrence runs.
    pub fn forward(
        &self,
        source: Tensor<B, 2, Int>,
    ) -> Result<(Tensor<B, 3>, Vec<LstmState<B, 2>>)> {
        let tokens = source.swap_dims(0, 1); // [batch, seq]
        let lengths = sequence_lengths(&tokens, self.padding_idx)?;

        let [batch_size, _seq_len] = tokens.dims();
        let device = tokens.device();
        let lengths_col = Tensor::<B, 1, Int>::from_ints(lengths.as_slice(), &device)
            .reshape([batch_size, 1]);

        let mut x = self.embedding.forward(tokens); // [batch, seq, hidden]
        let mut final_states = Vec::with_capacity(self.layers.len());
        for lstm in &self.layers {
            let (h, state) = masked_lstm_forward(lstm, x, &lengths_col, self.hidden_dim);
            final_states.push(state);
            x = h;
        }

        Ok((x.swap_dims(0, 1), final_states))
    }

    /// Per-example non-padding counts, for callers that only need the
    /// lengths (e.g. bucketing). Same zero-length policy as forward.
    pub fn lengths(&self, source: Tensor<B, 2, Int>) -> Result<Vec<i32>> {
        sequence_lengths(&source.swap_dims(0, 1), self.padding_idx)
    }
}

// ─── Decoder ──────────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct LstmDecoderConfig {
    /// Embedding and LSTM hidden dimension
    pub hidden_dim: usize,
    /// Target vocabulary size
    pub output_dim: usize,
    #[config(default = 0)]
    pub padding_idx: usize,
    #[config(default = 4)]
    pub num_layers: usize,
}

impl LstmDecoderConfig {
    /// Build the decoder. The target embedding is copied from the
    /// pretrained vectors and FROZEN — no optimizer step may ever
    /// change it.
    pub fn init<B: Backend>(
        &self,
        pretrained: &WordVectors,
        device: &B::Device,
    ) -> Result<LstmDecoder<B>> {
        pretrained
            .check_shape(self.output_dim, self.hidden_dim)
            .context("decoder pretrained vectors")?;

        let out = LinearConfig::new(self.hidden_dim, self.output_dim).init(device);

        Ok(LstmDecoder {
            embedding: pretrained_embedding(pretrained, true, device),
            layers: build_lstm_stack(self.hidden_dim, self.num_layers, device),
            out: xavier_linear(out, self.hidden_dim, self.output_dim, device),
        })
    }
}

#[derive(Module, Debug)]
pub struct LstmDecoder<B: Backend> {
    pub embedding: Embedding<B>,
    pub layers: Vec<Lstm<B>>,
    pub out: Linear<B>,
}

impl<B: Backend> LstmDecoder<B> {
    /// target: [steps, batch] time-major — one step during inference,
    /// the full teacher-forced sequence during training.
    /// `states` seeds each LSTM layer (normally the encoder's finals).
    ///
    /// Returns vocabulary logits [steps, batch, output_dim] and the
    /// updated per-layer states.
    pub fn forward(
        &self,
        target: Tensor<B, 2, Int>,
        states: Vec<LstmState<B, 2>>,
    ) -> Result<(Tensor<B, 3>, Vec<LstmState<B, 2>>)> {
        if states.len() != self.layers.len() {
            bail!(
                "Decoder got {} layer states but has {} layers",
                states.len(),
                self.layers.len()
            );
        }

        let mut x = self.embedding.forward(target.swap_dims(0, 1)); // [batch, steps, hidden]
        let mut next_states = Vec::with_capacity(self.layers.len());
        for (lstm, state) in self.layers.iter().zip(states) {
            let (h, s) = lstm.forward(x, Some(state));
            next_states.push(s);
            x = h;
        }

        let logits = self.out.forward(x); // [batch, steps, output_dim]
        Ok((logits.swap_dims(0, 1), next_states))
    }
}

// ─── Shared internals ─────────────────────────────────────────────────────────

/// Stacked LSTM layers, all hidden_dim → hidden_dim, with the mixed
/// Xavier/orthogonal policy applied to the first layer only.
fn build_lstm_stack<B: Backend>(
    hidden_dim: usize,
    num_layers: usize,
    device: &B::Device,
) -> Vec<Lstm<B>> {
    (0..num_layers)
        .map(|layer| {
            let lstm = LstmConfig::new(hidden_dim, hidden_dim, true).init(device);
            if layer == 0 {
                init_first_lstm_layer(lstm, hidden_dim, hidden_dim, device)
            } else {
                lstm
            }
        })
        .collect()
}

/// Count non-padding tokens per example. tokens: [batch, seq].
/// Errors if any example has length 0.
fn sequence_lengths<B: Backend>(
    tokens: &Tensor<B, 2, Int>,
    padding_idx: usize,
) -> Result<Vec<i32>> {
    let counts = tokens
        .clone()
        .not_equal_elem(padding_idx as i32)
        .int()
        .sum_dim(1); // [batch, 1]

    let lengths: Vec<i64> = counts
        .into_data()
        .convert::<i64>()
        .to_vec()
        .map_err(|e| anyhow::anyhow!("Cannot read sequence lengths: {e:?}"))?;

    for (i, &len) in lengths.iter().enumerate() {
        if len == 0 {
            bail!("Example {i} in the batch is all padding (zero length)");
        }
    }

    Ok(lengths.iter().map(|&l| l as i32).collect())
}

/// Run one LSTM layer over [batch, seq, d] input, freezing each
/// example's state at its true length and zeroing later outputs.
fn masked_lstm_forward<B: Backend>(
    lstm: &Lstm<B>,
    input: Tensor<B, 3>,
    lengths_col: &Tensor<B, 2, Int>, // [batch, 1]
    d_hidden: usize,
) -> (Tensor<B, 3>, LstmState<B, 2>) {
    let [batch_size, seq_len, _] = input.dims();
    let device = input.device();

    let mut hidden = Tensor::<B, 2>::zeros([batch_size, d_hidden], &device);
    let mut cell = Tensor::<B, 2>::zeros([batch_size, d_hidden], &device);
    let mut outputs = Vec::with_capacity(seq_len);

    for t in 0..seq_len {
        let step = input.clone().slice([0..batch_size, t..t + 1]); // [batch, 1, d]
        let (h_seq, state) = lstm.forward(
            step,
            Some(LstmState::new(cell.clone(), hidden.clone())),
        );

        // 1.0 while t is inside the example, 0.0 once past its length
        let active = lengths_col
            .clone()
            .greater_elem(t as i32)
            .float(); // [batch, 1]
        let inactive = active.clone().neg() + 1.0;

        hidden = state.hidden * active.clone() + hidden * inactive.clone();
        cell = state.cell * active.clone() + cell * inactive;
        outputs.push(h_seq.squeeze::<2>(1) * active);
    }

    let h = Tensor::stack::<3>(outputs, 1); // [batch, seq, d]
    (h, LstmState::new(cell, hidden))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::optim::{AdamConfig, GradientsParams, Optimizer};

    type TestBackend = burn::backend::NdArray;
    type AutodiffBackend = burn::backend::Autodiff<burn::backend::NdArray>;

    /// Identity-ish pretrained vectors sized [vocab, hidden].
    fn vectors(vocab: usize, hidden: usize) -> WordVectors {
        let text: String = (0..vocab)
            .map(|i| {
                let row: Vec<String> = (0..hidden)
                    .map(|j| format!("{:.1}", ((i + j) % 5) as f32 * 0.1))
                    .collect();
                format!("w{} {}\n", i, row.join(" "))
            })
            .collect();
        WordVectors::from_text(&text).unwrap()
    }

    /// Time-major [seq, batch] tensor from per-example rows.
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
    fn test_encoder_output_keeps_time_dimension() {
        let device = Default::default();
        let encoder = LstmEncoderConfig::new(10, 8)
            .with_num_layers(2)
            .init::<TestBackend>(None, &device)
            .unwrap();
        let source = time_major(&[&[5, 7, 0], &[3, 1, 2]]);
        let (h, states) = encoder.forward(source).unwrap();
        assert_eq!(h.dims(), [3, 2, 8]);
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].hidden.dims(), [2, 8]);
    }

    #[test]
    fn test_encoder_lengths_count_non_padding() {
        let device = Default::default();
        let encoder = LstmEncoderConfig::new(10, 4)
            .init::<TestBackend>(None, &device)
            .unwrap();
        let source = time_major(&[&[5, 7, 0], &[3, 0, 0]]);
        assert_eq!(encoder.lengths(source).unwrap(), vec![2, 1]);
    }

    #[test]
    fn test_encoder_rejects_all_padding_example() {
        let device = Default::default();
        let encoder = LstmEncoderConfig::new(10, 4)
            .init::<TestBackend>(None, &device)
            .unwrap();
        let source = time_major(&[&[5, 7, 0], &[0, 0, 0]]);
        assert!(encoder.forward(source).is_err());
    }

    #[test]
    fn test_encoder_state_frozen_past_length() {
        let device = Default::default();
        let encoder = LstmEncoderConfig::new(10, 4)
            .with_num_layers(1)
            .init::<TestBackend>(None, &device)
            .unwrap();

        // Same leading token; the shorter example must end with the
        // state it had at its own length, unaffected by the pad tail.
        let padded = time_major(&[&[5, 0, 0], &[5, 0, 0]]);
        let (h, states) = encoder.forward(padded).unwrap();

        let short = time_major(&[&[5]]);
        let (_, short_states) = encoder.forward(short).unwrap();

        let full: Vec<f32> = states[0].hidden.clone().into_data().to_vec().unwrap();
        let solo: Vec<f32> = short_states[0].hidden.clone().into_data().to_vec().unwrap();
        for (a, b) in full[..4].iter().zip(&solo) {
            assert!((a - b).abs() < 1e-6);
        }

        // Outputs past the length are zeroed
        let out: Vec<f32> = h.into_data().to_vec().unwrap();
        // time-major [3, 2, 4]: timesteps 1 and 2 are all padding
        assert!(out[8..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_decoder_shapes_and_state_threading() {
        let device = Default::default();
        let wv = vectors(12, 8);
        let decoder = LstmDecoderConfig::new(8, 12)
            .with_num_layers(2)
            .init::<TestBackend>(&wv, &device)
            .unwrap();

        let states = vec![
            LstmState::new(
                Tensor::zeros([2, 8], &device),
                Tensor::zeros([2, 8], &device),
            ),
            LstmState::new(
                Tensor::zeros([2, 8], &device),
                Tensor::zeros([2, 8], &device),
            ),
        ];
        let target = time_major(&[&[1, 4, 6], &[1, 5, 2]]);
        let (logits, next) = decoder.forward(target, states).unwrap();
        assert_eq!(logits.dims(), [3, 2, 12]);
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn test_decoder_rejects_wrong_state_count() {
        let device = Default::default();
        let wv = vectors(12, 8);
        let decoder = LstmDecoderConfig::new(8, 12)
            .with_num_layers(2)
            .init::<TestBackend>(&wv, &device)
            .unwrap();
        let target = time_major(&[&[1, 4]]);
        assert!(decoder.forward(target, Vec::new()).is_err());
    }

    #[test]
    fn test_decoder_pretrained_shape_mismatch_fails() {
        let device = Default::default();
        let wv = vectors(5, 8); // vocabulary says 12, vectors say 5
        assert!(LstmDecoderConfig::new(8, 12)
            .init::<TestBackend>(&wv, &device)
            .is_err());
    }

    #[test]
    fn test_frozen_embedding_survives_optimizer_step() {
        let device = Default::default();
        let wv = vectors(12, 8);
        let decoder = LstmDecoderConfig::new(8, 12)
            .with_num_layers(1)
            .init::<AutodiffBackend>(&wv, &device)
            .unwrap();

        let before: Vec<f32> = decoder.embedding.weight.val().into_data().to_vec().unwrap();
        let out_before: Vec<f32> = decoder.out.weight.val().into_data().to_vec().unwrap();

        let states = vec![LstmState::new(
            Tensor::zeros([1, 8], &device),
            Tensor::zeros([1, 8], &device),
        )];
        let target = {
            let flat: Vec<i32> = vec![1, 4, 6];
            Tensor::<AutodiffBackend, 1, Int>::from_ints(flat.as_slice(), &device)
                .reshape([1, 3])
                .swap_dims(0, 1)
        };

        let (logits, _) = decoder.forward(target, states).unwrap();
        let loss = logits.sum();
        let grads = GradientsParams::from_grads(loss.backward(), &decoder);
        let mut optim = AdamConfig::new().init();
        let decoder = optim.step(1e-2, decoder, grads);

        let after: Vec<f32> = decoder.embedding.weight.val().into_data().to_vec().unwrap();
        let out_after: Vec<f32> = decoder.out.weight.val().into_data().to_vec().unwrap();

        // Frozen pretrained embedding: bit-identical after the step
        assert_eq!(before, after);
        // The projection, by contrast, must have moved
        assert!(out_before.iter().zip(&out_after).any(|(a, b)| a != b));
    }
}
