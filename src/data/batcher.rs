// ============================================================
// Layer 4 — Translation Batcher
// ============================================================
// Implements Burn's Batcher trait: a Vec of variable-length
// samples becomes two padded Int tensors.
//
// Batch contract (kept from the original system): tensors are
// TIME-MAJOR — shape [seq_len, batch], batch dimension second.
// Burn's layers are batch-first, so the models transpose at
// their own boundary; the data layer never needs to know.
//
// Padding is dynamic per batch: each side is padded with the
// padding id (0) to the longest sequence in that batch only.

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::TranslationSample;
use crate::infra::tokenizer_store::PAD_ID;

// ─── TranslationBatch ─────────────────────────────────────────────────────────
/// A batch ready for the model step hooks.
#[derive(Debug, Clone)]
pub struct TranslationBatch<B: Backend> {
    /// Source token ids — shape: [src_len, batch_size], time-major
    pub source: Tensor<B, 2, Int>,

    /// Target token ids (with BOS/EOS) — shape: [tgt_len, batch_size]
    pub target: Tensor<B, 2, Int>,
}

// ─── TranslationBatcher ───────────────────────────────────────────────────────
/// Holds the target device so tensors land on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct TranslationBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TranslationBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Pad each id sequence to `max_len` and stack row-major into a
    /// [batch, max_len] tensor, then transpose to time-major.
    fn stack_time_major(&self, ids: Vec<&Vec<u32>>, max_len: usize) -> Tensor<B, 2, Int> {
        let batch_size = ids.len();
        let flat: Vec<i32> = ids
            .iter()
            .flat_map(|seq| {
                seq.iter()
                    .map(|&t| t as i32)
                    .chain(std::iter::repeat(PAD_ID as i32).take(max_len - seq.len()))
            })
            .collect();

        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([batch_size, max_len])
            .swap_dims(0, 1)
    }
}

impl<B: Backend> Batcher<TranslationSample, TranslationBatch<B>> for TranslationBatcher<B> {
    fn batch(&self, items: Vec<TranslationSample>) -> TranslationBatch<B> {
        let src_len = items.iter().map(|s| s.source_len()).max().unwrap_or(1);
        let tgt_len = items.iter().map(|s| s.target_len()).max().unwrap_or(1);

        let source = self.stack_time_major(items.iter().map(|s| &s.source_ids).collect(), src_len);
        let target = self.stack_time_major(items.iter().map(|s| &s.target_ids).collect(), tgt_len);

        TranslationBatch { source, target }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn sample(src: &[u32], tgt: &[u32]) -> TranslationSample {
        TranslationSample {
            source_ids: src.to_vec(),
            target_ids: tgt.to_vec(),
        }
    }

    #[test]
    fn test_batch_shapes_are_time_major() {
        let batcher = TranslationBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![
            sample(&[1, 5, 7, 2], &[1, 9, 2]),
            sample(&[1, 3, 2], &[1, 4, 6, 8, 2]),
        ]);
        // Longest source is 4, longest target is 5; batch of 2 sits second
        assert_eq!(batch.source.dims(), [4, 2]);
        assert_eq!(batch.target.dims(), [5, 2]);
    }

    #[test]
    fn test_short_sequences_are_padded_with_pad_id() {
        let batcher = TranslationBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![
            sample(&[1, 5, 7, 2], &[1, 2]),
            sample(&[1, 3, 2], &[1, 2]),
        ]);
        let data: Vec<i32> = batch
            .source
            .into_data()
            .convert::<i32>()
            .to_vec()
            .unwrap();
        // Time-major layout: row t holds token t of every example.
        // Second example has length 3, so its final timestep is padding.
        assert_eq!(data, vec![1, 1, 5, 3, 7, 2, 2, PAD_ID as i32]);
    }
}
