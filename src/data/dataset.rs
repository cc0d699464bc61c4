// ============================================================
// Layer 4 — Translation Dataset
// ============================================================
// Token-id samples plus the Burn Dataset impl that lets the
// DataLoader index into them. Unlike the padded-ahead-of-time
// QA setup this grew out of, sequences keep their natural
// length here — padding is the batcher's job so every batch is
// only as wide as its longest member.

use anyhow::Result;
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::domain::sentence_pair::SentencePair;
use crate::infra::tokenizer_store::{BOS_ID, EOS_ID};

/// One tokenised sentence pair, ready for batching.
/// Both sides are bracketed as [BOS] tokens [EOS] and truncated
/// to the configured maximum length (EOS always survives).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationSample {
    pub source_ids: Vec<u32>,
    pub target_ids: Vec<u32>,
}

impl TranslationSample {
    pub fn source_len(&self) -> usize {
        self.source_ids.len()
    }

    pub fn target_len(&self) -> usize {
        self.target_ids.len()
    }
}

/// Encode one sentence as [BOS] ids [EOS], truncated to max_len.
pub fn encode_sentence(tokenizer: &Tokenizer, text: &str, max_len: usize) -> Result<Vec<u32>> {
    // BOS + EOS alone already need two slots
    let max_len = max_len.max(2);
    let enc = tokenizer
        .encode(text, false)
        .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;

    let mut ids = Vec::with_capacity(enc.get_ids().len() + 2);
    ids.push(BOS_ID);
    ids.extend_from_slice(enc.get_ids());
    ids.push(EOS_ID);

    // Truncate but keep the closing EOS so decode targets stay well-formed
    if ids.len() > max_len {
        ids.truncate(max_len);
        ids[max_len - 1] = EOS_ID;
    }
    Ok(ids)
}

/// Tokenise a whole corpus split into samples.
/// Pairs whose source tokenises to nothing are dropped — an
/// all-padding source is rejected by the models anyway.
pub fn encode_pairs(
    tokenizer: &Tokenizer,
    pairs: &[SentencePair],
    max_len: usize,
) -> Result<Vec<TranslationSample>> {
    let mut samples = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let source_ids = encode_sentence(tokenizer, &pair.source, max_len)?;
        let target_ids = encode_sentence(tokenizer, &pair.target, max_len)?;
        // 2 = BOS + EOS only, i.e. no real tokens survived
        if source_ids.len() <= 2 || target_ids.len() <= 2 {
            continue;
        }
        samples.push(TranslationSample { source_ids, target_ids });
    }
    tracing::debug!("Encoded {} samples (of {} pairs)", samples.len(), pairs.len());
    Ok(samples)
}

pub struct TranslationDataset {
    samples: Vec<TranslationSample>,
}

impl TranslationDataset {
    pub fn new(samples: Vec<TranslationSample>) -> Self {
        Self { samples }
    }
}

impl Dataset<TranslationSample> for TranslationDataset {
    fn get(&self, index: usize) -> Option<TranslationSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tokenizer_store::TokenizerStore;

    fn test_tokenizer(name: &str) -> Tokenizer {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        let texts = vec!["the cat sat on the mat".to_string()];
        TokenizerStore::new(dir.to_string_lossy().to_string())
            .load_or_build(&texts, 100)
            .unwrap()
    }

    #[test]
    fn test_encode_brackets_with_bos_eos() {
        let tokenizer = test_tokenizer("nmt_ds_bracket");
        let ids = encode_sentence(&tokenizer, "the cat sat", 140).unwrap();
        assert_eq!(ids.len(), 5);
        assert_eq!(ids[0], BOS_ID);
        assert_eq!(*ids.last().unwrap(), EOS_ID);
    }

    #[test]
    fn test_encode_truncates_but_keeps_eos() {
        let tokenizer = test_tokenizer("nmt_ds_trunc");
        let ids = encode_sentence(&tokenizer, "the cat sat on the mat", 4).unwrap();
        assert_eq!(ids.len(), 4);
        assert_eq!(ids[0], BOS_ID);
        assert_eq!(*ids.last().unwrap(), EOS_ID);
    }

    #[test]
    fn test_encode_pairs_drops_empty_sides() {
        let tokenizer = test_tokenizer("nmt_ds_pairs");
        let pairs = vec![
            SentencePair::new("the cat", "the mat"),
            SentencePair::new("", "the cat"), // source tokenises to nothing
        ];
        let samples = encode_pairs(&tokenizer, &pairs, 140).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].source_len(), 4);
    }
}
