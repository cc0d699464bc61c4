// ============================================================
// Layer 2 — TranslateUseCase
// ============================================================
// Loads the trained Transformer from its checkpoint and turns a
// source sentence into a translation via greedy decoding.

use anyhow::{bail, Result};
use burn::prelude::*;
use tokenizers::Tokenizer;

use crate::data::dataset::encode_sentence;
use crate::domain::traits::Translator;
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::trainer::InnerBackend;
use crate::ml::transformer::TransformerTranslator;

pub struct TranslateUseCase {
    model: TransformerTranslator<InnerBackend>,
    tokenizer: Tokenizer,
    device: burn::backend::wgpu::WgpuDevice,
    max_len: usize,
}

impl TranslateUseCase {
    /// Rebuild the model from the saved config and load the latest
    /// checkpoint from `output_dir`.
    pub fn new(output_dir: String, output_filename: String) -> Result<Self> {
        let device = burn::backend::wgpu::WgpuDevice::default();

        let tokenizer = TokenizerStore::new(&output_dir).load()?;
        let ckpt = CheckpointManager::new(&output_dir, &output_filename);
        let model_cfg = ckpt.load_config()?;
        let model: TransformerTranslator<InnerBackend> = model_cfg.init(&device)?;
        let model = ckpt.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint");

        Ok(Self {
            max_len: model_cfg.max_len,
            model,
            tokenizer,
            device,
        })
    }
}

impl Translator for TranslateUseCase {
    fn translate(&self, source: &str) -> Result<String> {
        let ids = encode_sentence(&self.tokenizer, source, self.max_len)?;
        // 2 = BOS + EOS only
        if ids.len() <= 2 {
            bail!("Source sentence has no translatable tokens");
        }

        // Time-major [src_len, 1] tensor for a single example
        let src_len = ids.len();
        let flat: Vec<i32> = ids.iter().map(|&t| t as i32).collect();
        let source_tensor = Tensor::<InnerBackend, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([src_len, 1]);

        let decoded = self.model.infer_forward(source_tensor);
        tracing::debug!("Decoded {} tokens", decoded.len());

        // skip_special_tokens drops BOS/EOS/PAD from the output text
        self.tokenizer
            .decode(&decoded, true)
            .map_err(|e| anyhow::anyhow!("Decode error: {e}"))
    }
}
