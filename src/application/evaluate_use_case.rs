// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Runs the held-out test split through a trained checkpoint and
// reports padding-aware loss plus token accuracy.

use anyhow::{bail, Result};
use std::path::Path;

use crate::data::{
    corpus::TsvCorpus,
    dataset::{encode_pairs, TranslationDataset},
};
use crate::domain::traits::CorpusSource;
use crate::infra::{
    checkpoint::CheckpointManager, metrics::MetricsLogger, tokenizer_store::TokenizerStore,
};
use crate::ml::trainer::{run_evaluation, InnerBackend};
use crate::ml::transformer::TransformerTranslator;

pub struct EvaluateUseCase {
    data_dir: String,
    output_dir: String,
    output_filename: String,
    batch_size: usize,
}

impl EvaluateUseCase {
    pub fn new(
        data_dir: String,
        output_dir: String,
        output_filename: String,
        batch_size: usize,
    ) -> Self {
        Self {
            data_dir,
            output_dir,
            output_filename,
            batch_size,
        }
    }

    /// Returns (test_loss, test_accuracy) and appends them to the
    /// metrics CSV.
    pub fn execute(&self) -> Result<(f64, f64)> {
        let test_path = Path::new(&self.data_dir).join("test.tsv");
        let corpus = TsvCorpus::new(&test_path);
        if !corpus.exists() {
            bail!("No test corpus at '{}'", test_path.display());
        }
        let pairs = corpus.load_all()?;

        let tokenizer = TokenizerStore::new(&self.output_dir).load()?;

        let device = burn::backend::wgpu::WgpuDevice::default();
        let ckpt = CheckpointManager::new(&self.output_dir, &self.output_filename);
        let model_cfg = ckpt.load_config()?;
        let model: TransformerTranslator<InnerBackend> = model_cfg.init(&device)?;
        let model = ckpt.load_model(model, &device)?;

        let samples = encode_pairs(&tokenizer, &pairs, model_cfg.max_len)?;
        if samples.is_empty() {
            bail!("No usable test samples after tokenisation");
        }
        let dataset = TranslationDataset::new(samples);

        let (test_loss, test_acc) =
            run_evaluation(&model, dataset, self.batch_size, device)?;

        MetricsLogger::new(&self.output_dir)?.log_test(test_loss, test_acc)?;
        Ok((test_loss, test_acc))
    }
}
