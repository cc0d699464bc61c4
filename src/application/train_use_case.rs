// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the parallel corpus        (Layer 4 - data)
//   Step 2: Resolve the validation split    (Layer 4 - data)
//   Step 3: Build / load the tokenizer      (Layer 6 - infra)
//   Step 4: Encode pairs into samples       (Layer 4 - data)
//   Step 5: Build Burn datasets             (Layer 4 - data)
//   Step 6: Save the model config           (Layer 6 - infra)
//   Step 7: Run the training loop           (Layer 5 - ml)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{
    corpus::TsvCorpus,
    dataset::{encode_pairs, TranslationDataset},
    splitter::split_train_val,
};
use crate::domain::traits::CorpusSource;
use crate::infra::{
    checkpoint::CheckpointManager, metrics::MetricsLogger, tokenizer_store::TokenizerStore,
};
use crate::ml::trainer::run_training;
use crate::ml::transformer::TransformerTranslatorConfig;

/// Fraction of train.tsv kept for training when no val.tsv exists.
const TRAIN_FRACTION: f64 = 0.9;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Serialisable so a run can
// be reproduced from its flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir: String,
    pub output_dir: String,
    /// Prefix for checkpoint files: {output_filename}model_epoch{N}
    pub output_filename: String,
    pub epochs: usize,
    pub batch_size: usize,
    pub lr: f64,
    pub seed: u64,
    pub vocab_size: usize,
    pub num_layers: usize,
    pub emb_size: usize,
    pub max_len: usize,
    pub d_ff: usize,
    pub dropout: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            output_dir: "output".to_string(),
            output_filename: String::new(),
            epochs: 20,
            batch_size: 32,
            lr: 1e-4,
            seed: 42,
            vocab_size: 10_000,
            num_layers: 6,
            emb_size: 512,
            max_len: 140,
            d_ff: 2048,
            dropout: 0.1,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end.
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load the training corpus ──────────────────────────────────
        let train_path = Path::new(&cfg.data_dir).join("train.tsv");
        let train_corpus = TsvCorpus::new(&train_path);
        if !train_corpus.exists() {
            bail!(
                "No training corpus at '{}'. Expected one 'source<TAB>target' pair per line.",
                train_path.display()
            );
        }
        let train_pairs = train_corpus.load_all()?;
        if train_pairs.is_empty() {
            bail!("Training corpus '{}' is empty", train_path.display());
        }

        // ── Step 2: Validation split ──────────────────────────────────────────
        // An explicit val.tsv wins; otherwise hold out part of train.tsv.
        let val_corpus = TsvCorpus::new(Path::new(&cfg.data_dir).join("val.tsv"));
        let (train_pairs, val_pairs) = if val_corpus.exists() {
            (train_pairs, val_corpus.load_all()?)
        } else {
            tracing::info!(
                "No val.tsv found — holding out {:.0}% of train.tsv",
                (1.0 - TRAIN_FRACTION) * 100.0
            );
            split_train_val(train_pairs, TRAIN_FRACTION, cfg.seed)
        };
        tracing::info!(
            "Corpus: {} train pairs, {} validation pairs",
            train_pairs.len(),
            val_pairs.len()
        );

        // ── Step 3: Build / load tokenizer ────────────────────────────────────
        // One shared vocabulary over both languages.
        let texts: Vec<String> = train_pairs
            .iter()
            .flat_map(|p| [p.source.clone(), p.target.clone()])
            .collect();
        let tok_store = TokenizerStore::new(&cfg.output_dir);
        let tokenizer = tok_store.load_or_build(&texts, cfg.vocab_size)?;
        let vocab_size = tokenizer.get_vocab_size(true);

        // ── Step 4: Encode pairs into token-id samples ────────────────────────
        let train_samples = encode_pairs(&tokenizer, &train_pairs, cfg.max_len)?;
        let val_samples = encode_pairs(&tokenizer, &val_pairs, cfg.max_len)?;
        if train_samples.is_empty() {
            bail!("No usable training samples after tokenisation");
        }
        tracing::info!(
            "Encoded {} train / {} validation samples",
            train_samples.len(),
            val_samples.len()
        );

        // ── Step 5: Build Burn datasets ───────────────────────────────────────
        let train_dataset = TranslationDataset::new(train_samples);
        let val_dataset = TranslationDataset::new(val_samples);

        // ── Step 6: Save the model config for inference ───────────────────────
        let model_cfg = TransformerTranslatorConfig::new(vocab_size, vocab_size)
            .with_num_layers(cfg.num_layers)
            .with_emb_size(cfg.emb_size)
            .with_max_len(cfg.max_len)
            .with_d_ff(cfg.d_ff)
            .with_dropout(cfg.dropout);
        let ckpt_manager = CheckpointManager::new(&cfg.output_dir, &cfg.output_filename);
        ckpt_manager.save_config(&model_cfg)?;

        // ── Step 7: Run training (Layer 5) ────────────────────────────────────
        let metrics = MetricsLogger::new(&cfg.output_dir)?;
        run_training(
            cfg,
            &model_cfg,
            train_dataset,
            val_dataset,
            ckpt_manager,
            metrics,
        )?;

        Ok(())
    }
}
