// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// What gets saved:
//   1. Weights — {output_filename}model_epoch{N} (+ the
//      recorder's own .mpk.gz extension)
//   2. latest_epoch.json — which epoch was last saved
//   3. model_config.json — the architecture config
//
// The config must be saved separately because loading weights
// requires rebuilding a model of the exact same architecture
// first; CompactRecorder refuses a mismatched record.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use std::{fs, path::PathBuf};

use crate::ml::transformer::{TransformerTranslator, TransformerTranslatorConfig};

/// Manages saving and loading of model checkpoints.
/// All files live in the configured output directory; weight files
/// additionally carry the configured filename prefix.
pub struct CheckpointManager {
    dir: PathBuf,
    output_filename: String,
}

impl CheckpointManager {
    /// Create a manager rooted at `dir` with the given filename prefix
    /// (may be empty). Creates the directory if needed.
    pub fn new(dir: impl Into<String>, output_filename: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self {
            dir,
            output_filename: output_filename.into(),
        }
    }

    /// Weight file path for an epoch, without the recorder extension.
    fn model_path(&self, epoch: usize) -> PathBuf {
        self.dir
            .join(format!("{}model_epoch{}", self.output_filename, epoch))
    }

    /// Persist the full parameter state for `epoch`.
    pub fn save_model<B: Backend>(
        &self,
        model: &TransformerTranslator<B>,
        epoch: usize,
    ) -> Result<()> {
        let path = self.model_path(epoch);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Restore weights from the latest saved checkpoint into `model`.
    /// The model must have been built from the saved config.
    pub fn load_model<B: Backend>(
        &self,
        model: TransformerTranslator<B>,
        device: &B::Device,
    ) -> Result<TransformerTranslator<B>> {
        let epoch = self.latest_epoch()?;
        self.load_model_at(model, epoch, device)
    }

    /// Restore weights from a specific epoch's checkpoint.
    pub fn load_model_at<B: Backend>(
        &self,
        model: TransformerTranslator<B>,
        epoch: usize,
        device: &B::Device,
    ) -> Result<TransformerTranslator<B>> {
        let path = self.model_path(epoch);
        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display()
                )
            })?;

        Ok(model.load_record(record))
    }

    /// Save the architecture config so inference can rebuild the model.
    pub fn save_config(&self, cfg: &TransformerTranslatorConfig) -> Result<()> {
        let path = self.dir.join("model_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    /// Load the architecture config written at training time.
    pub fn load_config(&self) -> Result<TransformerTranslatorConfig> {
        let path = self.dir.join("model_config.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'train' first.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");
        let s = fs::read_to_string(&path)
            .with_context(|| "Cannot find 'latest_epoch.json'. Have you run 'train' first?")?;
        Ok(serde_json::from_str::<usize>(&s)?)
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

    fn fixed_input(device: &<TestBackend as Backend>::Device) -> (
        Tensor<TestBackend, 2, Int>,
        Tensor<TestBackend, 2, Int>,
    ) {
        let source = Tensor::<TestBackend, 1, Int>::from_ints([1, 5, 7, 2], device)
            .reshape([1, 4])
            .swap_dims(0, 1);
        let target = Tensor::<TestBackend, 1, Int>::from_ints([1, 9, 4, 2], device)
            .reshape([1, 4])
            .swap_dims(0, 1);
        (source, target)
    }

    #[test]
    fn test_checkpoint_round_trip_preserves_outputs() {
        let device = Default::default();
        let dir = std::env::temp_dir().join("nmt_ckpt_test");
        let _ = fs::remove_dir_all(&dir);

        let manager = CheckpointManager::new(dir.to_string_lossy().to_string(), "demo_");
        let cfg = tiny_config();

        let model = cfg.init::<TestBackend>(&device).unwrap();
        let (source, target) = fixed_input(&device);
        let before: Vec<f32> = model
            .train_forward(source.clone(), target.clone())
            .into_data()
            .to_vec()
            .unwrap();

        manager.save_config(&cfg).unwrap();
        manager.save_model(&model, 5).unwrap();
        assert!(dir.join("demo_model_epoch5.mpk.gz").exists());

        // Fresh model with different random weights, then reload
        let reloaded = manager
            .load_model(manager.load_config().unwrap().init::<TestBackend>(&device).unwrap(), &device)
            .unwrap();
        let after: Vec<f32> = reloaded
            .train_forward(source, target)
            .into_data()
            .to_vec()
            .unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_missing_checkpoint_is_contextual_error() {
        let device = Default::default();
        let dir = std::env::temp_dir().join("nmt_ckpt_missing");
        let _ = fs::remove_dir_all(&dir);
        let manager = CheckpointManager::new(dir.to_string_lossy().to_string(), "");
        let model = tiny_config().init::<TestBackend>(&device).unwrap();
        assert!(manager.load_model(model, &device).is_err());
    }
}
