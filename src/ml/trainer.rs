// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and Adam.
//
// Backend split:
//   - Training runs on Autodiff<Wgpu> for gradients
//   - model.valid() strips autodiff for validation/evaluation
//
// Checkpoints are written at every epoch divisible by 5, to
// output/{output_filename}model_epoch{N} via the checkpoint
// manager.
//
// Reference: Kingma & Ba (2015) Adam; Vaswani et al. (2017)
// for the (0.9, 0.98, 1e-9) Adam setup.

use anyhow::{bail, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::batcher::TranslationBatcher;
use crate::data::dataset::TranslationDataset;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::transformer::{TransformerTranslator, TransformerTranslatorConfig};

pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;
pub type InnerBackend = burn::backend::Wgpu;

/// How often (in epochs) the parameter state is persisted.
const CHECKPOINT_EVERY: usize = 5;

pub fn run_training(
    cfg: &TrainConfig,
    model_cfg: &TransformerTranslatorConfig,
    train_dataset: TranslationDataset,
    val_dataset: TranslationDataset,
    ckpt_manager: CheckpointManager,
    metrics: MetricsLogger,
) -> Result<()> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: TransformerTranslator<TrainBackend> = model_cfg.init(&device)?;
    tracing::info!(
        "Model ready: {} layers, emb_size={}, {} heads",
        model_cfg.num_layers,
        model_cfg.emb_size,
        model_cfg.head_count(),
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let optim_cfg = AdamConfig::new()
        .with_beta_1(0.9)
        .with_beta_2(0.98)
        .with_epsilon(1e-9);
    let mut optim = optim_cfg.init();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_batcher = TranslationBatcher::<TrainBackend>::new(device.clone());
    let train_loader = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let val_batcher = TranslationBatcher::<InnerBackend>::new(device.clone());
    let val_loader = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        let mut train_loss_sum = 0.0f64;
        let mut train_batches = 0usize;

        for batch in train_loader.iter() {
            let loss = model.training_step(&batch);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            train_batches += 1;
            tracing::debug!(
                "epoch {} step {}: train_loss={:.4}",
                epoch,
                train_batches,
                loss_val
            );

            // Backward pass + Adam update
            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else {
            f64::NAN
        };

        // ── Validation phase ──────────────────────────────────────────────────
        // dropout disabled for deterministic evaluation
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches = 0usize;

        for batch in val_loader.iter() {
            let loss_val: f64 = model_valid
                .validation_step(&batch)
                .into_scalar()
                .elem::<f64>();
            val_loss_sum += loss_val;
            val_batches += 1;
        }

        let avg_val_loss = if val_batches > 0 {
            val_loss_sum / val_batches as f64
        } else {
            f64::NAN
        };

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4}",
            epoch, cfg.epochs, avg_train_loss, avg_val_loss,
        );
        metrics.log(&EpochMetrics::new(epoch, avg_train_loss, avg_val_loss))?;

        if epoch % CHECKPOINT_EVERY == 0 {
            ckpt_manager.save_model(&model, epoch)?;
            tracing::info!("Checkpoint saved for epoch {}", epoch);
        }
    }

    tracing::info!("Training complete");
    Ok(())
}

/// Run the test split through the model: average loss and token
/// accuracy over all batches.
pub fn run_evaluation(
    model: &TransformerTranslator<InnerBackend>,
    test_dataset: TranslationDataset,
    batch_size: usize,
    device: burn::backend::wgpu::WgpuDevice,
) -> Result<(f64, f64)> {
    let batcher = TranslationBatcher::<InnerBackend>::new(device);
    let loader = DataLoaderBuilder::new(batcher)
        .batch_size(batch_size)
        .num_workers(1)
        .build(test_dataset);

    let mut loss_sum = 0.0f64;
    let mut acc_sum = 0.0f64;
    let mut batches = 0usize;

    for batch in loader.iter() {
        let (loss, acc) = model.test_step(&batch);
        let loss_val: f64 = loss.into_scalar().elem::<f64>();
        batches += 1;
        tracing::debug!(
            "test step {}: loss={:.4} acc={:.4}",
            batches,
            loss_val,
            acc
        );
        loss_sum += loss_val;
        acc_sum += acc;
    }

    if batches == 0 {
        bail!("Test set produced no batches");
    }
    Ok((loss_sum / batches as f64, acc_sum / batches as f64))
}
