// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records metrics to CSV files after each epoch:
//
//   metrics.csv      — epoch, train_loss, val_loss
//   test_metrics.csv — test_loss, test_acc (one row per run)
//
// CSV keeps the learning curves trivially plottable; anything
// more structured belongs to an experiment tracker, which this
// repository deliberately does not carry.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

/// One row of metrics data for a single training epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,

    /// Average padding-aware cross-entropy over all training batches.
    /// Random initialisation starts near ln(vocab_size).
    pub train_loss: f64,

    /// Average loss on the validation set. Divergence from train_loss
    /// indicates overfitting.
    pub val_loss: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64) -> Self {
        Self {
            epoch,
            train_loss,
            val_loss,
        }
    }
}

/// Appends metrics rows to CSV files in the output directory.
pub struct MetricsLogger {
    csv_path: PathBuf,
    test_csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the logger, writing the epoch CSV header if the file is
    /// new (appending across runs is allowed).
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,val_loss")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self {
            test_csv_path: dir.join("test_metrics.csv"),
            csv_path,
        })
    }

    /// Append one epoch's metrics.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(f, "{},{:.6},{:.6}", m.epoch, m.train_loss, m.val_loss)?;
        tracing::debug!(
            "Logged epoch {}: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }

    /// Append one test run's loss and accuracy.
    pub fn log_test(&self, test_loss: f64, test_acc: f64) -> Result<()> {
        if !self.test_csv_path.exists() {
            let mut f = fs::File::create(&self.test_csv_path)?;
            writeln!(f, "test_loss,test_acc")?;
        }
        let mut f = OpenOptions::new().append(true).open(&self.test_csv_path)?;
        writeln!(f, "{:.6},{:.6}", test_loss, test_acc)?;
        tracing::info!("test_loss={:.4} test_acc={:.4}", test_loss, test_acc);
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_dir(name: &str) -> String {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        dir.to_string_lossy().to_string()
    }

    #[test]
    fn test_epoch_rows_are_appended() {
        let logger = MetricsLogger::new(fresh_dir("nmt_metrics_epoch")).unwrap();
        logger.log(&EpochMetrics::new(1, 3.2, 3.4)).unwrap();
        logger.log(&EpochMetrics::new(2, 2.8, 3.0)).unwrap();

        let content = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "epoch,train_loss,val_loss");
        assert!(lines[2].starts_with("2,"));
    }

    #[test]
    fn test_test_metrics_file_gets_header_once() {
        let dir = fresh_dir("nmt_metrics_test");
        let logger = MetricsLogger::new(dir.clone()).unwrap();
        logger.log_test(1.5, 0.42).unwrap();
        logger.log_test(1.4, 0.44).unwrap();

        let content =
            fs::read_to_string(PathBuf::from(dir).join("test_metrics.csv")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "test_loss,test_acc");
    }
}
