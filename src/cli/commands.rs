// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the `train`, `translate`, and `evaluate` subcommands
// and their configurable flags. clap's derive macros generate
// help text, error messages, and type conversion.

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the Transformer translation model on a parallel corpus
    Train(TrainArgs),

    /// Translate a sentence using a trained checkpoint
    Translate(TranslateArgs),

    /// Report loss and accuracy on the test split
    Evaluate(EvaluateArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory containing train.tsv (and optionally val.tsv)
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Directory for checkpoints, tokenizer, and metrics
    #[arg(long, default_value = "output")]
    pub output_dir: String,

    /// Prefix for checkpoint files: {prefix}model_epoch{N}
    #[arg(long, default_value = "")]
    pub output_filename: String,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    /// Sentence pairs per forward pass
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    /// Seed for shuffling and the held-out split
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Maximum vocabulary size (including the 4 special tokens)
    #[arg(long, default_value_t = 10_000)]
    pub vocab_size: usize,

    /// Number of stacked encoder and decoder layers
    #[arg(long, default_value_t = 6)]
    pub num_layers: usize,

    /// Model dimension; must be divisible by 64 (the per-head width)
    #[arg(long, default_value_t = 512)]
    pub emb_size: usize,

    /// Maximum sequence length (longer sentences are truncated)
    #[arg(long, default_value_t = 140)]
    pub max_len: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 2048)]
    pub d_ff: usize,

    /// Dropout probability
    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir: a.data_dir,
            output_dir: a.output_dir,
            output_filename: a.output_filename,
            epochs: a.epochs,
            batch_size: a.batch_size,
            lr: a.lr,
            seed: a.seed,
            vocab_size: a.vocab_size,
            num_layers: a.num_layers,
            emb_size: a.emb_size,
            max_len: a.max_len,
            d_ff: a.d_ff,
            dropout: a.dropout,
        }
    }
}

/// All arguments for the `translate` command.
#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// The source-language sentence to translate
    #[arg(long)]
    pub sentence: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "output")]
    pub output_dir: String,

    /// Checkpoint filename prefix used during training
    #[arg(long, default_value = "")]
    pub output_filename: String,
}

/// All arguments for the `evaluate` command.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory containing test.tsv
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "output")]
    pub output_dir: String,

    /// Checkpoint filename prefix used during training
    #[arg(long, default_value = "")]
    pub output_filename: String,

    /// Sentence pairs per forward pass
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,
}
