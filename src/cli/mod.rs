// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction; parsing via clap, all
// business logic delegated to Layer 2 (application).
//
// Three commands:
//   1. `train`     — train the Transformer on a parallel corpus
//   2. `translate` — greedy-decode a sentence with a checkpoint
//   3. `evaluate`  — loss/accuracy on the held-out test split

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs, TranslateArgs};

#[derive(Parser, Debug)]
#[command(
    name = "seq2seq-nmt",
    version = "0.1.0",
    about = "Train and run recurrent/Transformer seq2seq translation models."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// The CLI layer only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => Self::run_train(args),
            Commands::Translate(args) => Self::run_translate(args),
            Commands::Evaluate(args) => Self::run_evaluate(args),
        }
    }

    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training on corpus in: {}", args.data_dir);
        let use_case = TrainUseCase::new(args.into());
        use_case.execute()?;
        println!("Training finished.");
        Ok(())
    }

    fn run_translate(args: TranslateArgs) -> Result<()> {
        use crate::application::translate_use_case::TranslateUseCase;
        use crate::domain::traits::Translator;

        let use_case = TranslateUseCase::new(args.output_dir, args.output_filename)?;
        let translation = use_case.translate(&args.sentence)?;
        println!("\n{}", translation);
        Ok(())
    }

    fn run_evaluate(args: EvaluateArgs) -> Result<()> {
        use crate::application::evaluate_use_case::EvaluateUseCase;

        let use_case = EvaluateUseCase::new(
            args.data_dir,
            args.output_dir,
            args.output_filename,
            args.batch_size,
        );
        let (loss, acc) = use_case.execute()?;
        println!("test_loss={:.4} test_acc={:.2}%", loss, acc * 100.0);
        Ok(())
    }
}
