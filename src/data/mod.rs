// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between raw corpus files and GPU-ready batches:
//
//   train/val/test .tsv files
//       │
//       ▼
//   TsvCorpus          → reads aligned source/target pairs
//       │
//       ▼
//   Tokenizer          → words to token ids (Layer 6 store)
//       │
//       ▼
//   TranslationDataset → implements Burn's Dataset trait
//       │
//       ▼
//   TranslationBatcher → pads and stacks into time-major tensors
//       │
//       ▼
//   DataLoader         → feeds batches to the training loop
//
// Plus the loader for pretrained word vectors consumed by the
// recurrent decoder's frozen embedding.

/// Reads tab-separated parallel corpus files
pub mod corpus;

/// Token-id samples and Burn's Dataset impl
pub mod dataset;

/// Pads samples into time-major Int tensor batches
pub mod batcher;

/// Shuffles and splits pairs into train/validation sets
pub mod splitter;

/// Loads word2vec-text pretrained embedding vectors
pub mod pretrained;
