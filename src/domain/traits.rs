// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between layers. The application layer programs
// against these traits, never against concrete loaders or
// models, so either side can be swapped independently.

use anyhow::Result;
use crate::domain::sentence_pair::SentencePair;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Any component that can produce a parallel corpus.
///
/// Implementations:
///   - TsvCorpus → reads tab-separated source/target files
pub trait CorpusSource {
    /// Load every sentence pair from this source.
    fn load_all(&self) -> Result<Vec<SentencePair>>;
}

// ─── Translator ───────────────────────────────────────────────────────────────
/// Any component that can translate a source sentence.
///
/// Implementations:
///   - TranslateUseCase → greedy decode with the Transformer model
pub trait Translator {
    /// Translate a single source-language sentence.
    fn translate(&self, source: &str) -> Result<String>;
}
