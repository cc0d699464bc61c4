// ============================================================
// Layer 3 — SentencePair Domain Type
// ============================================================

use serde::{Deserialize, Serialize};

/// One aligned example from the parallel corpus: a sentence in the
/// source language and its reference translation.
///
/// Both sides are raw text — tokenisation happens later in the data
/// layer, so this type stays usable by any tokenizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentencePair {
    /// Sentence in the source language
    pub source: String,

    /// Reference translation in the target language
    pub target: String,
}

impl SentencePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// A pair with an empty side carries no training signal.
    pub fn is_empty(&self) -> bool {
        self.source.trim().is_empty() || self.target.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_detection() {
        assert!(SentencePair::new("", "bonjour").is_empty());
        assert!(SentencePair::new("hello", "   ").is_empty());
        assert!(!SentencePair::new("hello", "bonjour").is_empty());
    }
}
