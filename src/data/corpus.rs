// ============================================================
// Layer 4 — Parallel Corpus Loader
// ============================================================
// Reads a tab-separated corpus file: one `source<TAB>target`
// pair per line, UTF-8. Malformed lines are skipped with a
// warning rather than aborting the whole run — a single bad
// line in a million-pair corpus should not kill training.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::sentence_pair::SentencePair;
use crate::domain::traits::CorpusSource;

/// Loads sentence pairs from a single .tsv file.
/// Implements the CorpusSource trait from Layer 3.
pub struct TsvCorpus {
    path: PathBuf,
}

impl TsvCorpus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl CorpusSource for TsvCorpus {
    fn load_all(&self) -> Result<Vec<SentencePair>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read corpus file '{}'", self.path.display()))?;

        let mut pairs = Vec::new();
        let mut skipped = 0usize;

        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match line.split_once('\t') {
                Some((src, tgt)) => {
                    let pair = SentencePair::new(src.trim(), tgt.trim());
                    if pair.is_empty() {
                        skipped += 1;
                    } else {
                        pairs.push(pair);
                    }
                }
                None => {
                    tracing::warn!(
                        "Skipping line {} of '{}': no tab separator",
                        line_no + 1,
                        self.path.display()
                    );
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} malformed/empty lines", skipped);
        }
        tracing::info!(
            "Loaded {} sentence pairs from '{}'",
            pairs.len(),
            self.path.display()
        );
        Ok(pairs)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_loads_valid_pairs() {
        let path = write_tmp(
            "corpus_valid.tsv",
            "hello world\tbonjour le monde\ngood night\tbonne nuit\n",
        );
        let pairs = TsvCorpus::new(&path).load_all().unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].source, "hello world");
        assert_eq!(pairs[1].target, "bonne nuit");
    }

    #[test]
    fn test_skips_malformed_lines() {
        let path = write_tmp(
            "corpus_malformed.tsv",
            "no tab here\nhello\tbonjour\n\t\nonly source\t\n",
        );
        let pairs = TsvCorpus::new(&path).load_all().unwrap();
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_missing_file_is_error() {
        let corpus = TsvCorpus::new("/nonexistent/corpus.tsv");
        assert!(corpus.load_all().is_err());
    }
}
