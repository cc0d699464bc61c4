// ============================================================
// Layer 4 — Pretrained Word Vectors
// ============================================================
// Loads embedding vectors in word2vec text format:
//
//   <rows> <dim>          ← optional header line
//   word v1 v2 ... vdim   ← one entry per line
//
// Line order must match token-id order of the vocabulary the
// vectors were trained against; the recurrent decoder copies
// row i into embedding row i. A row-count mismatch against the
// vocabulary is a hard construction error, never a silent
// truncate or pad.

use anyhow::{bail, Context, Result};
use burn::prelude::*;
use std::{fs, path::Path};

/// A dense [rows, dim] embedding matrix with its word labels.
#[derive(Debug, Clone)]
pub struct WordVectors {
    pub words: Vec<String>,
    pub dim: usize,
    data: Vec<f32>,
}

impl WordVectors {
    /// Parse a word2vec text file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read vector file '{}'", path.display()))?;
        Self::from_text(&text)
            .with_context(|| format!("Malformed vector file '{}'", path.display()))
    }

    /// Parse word2vec text content that is already in memory.
    pub fn from_text(text: &str) -> Result<Self> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty()).peekable();

        // A header line is two integers and nothing else
        if let Some(first) = lines.peek() {
            let fields: Vec<&str> = first.split_whitespace().collect();
            if fields.len() == 2 && fields.iter().all(|f| f.parse::<usize>().is_ok()) {
                lines.next();
            }
        }

        let mut words = Vec::new();
        let mut data = Vec::new();
        let mut dim = 0usize;

        for (line_no, line) in lines.enumerate() {
            let mut fields = line.split_whitespace();
            let word = match fields.next() {
                Some(w) => w.to_string(),
                None => continue,
            };
            let values: Vec<f32> = fields
                .map(|f| f.parse::<f32>())
                .collect::<Result<_, _>>()
                .with_context(|| format!("Non-numeric value on line {}", line_no + 1))?;

            if dim == 0 {
                dim = values.len();
            } else if values.len() != dim {
                bail!(
                    "Inconsistent vector width on line {}: expected {}, got {}",
                    line_no + 1,
                    dim,
                    values.len()
                );
            }

            words.push(word);
            data.extend(values);
        }

        if words.is_empty() {
            bail!("Vector file contains no entries");
        }

        Ok(Self { words, dim, data })
    }

    pub fn rows(&self) -> usize {
        self.words.len()
    }

    /// Materialise the matrix as a [rows, dim] tensor.
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        Tensor::<B, 1>::from_floats(self.data.as_slice(), device)
            .reshape([self.rows(), self.dim])
    }

    /// Fail-fast shape check against a vocabulary.
    pub fn check_shape(&self, vocab_size: usize, expected_dim: usize) -> Result<()> {
        if self.rows() != vocab_size {
            bail!(
                "Pretrained vectors have {} rows but the vocabulary has {} entries",
                self.rows(),
                vocab_size
            );
        }
        if self.dim != expected_dim {
            bail!(
                "Pretrained vectors have dimension {} but the embedding expects {}",
                self.dim,
                expected_dim
            );
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_header() {
        let wv = WordVectors::from_text("2 3\n<pad> 0.0 0.0 0.0\nhello 1.0 2.0 3.0\n").unwrap();
        assert_eq!(wv.rows(), 2);
        assert_eq!(wv.dim, 3);
        assert_eq!(wv.words[1], "hello");
    }

    #[test]
    fn test_parse_without_header() {
        let wv = WordVectors::from_text("a 0.5 0.5\nb -1.0 2.0\nc 0.0 1.0\n").unwrap();
        assert_eq!(wv.rows(), 3);
        assert_eq!(wv.dim, 2);
    }

    #[test]
    fn test_inconsistent_width_rejected() {
        assert!(WordVectors::from_text("a 1.0 2.0\nb 1.0\n").is_err());
    }

    #[test]
    fn test_shape_check() {
        let wv = WordVectors::from_text("a 1.0 2.0\nb 3.0 4.0\n").unwrap();
        assert!(wv.check_shape(2, 2).is_ok());
        assert!(wv.check_shape(3, 2).is_err());
        assert!(wv.check_shape(2, 4).is_err());
    }
}
