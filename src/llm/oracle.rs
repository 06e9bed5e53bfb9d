//! The sequence model as seen by the decoder
//!
//! A scoring oracle takes a batch of encoder rows and a batch of
//! right-padded decoder prefixes and returns unnormalized next-token scores
//! for every decoder position.

use crate::error::{Error, Result};

/// Anything that can score decoder prefixes against an encoded input.
pub trait ScoringOracle {
    /// Fixed encoder width; decoder rows are one shorter.
    fn context_len(&self) -> usize;

    fn vocab_size(&self) -> usize;

    /// `encoder` is `[batch][context_len]`, `decoder` is
    /// `[batch][context_len - 1]`.
    fn score(&self, encoder: &[Vec<u32>], decoder: &[Vec<u32>]) -> Result<Logits>;
}

impl<T: ScoringOracle + ?Sized> ScoringOracle for &T {
    fn context_len(&self) -> usize {
        (**self).context_len()
    }

    fn vocab_size(&self) -> usize {
        (**self).vocab_size()
    }

    fn score(&self, encoder: &[Vec<u32>], decoder: &[Vec<u32>]) -> Result<Logits> {
        (**self).score(encoder, decoder)
    }
}

/// Dense `[batch][steps][vocab]` score array
#[derive(Clone, Debug, PartialEq)]
pub struct Logits {
    batch: usize,
    steps: usize,
    vocab: usize,
    data: Vec<f32>,
}

impl Logits {
    pub fn new(batch: usize, steps: usize, vocab: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != batch * steps * vocab {
            return Err(Error::OracleShape(format!(
                "expected {}x{}x{} = {} scores, got {}",
                batch,
                steps,
                vocab,
                batch * steps * vocab,
                data.len()
            )));
        }
        Ok(Logits {
            batch,
            steps,
            vocab,
            data,
        })
    }

    /// Flatten nested rows, checking that every row has the same shape.
    pub fn from_nested(rows: Vec<Vec<Vec<f32>>>) -> Result<Self> {
        let batch = rows.len();
        let steps = rows.first().map_or(0, Vec::len);
        let vocab = rows
            .first()
            .and_then(|row| row.first())
            .map_or(0, Vec::len);

        let mut data = Vec::with_capacity(batch * steps * vocab);
        for row in rows {
            if row.len() != steps {
                return Err(Error::OracleShape(format!(
                    "ragged batch: {} steps vs {}",
                    row.len(),
                    steps
                )));
            }
            for position in row {
                if position.len() != vocab {
                    return Err(Error::OracleShape(format!(
                        "ragged vocabulary: {} scores vs {}",
                        position.len(),
                        vocab
                    )));
                }
                data.extend(position);
            }
        }
        Logits::new(batch, steps, vocab, data)
    }

    pub fn batch(&self) -> usize {
        self.batch
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn vocab(&self) -> usize {
        self.vocab
    }

    /// Scores for batch row `row` at decoder position `step`
    pub fn at(&self, row: usize, step: usize) -> Result<&[f32]> {
        if row >= self.batch || step >= self.steps {
            return Err(Error::OracleShape(format!(
                "position ({}, {}) outside {}x{}",
                row, step, self.batch, self.steps
            )));
        }
        let start = (row * self.steps + step) * self.vocab;
        Ok(&self.data[start..start + self.vocab])
    }

    /// Check that this array answers a request of the given size.
    pub fn expect_shape(&self, batch: usize, steps: usize, vocab: usize) -> Result<()> {
        if (self.batch, self.steps, self.vocab) != (batch, steps, vocab) {
            return Err(Error::OracleShape(format!(
                "expected {}x{}x{}, got {}x{}x{}",
                batch, steps, vocab, self.batch, self.steps, self.vocab
            )));
        }
        Ok(())
    }
}
