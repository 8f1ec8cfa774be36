use crate::error::{EncoderError, Result};
use crate::kernels;
use crate::loader::EmbeddingWeights;
use crate::model::batching::{FactorBundle, UNK_ID};
use crate::tensor::Tensor2;
use ndarray::s;
use std::sync::Arc;

/// Multi-factor embedding lookup
pub struct Embeddings {
    weights: Arc<EmbeddingWeights>,
}

impl Embeddings {
    pub fn new(weights: Arc<EmbeddingWeights>) -> Self {
        Self { weights }
    }

    pub fn factor_count(&self) -> usize {
        self.weights.factor_count()
    }

    /// Width of one embedded row: the sum of all factor table widths
    pub fn width(&self) -> usize {
        self.weights.width()
    }

    /// Row index used for `word` in `factor`'s table
    pub(crate) fn known_word(&self, factor: usize, word: u32) -> usize {
        let rows = self.weights.tables[factor].nrows();
        if (word as usize) < rows {
            word as usize
        } else {
            UNK_ID as usize
        }
    }

    /// Embed one timestep of a batch: `words[b]` is batch item `b`'s factor bundle.
    /// Writes [batch, width] into `row`, factors concatenated in model order.
    /// `row` is reallocated only when its shape changes.
    pub fn lookup(&self, row: &mut Tensor2, words: &[FactorBundle]) -> Result<()> {
        let factor_count = self.factor_count();
        let mut unknown = 0usize;

        let mut known: Vec<Vec<usize>> = vec![Vec::with_capacity(words.len()); factor_count];
        for (pos, bundle) in words.iter().enumerate() {
            if bundle.len() != factor_count {
                return Err(EncoderError::FactorCountMismatch {
                    position: pos,
                    expected: factor_count,
                    found: bundle.len(),
                });
            }
            for (factor, &word) in bundle.iter().enumerate() {
                let idx = self.known_word(factor, word);
                if idx as u32 != word {
                    unknown += 1;
                }
                known[factor].push(idx);
            }
        }

        if unknown > 0 {
            log::debug!("{} out-of-vocabulary ids mapped to the unknown row", unknown);
        }

        let batch = words.len();
        if row.dim() != (batch, self.width()) {
            *row = Tensor2::zeros((batch, self.width()));
        }

        let mut offset = 0;
        for (indices, table) in known.iter().zip(&self.weights.tables) {
            let width = table.ncols();
            row.slice_mut(s![.., offset..offset + width])
                .assign(&kernels::assemble(table, indices));
            offset += width;
        }

        Ok(())
    }
}
