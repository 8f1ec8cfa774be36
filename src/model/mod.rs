use crate::error::{EncoderError, Result};
use crate::loader::{CellType, CellWeights, EncoderConfig, EncoderWeights};
use crate::tensor::{resize_zeroed, Tensor2, TensorView1, TensorView2};
use ndarray::s;
use std::sync::Arc;

pub mod batching;
pub mod modules;

pub use batching::{FactorBundle, Sentence, Sentences, Word, EOS_ID, UNK_ID};
pub use modules::{Cell, CellLength, CellState, Embeddings, Gru, Lstm, Multiplicative, Rnn};

/// Encoder results handed to the attention/decoder stage.
///
/// `context` is timestep-major: row `t * batch_size + s` holds sentence `s` at
/// timestep `t`, forward state in the first `forward_width` columns and backward
/// state after it. Rows at `t >= sentence_lengths[s]` are not meaningful and must
/// be excluded through `sentence_lengths` or `sentence_mask`.
#[derive(Debug, Clone, Default)]
pub struct EncoderOutput {
    context: Tensor2,       // [max_length * batch_size, forward_width + backward_width]
    sentence_mask: Tensor2, // [max_length, batch_size], 1.0 at valid positions
    sentence_lengths: Vec<usize>,
    batch_size: usize,
    max_length: usize,
    forward_width: usize,
    tab: usize,
}

impl EncoderOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size the buffers for a batch. Existing allocations are kept when shapes match.
    fn prepare(
        &mut self,
        max_length: usize,
        lengths: &[usize],
        forward_width: usize,
        backward_width: usize,
        tab: usize,
    ) {
        let batch_size = lengths.len();
        resize_zeroed(
            &mut self.context,
            max_length * batch_size,
            forward_width + backward_width,
        );
        resize_zeroed(&mut self.sentence_mask, max_length, batch_size);
        for (b, &len) in lengths.iter().enumerate() {
            self.sentence_mask.slice_mut(s![..len, b]).fill(1.0);
        }

        self.sentence_lengths.clear();
        self.sentence_lengths.extend_from_slice(lengths);
        self.batch_size = batch_size;
        self.max_length = max_length;
        self.forward_width = forward_width;
        self.tab = tab;
    }

    pub fn context(&self) -> &Tensor2 {
        &self.context
    }

    pub fn sentence_mask(&self) -> &Tensor2 {
        &self.sentence_mask
    }

    pub fn sentence_lengths(&self) -> &[usize] {
        &self.sentence_lengths
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn tab(&self) -> usize {
        self.tab
    }

    /// Full context row width (forward + backward)
    pub fn width(&self) -> usize {
        self.context.ncols()
    }

    pub fn forward_width(&self) -> usize {
        self.forward_width
    }

    pub fn backward_width(&self) -> usize {
        self.width() - self.forward_width
    }

    /// Context row of `sentence` at `timestep`
    pub fn row(&self, timestep: usize, sentence: usize) -> Option<TensorView1<'_>> {
        if timestep >= self.max_length || sentence >= self.batch_size {
            return None;
        }
        Some(self.context.row(timestep * self.batch_size + sentence))
    }

    pub fn is_valid(&self, timestep: usize, sentence: usize) -> bool {
        self.sentence_lengths
            .get(sentence)
            .is_some_and(|&len| timestep < len)
    }

    pub fn forward_part(&self) -> TensorView2<'_> {
        self.context.slice(s![.., ..self.forward_width])
    }

    pub fn backward_part(&self) -> TensorView2<'_> {
        self.context.slice(s![.., self.forward_width..])
    }
}

/// Bidirectional RNN encoder
///
/// Holds scratch buffers reused across calls, so `encode` takes `&mut self`.
/// Weights are shared read-only; build one encoder per thread from the same
/// `EncoderWeights`.
pub struct Encoder {
    embeddings: Embeddings,
    forward_rnn: Rnn,
    backward_rnn: Rnn,
    forward_cell: CellType,
    backward_cell: CellType,

    // reused across calls
    embedded_words: Vec<Tensor2>,
}

impl Encoder {
    pub fn new(weights: &EncoderWeights, config: &EncoderConfig) -> Result<Self> {
        weights.validate()?;
        let embeddings = Embeddings::new(Arc::clone(&weights.embeddings));
        let forward = Self::init_cell("forward", &weights.forward, config.forward_cell)?;
        let backward = Self::init_cell("backward", &weights.backward, config.backward_cell)?;

        let encoder = Self {
            embeddings,
            forward_rnn: Rnn::new(forward),
            backward_rnn: Rnn::new(backward),
            forward_cell: config.forward_cell,
            backward_cell: config.backward_cell,
            embedded_words: Vec::new(),
        };

        log::info!(
            "Encoder: {} factors, embedding width {}, forward {} ({}), backward {} ({})",
            encoder.factor_count(),
            encoder.embeddings.width(),
            encoder.forward_cell,
            encoder.forward_rnn.state_length().output,
            encoder.backward_cell,
            encoder.backward_rnn.state_length().output,
        );

        Ok(encoder)
    }

    fn init_cell(
        direction: &'static str,
        weights: &CellWeights,
        cell_type: CellType,
    ) -> Result<Box<dyn Cell>> {
        match (cell_type, weights) {
            (CellType::Gru, CellWeights::Gru(w)) => Ok(Box::new(Gru::new(Arc::clone(w)))),
            (CellType::Lstm, CellWeights::Lstm(w)) => Ok(Box::new(Lstm::new(Arc::clone(w)))),
            (CellType::Mlstm, CellWeights::Mlstm(w)) => {
                Ok(Box::new(Multiplicative::new(Arc::clone(w))))
            }
            _ => Err(EncoderError::CellWeightsMismatch {
                direction,
                expected: cell_type.to_string(),
            }),
        }
    }

    pub fn factor_count(&self) -> usize {
        self.embeddings.factor_count()
    }

    pub fn forward_cell(&self) -> CellType {
        self.forward_cell
    }

    pub fn backward_cell(&self) -> CellType {
        self.backward_cell
    }

    /// Width of one context row
    pub fn context_width(&self) -> usize {
        self.forward_rnn.state_length().output + self.backward_rnn.state_length().output
    }

    /// Encode stream `tab` of `sentences` into `out`.
    pub fn encode(
        &mut self,
        sentences: &Sentences,
        tab: usize,
        out: &mut EncoderOutput,
    ) -> Result<()> {
        let lengths = sentences.lengths(tab)?;
        let batch_size = lengths.len();
        let max_length = lengths.iter().copied().max().unwrap_or(0);
        let factor_count = self.factor_count();

        log::debug!(
            "Encoding batch of {} sentences, max length {}, tab {}",
            batch_size,
            max_length,
            tab
        );

        if self.embedded_words.len() < max_length {
            self.embedded_words
                .resize_with(max_length, || Tensor2::zeros((0, 0)));
        }
        for (pos, row) in self.embedded_words[..max_length].iter_mut().enumerate() {
            let words = sentences.words_at(pos, tab, factor_count)?;
            self.embeddings.lookup(row, &words)?;
        }

        let forward_width = self.forward_rnn.state_length().output;
        let backward_width = self.backward_rnn.state_length().output;
        out.prepare(max_length, &lengths, forward_width, backward_width, tab);

        let embedded = &self.embedded_words[..max_length];
        self.forward_rnn
            .encode(embedded.iter(), &mut out.context, batch_size, false, None)?;
        self.backward_rnn.encode(
            embedded.iter().rev(),
            &mut out.context,
            batch_size,
            true,
            Some(lengths.as_slice()),
        )?;

        Ok(())
    }
}
