use super::cell::{Cell, CellLength, CellState};
use crate::error::{EncoderError, Result};
use crate::kernels;
use crate::tensor::Tensor2;

/// Original position of the `i`-th of `n` timesteps presented in reverse.
pub fn effective_position(i: usize, n: usize) -> usize {
    n - i - 1
}

/// Whether `position` lies past the end of a sentence of `length` tokens.
pub fn is_padding(position: usize, length: usize) -> bool {
    position >= length
}

/// Drives one cell over a sequence of per-timestep inputs and writes the
/// outputs into a timestep-major context tensor.
///
/// The two state buffers are kept between calls and swapped every step.
pub struct Rnn {
    cell: Box<dyn Cell>,
    state: CellState,
    prev: CellState,
    mask: Vec<bool>,
}

impl Rnn {
    pub fn new(cell: Box<dyn Cell>) -> Self {
        Self {
            cell,
            state: CellState::default(),
            prev: CellState::default(),
            mask: Vec::new(),
        }
    }

    pub fn state_length(&self) -> CellLength {
        self.cell.state_length()
    }

    fn initialize_state(&mut self, batch_size: usize) {
        let length = self.cell.state_length();
        self.state.reset(length, batch_size);
        self.prev.reset(length, batch_size);
    }

    /// Scan `inputs` (each [batch_size, input_size]) in presentation order.
    ///
    /// Forward scans write timestep `i` into context columns `[0, output)`.
    /// Inverted scans expect the inputs in reverse time order, write timestep
    /// `n - i - 1` into the last `output` columns, and zero the state of every
    /// sentence whose current position is padding, so each sentence's backward
    /// recurrence starts from a zero state at its true last token.
    pub fn encode<'a, I>(
        &mut self,
        inputs: I,
        context: &mut Tensor2,
        batch_size: usize,
        invert: bool,
        sentence_lengths: Option<&[usize]>,
    ) -> Result<()>
    where
        I: IntoIterator<Item = &'a Tensor2>,
        I::IntoIter: ExactSizeIterator,
    {
        let inputs = inputs.into_iter();
        let n = inputs.len();
        let width = self.state_length().output;
        let input_size = self.cell.input_size();

        let lengths: &[usize] = if invert {
            let lengths = sentence_lengths.ok_or(EncoderError::MissingSentenceLengths)?;
            if lengths.len() != batch_size {
                return Err(EncoderError::SentenceLengthsMismatch {
                    expected: batch_size,
                    found: lengths.len(),
                });
            }
            lengths
        } else {
            &[]
        };

        if context.nrows() != n * batch_size || context.ncols() < width {
            return Err(EncoderError::ShapeMismatch {
                name: "context".to_string(),
                expected: (n * batch_size, width),
                found: context.dim(),
            });
        }
        let col_offset = if invert { context.ncols() - width } else { 0 };

        log::trace!(
            "rnn scan: {} steps, batch {}, width {}, invert {}",
            n,
            batch_size,
            width,
            invert
        );

        self.initialize_state(batch_size);

        for (i, input) in inputs.enumerate() {
            if input.dim() != (batch_size, input_size) {
                return Err(EncoderError::ShapeMismatch {
                    name: "input".to_string(),
                    expected: (batch_size, input_size),
                    found: input.dim(),
                });
            }

            self.cell.next_state(&mut self.state, &self.prev, input);

            if invert {
                let position = effective_position(i, n);
                self.mask.clear();
                self.mask
                    .extend(lengths.iter().map(|&len| is_padding(position, len)));

                kernels::zero_rows(&mut self.state.output, &self.mask);
                if let Some(cell) = self.state.cell.as_mut() {
                    kernels::zero_rows(cell, &self.mask);
                }

                kernels::paste_rows(context, self.state.output.view(), position, col_offset);
            } else {
                kernels::paste_rows(context, self.state.output.view(), i, col_offset);
            }

            std::mem::swap(&mut self.state, &mut self.prev);
        }

        Ok(())
    }
}
