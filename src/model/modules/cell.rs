use crate::tensor::{resize_zeroed, Tensor2};

/// State widths a cell needs. `cell == 0` means no memory channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellLength {
    pub cell: usize,
    pub output: usize,
}

impl CellLength {
    pub fn new(cell: usize, output: usize) -> Self {
        Self { cell, output }
    }
}

/// Recurrent state carried between timesteps.
#[derive(Debug, Clone, PartialEq)]
pub struct CellState {
    pub output: Tensor2,       // [batch, output]
    pub cell: Option<Tensor2>, // [batch, cell], present iff the cell has memory
}

impl CellState {
    /// Zero state for `batch_size` rows shaped by `length`.
    pub fn zeros(length: CellLength, batch_size: usize) -> Self {
        Self {
            output: Tensor2::zeros((batch_size, length.output)),
            cell: (length.cell > 0).then(|| Tensor2::zeros((batch_size, length.cell))),
        }
    }

    /// Reshape to `length` and `batch_size` and zero all values.
    pub fn reset(&mut self, length: CellLength, batch_size: usize) {
        resize_zeroed(&mut self.output, batch_size, length.output);
        if length.cell > 0 {
            match self.cell.as_mut() {
                Some(cell) => resize_zeroed(cell, batch_size, length.cell),
                None => self.cell = Some(Tensor2::zeros((batch_size, length.cell))),
            }
        } else {
            self.cell = None;
        }
    }

    pub fn batch_size(&self) -> usize {
        self.output.nrows()
    }
}

impl Default for CellState {
    fn default() -> Self {
        Self::zeros(CellLength::new(0, 0), 0)
    }
}

/// One recurrent state transition.
///
/// The scan driver only depends on this trait, so new variants plug in without
/// touching it.
pub trait Cell: Send + Sync {
    fn state_length(&self) -> CellLength;

    /// Width of the per-timestep input rows
    fn input_size(&self) -> usize;

    /// Write the state following `prev` given `input` ([batch, input_size]) into `next`.
    /// `next` must already be shaped like `prev`.
    fn next_state(&self, next: &mut CellState, prev: &CellState, input: &Tensor2);
}
