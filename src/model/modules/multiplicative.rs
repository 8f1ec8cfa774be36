use super::cell::{Cell, CellLength, CellState};
use super::lstm::Lstm;
use crate::kernels;
use crate::loader::MultiplicativeWeights;
use crate::tensor::Tensor2;
use std::sync::Arc;

/// Multiplicative LSTM
///
/// m = (x @ Wm + bm) * (h @ Um), then an LSTM step with `m` as the recurrent input.
pub struct Multiplicative {
    weights: Arc<MultiplicativeWeights>,
    inner: Lstm,
}

impl Multiplicative {
    pub fn new(weights: Arc<MultiplicativeWeights>) -> Self {
        let inner = Lstm::new(Arc::clone(&weights.inner));
        Self { weights, inner }
    }
}

impl Cell for Multiplicative {
    fn state_length(&self) -> CellLength {
        self.inner.state_length()
    }

    fn input_size(&self) -> usize {
        self.inner.input_size()
    }

    fn next_state(&self, next: &mut CellState, prev: &CellState, input: &Tensor2) {
        let w = &self.weights;

        let mut mult = kernels::affine(input, &w.wm, &w.bm);
        mult *= &kernels::fast_matmul(&prev.output, &w.um);

        let prev_cell = prev
            .cell
            .as_ref()
            .expect("LSTM state has a memory channel");
        self.inner.transition(next, prev_cell, &mult, input);
    }
}
