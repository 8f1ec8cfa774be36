use super::cell::{Cell, CellLength, CellState};
use crate::kernels;
use crate::loader::LstmWeights;
use crate::tensor::Tensor2;
use ndarray::{s, Zip};
use std::sync::Arc;

/// LSTM cell with a separate memory channel
///
/// [i, f, o, c~] = x @ W + b + h @ U
/// c' = sigmoid(f) * c + sigmoid(i) * tanh(c~)
/// h' = sigmoid(o) * tanh(c')
pub struct Lstm {
    weights: Arc<LstmWeights>,
}

impl Lstm {
    pub fn new(weights: Arc<LstmWeights>) -> Self {
        Self { weights }
    }

    /// Transition with an explicit recurrent input in place of the previous output.
    /// `prev_cell` is the previous memory channel.
    pub(crate) fn transition(
        &self,
        next: &mut CellState,
        prev_cell: &Tensor2,
        recurrent: &Tensor2,
        input: &Tensor2,
    ) {
        let w = &self.weights;
        let dim = w.hidden_size();

        let mut gates = kernels::affine(input, &w.w, &w.b);
        gates += &kernels::fast_matmul(recurrent, &w.u);
        gates
            .slice_mut(s![.., ..3 * dim])
            .mapv_inplace(kernels::sigmoid);
        gates.slice_mut(s![.., 3 * dim..]).mapv_inplace(f32::tanh);

        let input_gate = gates.slice(s![.., ..dim]);
        let forget_gate = gates.slice(s![.., dim..2 * dim]);
        let output_gate = gates.slice(s![.., 2 * dim..3 * dim]);
        let candidate = gates.slice(s![.., 3 * dim..]);

        let next_cell = next
            .cell
            .as_mut()
            .expect("LSTM state has a memory channel");

        Zip::from(&mut *next_cell)
            .and(&forget_gate)
            .and(prev_cell)
            .and(&input_gate)
            .and(&candidate)
            .for_each(|c, &f, &c_prev, &i, &cand| *c = f * c_prev + i * cand);

        Zip::from(&mut next.output)
            .and(&output_gate)
            .and(&*next_cell)
            .for_each(|h, &o, &c| *h = o * c.tanh());
    }
}

impl Cell for Lstm {
    fn state_length(&self) -> CellLength {
        let dim = self.weights.hidden_size();
        CellLength::new(dim, dim)
    }

    fn input_size(&self) -> usize {
        self.weights.input_size()
    }

    fn next_state(&self, next: &mut CellState, prev: &CellState, input: &Tensor2) {
        let prev_cell = prev
            .cell
            .as_ref()
            .expect("LSTM state has a memory channel");
        self.transition(next, prev_cell, &prev.output, input);
    }
}
