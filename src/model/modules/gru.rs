use super::cell::{Cell, CellLength, CellState};
use crate::kernels;
use crate::loader::GruWeights;
use crate::tensor::Tensor2;
use ndarray::{s, Zip};
use std::sync::Arc;

/// Gated recurrent unit
///
/// [r, u] = sigmoid(x @ W + b + h @ U)
/// h~ = tanh(x @ Wx + bx + r * (h @ Ux + bx2))
/// h' = u * h + (1 - u) * h~
pub struct Gru {
    weights: Arc<GruWeights>,
}

impl Gru {
    pub fn new(weights: Arc<GruWeights>) -> Self {
        Self { weights }
    }
}

impl Cell for Gru {
    fn state_length(&self) -> CellLength {
        CellLength::new(0, self.weights.hidden_size())
    }

    fn input_size(&self) -> usize {
        self.weights.input_size()
    }

    fn next_state(&self, next: &mut CellState, prev: &CellState, input: &Tensor2) {
        let w = &self.weights;
        let dim = w.hidden_size();
        let h = &prev.output;

        let mut gates = kernels::affine(input, &w.w, &w.b);
        gates += &kernels::fast_matmul(h, &w.u);
        kernels::sigmoid_inplace(&mut gates);
        let reset = gates.slice(s![.., ..dim]);
        let update = gates.slice(s![.., dim..]);

        let mut candidate = kernels::fast_matmul(h, &w.ux);
        candidate += &w.bx2;
        candidate *= &reset;
        candidate += &kernels::affine(input, &w.wx, &w.bx);
        kernels::tanh_inplace(&mut candidate);

        Zip::from(&mut next.output)
            .and(&update)
            .and(h)
            .and(&candidate)
            .for_each(|out, &u, &h, &c| *out = u * h + (1.0 - u) * c);
    }
}
