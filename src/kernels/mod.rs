use crate::tensor::{Tensor1, Tensor2, TensorView2};
use ndarray::{s, Axis};

mod parallel;
#[cfg(test)]
mod tests;

pub use parallel::fast_matmul;

/// Matrix multiplication: C = A @ B
pub fn matmul(a: &Tensor2, b: &Tensor2) -> Tensor2 {
    a.dot(b)
}

/// Affine projection: out = x @ W + b
/// x: (batch, d), W: (d, n), b: (n,) -> out: (batch, n)
pub fn affine(x: &Tensor2, w: &Tensor2, b: &Tensor1) -> Tensor2 {
    let mut out = fast_matmul(x, w);
    out += b;
    out
}

/// Logistic sigmoid
pub fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}

/// Logistic sigmoid, in place
pub fn sigmoid_inplace(x: &mut Tensor2) {
    x.mapv_inplace(sigmoid);
}

/// Hyperbolic tangent, in place
pub fn tanh_inplace(x: &mut Tensor2) {
    x.mapv_inplace(f32::tanh);
}

/// Gather rows of `table` by index: out[i] = table[indices[i]]
pub fn assemble(table: &Tensor2, indices: &[usize]) -> Tensor2 {
    table.select(Axis(0), indices)
}

/// Copy `src` (batch, width) into the timestep-major `context` at timestep `t`,
/// starting at column `col_offset`. Row `b` of `src` lands at context row `t * batch + b`.
pub fn paste_rows(context: &mut Tensor2, src: TensorView2, t: usize, col_offset: usize) {
    let (batch, width) = src.dim();
    let start = t * batch;
    context
        .slice_mut(s![start..start + batch, col_offset..col_offset + width])
        .assign(&src);
}

/// Zero every row `b` of `t` for which `mask[b]` is set.
pub fn zero_rows(t: &mut Tensor2, mask: &[bool]) {
    for (mut row, &masked) in t.outer_iter_mut().zip(mask) {
        if masked {
            row.fill(0.0);
        }
    }
}
