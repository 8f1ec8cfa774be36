//! Row-parallel matrix products.
//!
//! The recurrence is sequential in time, so the only parallelism available to a
//! scan is across the batch rows of a single timestep's products. With the
//! `parallel` feature each output row is computed on the rayon pool once the
//! batch is large enough to amortise task overhead.

use super::matmul;
use crate::tensor::Tensor2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Minimum output rows before work is split across threads
#[cfg(feature = "parallel")]
const MIN_PARALLEL_ROWS: usize = 16;

/// Matrix multiplication C = A @ B, split across rows of A when `parallel` is enabled
#[cfg(feature = "parallel")]
pub fn fast_matmul(a: &Tensor2, b: &Tensor2) -> Tensor2 {
    let (rows, inner) = a.dim();
    let cols = b.ncols();
    if rows < MIN_PARALLEL_ROWS || cols == 0 {
        return matmul(a, b);
    }
    debug_assert_eq!(inner, b.nrows());

    let mut out = Tensor2::zeros((rows, cols));
    let a_view = a.view();
    let b_view = b.view();
    if let Some(out_slice) = out.as_slice_mut() {
        out_slice
            .par_chunks_mut(cols)
            .enumerate()
            .for_each(|(i, out_row)| {
                let row = a_view.row(i).dot(&b_view);
                for (o, v) in out_row.iter_mut().zip(row.iter()) {
                    *o = *v;
                }
            });
        out
    } else {
        matmul(a, b)
    }
}

#[cfg(not(feature = "parallel"))]
pub fn fast_matmul(a: &Tensor2, b: &Tensor2) -> Tensor2 {
    matmul(a, b)
}
