use ndarray::{Array, ArrayView, Ix1, Ix2};

pub type Tensor1 = Array<f32, Ix1>;
pub type Tensor2 = Array<f32, Ix2>;

pub type TensorView1<'a> = ArrayView<'a, f32, Ix1>;
pub type TensorView2<'a> = ArrayView<'a, f32, Ix2>;

/// Resize `t` to `(rows, cols)` and zero it. Reallocates only when the shape changes.
pub fn resize_zeroed(t: &mut Tensor2, rows: usize, cols: usize) {
    if t.dim() == (rows, cols) {
        t.fill(0.0);
    } else {
        *t = Tensor2::zeros((rows, cols));
    }
}
