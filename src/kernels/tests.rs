use super::*;
use ndarray::{array, Array2};

#[test]
fn test_matmul() {
    let a = array![[1.0, 2.0], [3.0, 4.0]];
    let b = array![[1.0, 0.0], [0.0, 2.0]];
    assert_eq!(matmul(&a, &b), array![[1.0, 4.0], [3.0, 8.0]]);
}

#[test]
fn test_fast_matmul_matches_dot() {
    // Tall enough to take the parallel path when the feature is enabled
    let a = Array2::from_shape_fn((40, 7), |(i, j)| (i * 7 + j) as f32 * 0.01);
    let b = Array2::from_shape_fn((7, 5), |(i, j)| (i as f32 - j as f32) * 0.1);

    let expected = a.dot(&b);
    let result = fast_matmul(&a, &b);

    assert_eq!(result.dim(), (40, 5));
    for (x, y) in result.iter().zip(expected.iter()) {
        assert!((x - y).abs() < 1e-5);
    }
}

#[test]
fn test_fast_matmul_zero_width() {
    let a = Array2::<f32>::ones((32, 3));
    let b = Array2::<f32>::zeros((3, 0));
    assert_eq!(fast_matmul(&a, &b).dim(), (32, 0));
}

#[test]
fn test_affine_broadcasts_bias() {
    let x = array![[1.0, 2.0], [0.0, 0.0]];
    let w = array![[1.0, 0.0, 1.0], [0.0, 1.0, 1.0]];
    let b = array![0.5, -0.5, 0.0];

    let out = affine(&x, &w, &b);

    assert_eq!(out, array![[1.5, 1.5, 3.0], [0.5, -0.5, 0.0]]);
}

#[test]
fn test_sigmoid_inplace() {
    let mut x = array![[0.0, 100.0, -100.0]];
    sigmoid_inplace(&mut x);

    assert!((x[[0, 0]] - 0.5).abs() < 1e-6);
    assert!((x[[0, 1]] - 1.0).abs() < 1e-6);
    assert!(x[[0, 2]].abs() < 1e-6);
}

#[test]
fn test_tanh_inplace() {
    let mut x = array![[0.0, 1.0, -1.0]];
    tanh_inplace(&mut x);

    assert_eq!(x[[0, 0]], 0.0);
    assert!((x[[0, 1]] - 1.0f32.tanh()).abs() < 1e-6);
    assert!((x[[0, 1]] + x[[0, 2]]).abs() < 1e-6);
}

#[test]
fn test_assemble_gathers_rows_in_order() {
    let table = array![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]];
    let out = assemble(&table, &[2, 0, 2, 1]);

    assert_eq!(out, array![[2.0, 2.0], [0.0, 0.0], [2.0, 2.0], [1.0, 1.0]]);
}

#[test]
fn test_paste_rows_timestep_major() {
    // 3 timesteps, batch 2, width 4 (two columns per direction)
    let mut context = Array2::<f32>::zeros((6, 4));
    let src = array![[1.0, 2.0], [3.0, 4.0]];

    paste_rows(&mut context, src.view(), 1, 2);

    assert_eq!(context.row(2).to_vec(), vec![0.0, 0.0, 1.0, 2.0]);
    assert_eq!(context.row(3).to_vec(), vec![0.0, 0.0, 3.0, 4.0]);
    assert!(context.row(0).iter().all(|&v| v == 0.0));
    assert!(context.row(5).iter().all(|&v| v == 0.0));
}

#[test]
fn test_zero_rows_masked_only() {
    let mut state = Array2::<f32>::ones((3, 2));
    zero_rows(&mut state, &[false, true, false]);

    assert_eq!(state.row(0).to_vec(), vec![1.0, 1.0]);
    assert_eq!(state.row(1).to_vec(), vec![0.0, 0.0]);
    assert_eq!(state.row(2).to_vec(), vec![1.0, 1.0]);
}
