use crate::tensor::Tensor;
use approx::{assert_abs_diff_eq, assert_relative_eq};

#[test]
fn test_softmax_rows() {
    // PyTorch 验证值：softmax([1, 2, 3]) = [0.09003057, 0.24472848, 0.66524094]
    let logits = Tensor::new(&[1.0, 2.0, 3.0, 1.0, 1.0, 1.0], &[2, 3]);
    let probs = logits.softmax_rows();
    let expected = Tensor::new(
        &[0.09003057, 0.24472848, 0.66524094, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0],
        &[2, 3],
    );
    assert_abs_diff_eq!(probs, expected, epsilon = 1e-6);
}

#[test]
fn test_softmax_rows_large_logits_stay_finite() {
    let logits = Tensor::new(&[1000.0, 1001.0], &[1, 2]);
    let probs = logits.softmax_rows();
    assert!(probs.is_finite());
    assert_relative_eq!(probs.sum(), 1.0, epsilon = 1e-6);
}

#[test]
fn test_log_softmax_rows() {
    let logits = Tensor::new(&[1.0, 2.0, 3.0], &[1, 3]);
    let log_probs = logits.log_softmax_rows();
    // -log(0.66524094) = 0.40760597
    assert_abs_diff_eq!(log_probs[[0, 2]], -0.40760597, epsilon = 1e-6);
}

#[test]
fn test_activation_and_reduction() {
    let t = Tensor::new(&[0.0, 1.0, -1.0], &[1, 3]);
    assert_abs_diff_eq!(t.sigmoid()[[0, 0]], 0.5);
    assert_abs_diff_eq!(t.tanh()[[0, 1]], 1.0_f32.tanh());
    assert_eq!(t.sum(), 0.0);
    assert_eq!(t.sum_squares(), 2.0);
    assert!(t.is_finite());
    assert!(!Tensor::new(&[f32::NAN], &[1, 1]).is_finite());
}
