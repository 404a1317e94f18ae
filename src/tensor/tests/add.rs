use crate::tensor::Tensor;

#[test]
fn test_add_with_number() {
    let t = Tensor::new(&[1.0, 2.0, 3.0], &[1, 3]);
    assert_eq!(&t + 1.0, Tensor::new(&[2.0, 3.0, 4.0], &[1, 3]));
    assert_eq!(2.0 - &t, Tensor::new(&[1.0, 0.0, -1.0], &[1, 3]));
    assert_eq!(&t * 2.0, Tensor::new(&[2.0, 4.0, 6.0], &[1, 3]));
    assert_eq!(&t / 2.0, Tensor::new(&[0.5, 1.0, 1.5], &[1, 3]));
}

#[test]
fn test_add_broadcast_bias_row() {
    // [batch, hidden] + [1, hidden]
    let x = Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
    let b = Tensor::new(&[10.0, 20.0], &[1, 2]);
    assert_eq!(&x + &b, Tensor::new(&[11.0, 22.0, 13.0, 24.0], &[2, 2]));
    assert_eq!(&x - &b, Tensor::new(&[-9.0, -18.0, -7.0, -16.0], &[2, 2]));
}

#[test]
fn test_mul_broadcast_scalar_tensor() {
    let x = Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
    let s = Tensor::new(&[0.5], &[1, 1]);
    assert_eq!(&x * &s, Tensor::new(&[0.5, 1.0, 1.5, 2.0], &[2, 2]));
}

#[test]
fn test_add_assign_and_mul_assign() {
    let mut m = Tensor::new(&[1.0, 2.0], &[1, 2]);
    m *= 0.5;
    m += &Tensor::new(&[1.0, 1.0], &[1, 2]);
    assert_eq!(m, Tensor::new(&[1.5, 2.0], &[1, 2]));
}

#[test]
#[should_panic]
fn test_add_incompatible_shape_panics() {
    let a = Tensor::new(&[1.0, 2.0, 3.0], &[1, 3]);
    let b = Tensor::new(&[1.0, 2.0], &[1, 2]);
    let _ = &a + &b;
}
