use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use ndarray::Ix2;

impl Tensor {
    /// 实现矩阵乘法。只接受2阶张量，
    /// 且前一个张量的列数（col）必须等于后一个张量的行数（row），否则返回错误。
    pub fn mat_mul(&self, other: &Self) -> Result<Self, TensorError> {
        let self_data = self
            .data
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| TensorError::NotMatrix(self.shape().to_vec()))?;
        let other_data = other
            .data
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| TensorError::NotMatrix(other.shape().to_vec()))?;
        if self_data.ncols() != other_data.nrows() {
            return Err(TensorError::OperatorError {
                operator: Operator::MatMul,
                tensor1_shape: self.shape().to_vec(),
                tensor2_shape: other.shape().to_vec(),
            });
        }
        Ok(Self {
            data: self_data.dot(&other_data).into_dyn(),
        })
    }
}
