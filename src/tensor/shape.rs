use super::Tensor;
use crate::errors::{Operator, TensorError};
use ndarray::{Axis, Slice};

impl Tensor {
    /// 判断两个张量能否按 NumPy 规则广播：从右向左对齐维度，
    /// 每个维度须相等或其中之一为1（维度数不同时较短者前面补1）
    pub fn can_broadcast_with(&self, other: &Self) -> bool {
        Self::broadcast_shape(self.shape(), other.shape()).is_some()
    }

    /// 计算两个形状广播后的形状，不可广播则返回None
    pub fn broadcast_shape(shape_1: &[usize], shape_2: &[usize]) -> Option<Vec<usize>> {
        let rank = shape_1.len().max(shape_2.len());
        let dim_at = |shape: &[usize], i: usize| {
            let offset = rank - shape.len();
            if i < offset { 1 } else { shape[i - offset] }
        };
        (0..rank)
            .map(|i| match (dim_at(shape_1, i), dim_at(shape_2, i)) {
                (a, b) if a == b => Some(a),
                (1, b) => Some(b),
                (a, 1) => Some(a),
                _ => None,
            })
            .collect()
    }

    /// 将（广播后得到的）梯度按轴求和，还原为`shape`的形状。
    /// 这是广播的逆运算：被广播出来的维度上的梯度需要累加回去。
    pub fn sum_to_shape(&self, shape: &[usize]) -> Result<Self, TensorError> {
        if self.shape() == shape {
            return Ok(self.clone());
        }
        let broadcast = Self::broadcast_shape(self.shape(), shape);
        if broadcast.as_deref() != Some(self.shape()) {
            return Err(TensorError::IncompatibleShape);
        }

        let mut data = self.data.clone();
        // 先消去多出来的前导维度
        while data.ndim() > shape.len() {
            data = data.sum_axis(Axis(0));
        }
        // 再对目标为1的维度求和并保留该维
        for (axis, &dim) in shape.iter().enumerate() {
            if dim == 1 && data.shape()[axis] != 1 {
                data = data.sum_axis(Axis(axis)).insert_axis(Axis(axis));
            }
        }
        Ok(Self::from_array(data))
    }

    /// 2阶张量的转置
    pub fn transpose(&self) -> Self {
        if self.dimension() <= 1 {
            self.clone()
        } else {
            Self::from_array(self.data.t().as_standard_layout().into_owned())
        }
    }

    /// 沿第2个维度（列）拼接多个2阶张量，各张量的行数须一致
    pub fn concat_cols(tensors: &[&Self]) -> Result<Self, TensorError> {
        let first = tensors.first().ok_or(TensorError::EmptyList)?;
        for t in tensors {
            if t.dimension() != 2 || t.shape()[0] != first.shape()[0] {
                return Err(TensorError::OperatorError {
                    operator: Operator::Concat,
                    tensor1_shape: first.shape().to_vec(),
                    tensor2_shape: t.shape().to_vec(),
                });
            }
        }
        let views: Vec<_> = tensors.iter().map(|t| t.data.view()).collect();
        let data = ndarray::concatenate(Axis(1), &views).map_err(|_| TensorError::IncompatibleShape)?;
        Ok(Self::from_array(data))
    }

    /// 把 T 个形状相同的`[batch, dim]`张量沿时间维堆叠为`[batch, T, dim]`
    pub fn stack_time(tensors: &[Self]) -> Result<Self, TensorError> {
        let first = tensors.first().ok_or(TensorError::EmptyList)?;
        for t in tensors {
            if t.dimension() != 2 || t.shape() != first.shape() {
                return Err(TensorError::OperatorError {
                    operator: Operator::Stack,
                    tensor1_shape: first.shape().to_vec(),
                    tensor2_shape: t.shape().to_vec(),
                });
            }
        }
        let views: Vec<_> = tensors.iter().map(|t| t.data.view()).collect();
        let data = ndarray::stack(Axis(1), &views).map_err(|_| TensorError::IncompatibleShape)?;
        Ok(Self::from_array(data))
    }

    /// 取2阶张量的[start, end)列
    pub fn slice_cols(&self, start: usize, end: usize) -> Self {
        Self::from_array(
            self.data
                .slice_axis(Axis(1), Slice::from(start..end))
                .to_owned(),
        )
    }
}
