use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, expect_parents};
use crate::tensor::Tensor;

/// 矩阵乘法`a · b`，`a: [m, k]`，`b: [k, n]`。NOTE: 注意父节点顺序
pub(in crate::nn) struct MatMul;

impl TraitNode for MatMul {
    fn kind(&self) -> &'static str {
        "MatMul"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        expect_parents(self.kind(), parents, 2)?;
        let (a, b) = (parents[0], parents[1]);
        if a.dimension() != 2 || b.dimension() != 2 || a.shape()[1] != b.shape()[0] {
            return Err(GraphError::ShapeMismatch {
                expected: a.shape().to_vec(),
                got: b.shape().to_vec(),
                message: "MatMul节点的两个父节点形状不兼容：父节点1的列数须与父节点2的行数相等".to_string(),
            });
        }
        Ok(a.mat_mul(b)?)
    }

    fn calc_grad_to_parent(
        &self,
        index: usize,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        // dL/da = G · bᵀ，dL/db = aᵀ · G
        match index {
            0 => Ok(upstream_grad.mat_mul(&parents[1].transpose())?),
            _ => Ok(parents[0].transpose().mat_mul(upstream_grad)?),
        }
    }
}
