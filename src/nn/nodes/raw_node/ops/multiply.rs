use super::check_broadcast;
use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, expect_parents};
use crate::tensor::Tensor;

/// 逐元素乘法`a ⊙ b`（可广播）。门控、dropout掩码、时间步掩码都用它
pub(in crate::nn) struct Multiply;

impl TraitNode for Multiply {
    fn kind(&self) -> &'static str {
        "Multiply"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        expect_parents(self.kind(), parents, 2)?;
        check_broadcast(self.kind(), parents[0], parents[1])?;
        Ok(parents[0] * parents[1])
    }

    fn calc_grad_to_parent(
        &self,
        index: usize,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        // d(a⊙b)/da = b，d(a⊙b)/db = a
        let other = parents[1 - index];
        Ok((upstream_grad * other).sum_to_shape(parents[index].shape())?)
    }
}
