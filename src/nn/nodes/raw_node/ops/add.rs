use super::check_broadcast;
use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, expect_parents};
use crate::tensor::Tensor;

/// `a + b`（可广播，如`[batch, n] + [1, n]`的偏置相加）
pub(in crate::nn) struct Add;

impl TraitNode for Add {
    fn kind(&self) -> &'static str {
        "Add"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        expect_parents(self.kind(), parents, 2)?;
        check_broadcast(self.kind(), parents[0], parents[1])?;
        Ok(parents[0] + parents[1])
    }

    fn calc_grad_to_parent(
        &self,
        index: usize,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        // 加法的局部梯度恒为1，只需把广播出来的维度求和消去
        Ok(upstream_grad.sum_to_shape(parents[index].shape())?)
    }
}
