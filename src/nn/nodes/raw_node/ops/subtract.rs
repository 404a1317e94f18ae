use super::check_broadcast;
use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, expect_parents};
use crate::tensor::Tensor;

/// `a - b`（可广播）
pub(in crate::nn) struct Subtract;

impl TraitNode for Subtract {
    fn kind(&self) -> &'static str {
        "Subtract"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        expect_parents(self.kind(), parents, 2)?;
        check_broadcast(self.kind(), parents[0], parents[1])?;
        Ok(parents[0] - parents[1])
    }

    fn calc_grad_to_parent(
        &self,
        index: usize,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        let grad = upstream_grad.sum_to_shape(parents[index].shape())?;
        if index == 0 { Ok(grad) } else { Ok(0.0 - &grad) }
    }
}
