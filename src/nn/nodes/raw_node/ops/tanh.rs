use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, expect_parents};
use crate::tensor::Tensor;

pub(in crate::nn) struct Tanh;

impl TraitNode for Tanh {
    fn kind(&self) -> &'static str {
        "Tanh"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        expect_parents(self.kind(), parents, 1)?;
        Ok(parents[0].tanh())
    }

    fn calc_grad_to_parent(
        &self,
        _index: usize,
        _parents: &[&Tensor],
        value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        // tanh 的导数: 1 - tanh²(x)
        Ok(upstream_grad * &value.tanh_derivative_from_output())
    }
}
