use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, expect_parents};
use crate::tensor::Tensor;

pub(in crate::nn) struct Sigmoid;

impl TraitNode for Sigmoid {
    fn kind(&self) -> &'static str {
        "Sigmoid"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        expect_parents(self.kind(), parents, 1)?;
        Ok(parents[0].sigmoid())
    }

    fn calc_grad_to_parent(
        &self,
        _index: usize,
        _parents: &[&Tensor],
        value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        // σ'(x) = σ(x)(1 - σ(x))，直接用已算出的输出
        Ok(upstream_grad * &value.sigmoid_derivative_from_output())
    }
}
