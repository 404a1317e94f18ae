use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, expect_parents};
use crate::tensor::Tensor;

/// 按行号从`[rows, dim]`的父节点中取行，得到`[ids.len(), dim]`（词嵌入查表）。
/// 反向时梯度按行号散回（重复的行号梯度累加）。
pub(in crate::nn) struct Gather {
    ids: Vec<usize>,
}

impl Gather {
    pub(in crate::nn) const fn new(ids: Vec<usize>) -> Self {
        Self { ids }
    }
}

impl TraitNode for Gather {
    fn kind(&self) -> &'static str {
        "Gather"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        expect_parents(self.kind(), parents, 1)?;
        Ok(parents[0].gather_rows(&self.ids)?)
    }

    fn calc_grad_to_parent(
        &self,
        _index: usize,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        let rows = parents[0].shape()[0];
        Ok(Tensor::scatter_add_rows(&self.ids, upstream_grad, rows)?)
    }
}
