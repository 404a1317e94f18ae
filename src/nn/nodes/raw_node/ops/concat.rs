use crate::nn::GraphError;
use crate::nn::nodes::raw_node::TraitNode;
use crate::tensor::Tensor;

/// 沿列方向拼接任意多个`[batch, n_i]`的父节点，得到`[batch, Σn_i]`
pub(in crate::nn) struct Concat;

impl TraitNode for Concat {
    fn kind(&self) -> &'static str {
        "Concat"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        if parents.is_empty() {
            return Err(GraphError::InvalidOperation(
                "Concat节点至少需要1个父节点".to_string(),
            ));
        }
        Ok(Tensor::concat_cols(parents)?)
    }

    fn calc_grad_to_parent(
        &self,
        index: usize,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        // 梯度按列切回各父节点
        let start: usize = parents[..index].iter().map(|p| p.shape()[1]).sum();
        let end = start + parents[index].shape()[1];
        Ok(upstream_grad.slice_cols(start, end))
    }
}
