use super::TraitNode;
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 输入节点：值由外部给定（token 的词向量查表结果、掩码、初始状态等），不参与梯度更新
pub(in crate::nn) struct Input;

impl TraitNode for Input {
    fn kind(&self) -> &'static str {
        "Input"
    }

    fn calc_value_by_parents(&self, _parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Err(GraphError::InvalidOperation(
            "输入节点的值由外部设置，不能由父节点计算".to_string(),
        ))
    }

    fn calc_grad_to_parent(
        &self,
        _index: usize,
        _parents: &[&Tensor],
        _value: &Tensor,
        _upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        Err(GraphError::InvalidOperation("输入节点没有父节点".to_string()))
    }

    fn is_leaf(&self) -> bool {
        true
    }
}
