use super::TraitNode;
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 参数节点：值取自参数仓库中名为`key`的张量，反向传播后其梯度会交给优化器
pub(in crate::nn) struct Parameter {
    key: String,
}

impl Parameter {
    pub(in crate::nn) const fn new(key: String) -> Self {
        Self { key }
    }
}

impl TraitNode for Parameter {
    fn kind(&self) -> &'static str {
        "Parameter"
    }

    fn calc_value_by_parents(&self, _parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        Err(GraphError::InvalidOperation(format!(
            "参数节点`{}`的值来自参数仓库，不能由父节点计算",
            self.key
        )))
    }

    fn calc_grad_to_parent(
        &self,
        _index: usize,
        _parents: &[&Tensor],
        _value: &Tensor,
        _upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        Err(GraphError::InvalidOperation(format!(
            "参数节点`{}`没有父节点",
            self.key
        )))
    }

    fn is_leaf(&self) -> bool {
        true
    }
}
