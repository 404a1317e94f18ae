use crate::nn::GraphError;
use crate::nn::nodes::raw_node::{TraitNode, expect_parents};
use crate::tensor::Tensor;

/// 带样本权重的 Softmax + CrossEntropy 融合损失节点
///
/// ## 输入
/// - 父节点 0: logits `[batch, num_classes]`（未经 softmax 的原始分数）
/// - 构造时给定：每个样本的目标类别`targets[b]`与权重`weights[b]`
///
/// ## 输出
/// - 标量`[1, 1]`：L = Σ_b w_b · (-log softmax(x_b)[t_b])
///
/// 权重为0的样本（序列中已结束的位置）对损失和梯度都没有贡献；
/// 这里只求加权和，除以总权重（求平均）由调用方完成。
///
/// ## 梯度
/// ∂L/∂x_b = w_b · (softmax(x_b) - onehot(t_b))
pub(in crate::nn) struct SoftmaxCrossEntropy {
    targets: Vec<usize>,
    weights: Vec<f32>,
}

impl SoftmaxCrossEntropy {
    pub(in crate::nn) fn new(targets: Vec<usize>, weights: Vec<f32>) -> Result<Self, GraphError> {
        if targets.len() != weights.len() {
            return Err(GraphError::ShapeMismatch {
                expected: vec![targets.len()],
                got: vec![weights.len()],
                message: "SoftmaxCrossEntropy的目标个数与权重个数须一致".to_string(),
            });
        }
        Ok(Self { targets, weights })
    }

    fn check_logits(&self, logits: &Tensor) -> Result<(), GraphError> {
        let shape = logits.shape();
        if shape.len() != 2 || shape[0] != self.targets.len() {
            return Err(GraphError::ShapeMismatch {
                expected: vec![self.targets.len(), shape.get(1).copied().unwrap_or(0)],
                got: shape.to_vec(),
                message: "SoftmaxCrossEntropy的logits须为[batch, num_classes]".to_string(),
            });
        }
        if let Some(&bad) = self.targets.iter().find(|&&t| t >= shape[1]) {
            return Err(GraphError::InvalidOperation(format!(
                "目标类别{bad}超出类别数{}",
                shape[1]
            )));
        }
        Ok(())
    }
}

impl TraitNode for SoftmaxCrossEntropy {
    fn kind(&self) -> &'static str {
        "SoftmaxCrossEntropy"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        expect_parents(self.kind(), parents, 1)?;
        self.check_logits(parents[0])?;

        // log-softmax 内部已做减最大值处理，数值稳定
        let log_probs = parents[0].log_softmax_rows();
        let loss: f32 = self
            .targets
            .iter()
            .zip(&self.weights)
            .enumerate()
            .filter(|(_, (_, w))| **w != 0.0)
            .map(|(b, (&t, &w))| -w * log_probs[[b, t]])
            .sum();
        Ok(Tensor::new(&[loss], &[1, 1]))
    }

    fn calc_grad_to_parent(
        &self,
        _index: usize,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        let upstream = upstream_grad.number().ok_or_else(|| {
            GraphError::ComputationError(format!(
                "损失节点的上游梯度应为标量，实际形状为{:?}",
                upstream_grad.shape()
            ))
        })?;

        let mut grad = parents[0].softmax_rows();
        let num_classes = grad.shape()[1];
        for (b, (&t, &w)) in self.targets.iter().zip(&self.weights).enumerate() {
            for c in 0..num_classes {
                grad[[b, c]] *= w;
            }
            grad[[b, t]] -= w;
        }
        Ok(grad * upstream)
    }
}
