/*
 * @Author       : 老董
 * @Date         : 2026-01-09
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : Var 损失函数扩展 trait
 */

use crate::nn::{GraphError, Var};

/// 损失函数扩展 trait
///
/// # 使用示例
/// ```ignore
/// use only_seq2seq::nn::{Var, VarLossOps};
///
/// // 第2个样本已结束（权重0），不计入损失
/// let loss = logits.softmax_cross_entropy(&[4, 2], &[1.0, 0.0])?;
/// ```
pub trait VarLossOps {
    /// 加权 Cross Entropy Loss（含 Softmax）
    ///
    /// # 参数
    /// - `targets`: 每个样本的目标类别
    /// - `weights`: 每个样本的权重（序列掩码）
    ///
    /// # 返回
    /// 标量`[1, 1]`节点：Σ_b w_b · CE_b
    fn softmax_cross_entropy(&self, targets: &[usize], weights: &[f32]) -> Result<Var, GraphError>;
}

impl VarLossOps for Var {
    fn softmax_cross_entropy(&self, targets: &[usize], weights: &[f32]) -> Result<Var, GraphError> {
        self.derive(|g| g.new_softmax_cross_entropy_node(self.node_id(), targets, weights, None))
    }
}
