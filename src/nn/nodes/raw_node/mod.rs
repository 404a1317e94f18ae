/*
 * @Author       : 老董
 * @Date         : 2024-01-31 20:23:53
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : 原始节点：每种运算一个结构体，由`enum_dispatch`统一分派。
 *                 原始节点只描述“如何由父节点的值求本节点的值”和“如何把上游梯度传给某个父节点”（VJP），
 *                 节点的值与梯度由图（`NodeHandle`）保存。
 */

mod input;
mod loss;
mod ops;
mod parameter;

pub(in crate::nn) use input::Input;
pub(in crate::nn) use loss::SoftmaxCrossEntropy;
pub(in crate::nn) use ops::*;
pub(in crate::nn) use parameter::Parameter;

use crate::nn::GraphError;
use crate::tensor::Tensor;
use enum_dispatch::enum_dispatch;

#[enum_dispatch]
pub(in crate::nn) enum NodeType {
    Input(Input),
    Parameter(Parameter),
    Add(Add),
    Subtract(Subtract),
    Multiply(Multiply),
    MatMul(MatMul),
    Sigmoid(Sigmoid),
    Tanh(Tanh),
    Concat(Concat),
    Gather(Gather),
    RowSelect(RowSelect),
    SoftmaxCrossEntropy(SoftmaxCrossEntropy),
}

#[enum_dispatch(NodeType)]
pub(in crate::nn) trait TraitNode {
    /// 节点类型名，用于生成默认节点名和报错信息
    fn kind(&self) -> &'static str;

    /// 根据父节点的值计算本节点的值（父节点的值在创建本节点前就已算好）
    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError>;

    /// 给定本节点的值和上游梯度，计算传给第`index`个父节点的梯度（VJP）
    fn calc_grad_to_parent(
        &self,
        index: usize,
        parents: &[&Tensor],
        value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError>;

    /// 叶子节点（输入、参数）没有父节点，反向传播到此为止
    fn is_leaf(&self) -> bool {
        false
    }
}

/// 检查父节点数量，供各节点的`calc_value_by_parents`使用
pub(in crate::nn) fn expect_parents(kind: &str, parents: &[&Tensor], count: usize) -> Result<(), GraphError> {
    if parents.len() == count {
        Ok(())
    } else {
        Err(GraphError::InvalidOperation(format!(
            "{kind}节点需要{count}个父节点，实际为{}个",
            parents.len()
        )))
    }
}
