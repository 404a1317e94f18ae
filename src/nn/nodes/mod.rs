/*
 * @Author       : 老董
 * @Date         : 2024-01-31 20:23:53
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : 计算图的节点：节点编号、节点句柄以及各类原始节点
 */

pub(in crate::nn) mod raw_node;

use crate::tensor::Tensor;
use raw_node::{NodeType, TraitNode};
use std::fmt;

/// 节点在图中的编号（即其在 tape 中的位置）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 图中的一个节点：原始节点（决定如何求值、如何求梯度）+ 图维护的状态
pub(in crate::nn) struct NodeHandle {
    id: NodeId,
    name: String,
    raw_node: NodeType,
    parents: Vec<NodeId>,
    value: Tensor,
    grad: Option<Tensor>,
    /// 是否有参数（可训练节点）位于其上游，没有的话反向传播时可以跳过
    requires_grad: bool,
}

impl NodeHandle {
    pub(in crate::nn) fn new(
        id: NodeId,
        name: String,
        raw_node: NodeType,
        parents: Vec<NodeId>,
        value: Tensor,
        requires_grad: bool,
    ) -> Self {
        Self {
            id,
            name,
            raw_node,
            parents,
            value,
            grad: None,
            requires_grad,
        }
    }

    pub(in crate::nn) fn name(&self) -> &str {
        &self.name
    }

    pub(in crate::nn) const fn raw_node(&self) -> &NodeType {
        &self.raw_node
    }

    pub(in crate::nn) fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    pub(in crate::nn) const fn value(&self) -> &Tensor {
        &self.value
    }

    pub(in crate::nn) const fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    pub(in crate::nn) fn set_grad(&mut self, grad: Option<Tensor>) {
        self.grad = grad;
    }

    /// 累加梯度（同一节点被多个子节点使用时，各路梯度求和）
    pub(in crate::nn) fn accumulate_grad(&mut self, grad: Tensor) {
        self.grad = Some(match self.grad.take() {
            Some(existing) => existing + &grad,
            None => grad,
        });
    }

    pub(in crate::nn) const fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    pub(in crate::nn) fn is_leaf(&self) -> bool {
        self.raw_node.is_leaf()
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "节点[id={}, name={}]", self.id, self.name)
    }
}
