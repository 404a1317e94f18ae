/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : GraphInner VJP 反向传播
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::NodeId;
use crate::nn::nodes::raw_node::TraitNode;
use crate::tensor::Tensor;
use std::collections::BTreeMap;

impl GraphInner {
    // ========== VJP 反向传播核心 ==========

    /// 反向传播，返回损失值
    ///
    /// 父节点编号总小于子节点编号，所以从损失节点开始按编号逆序处理一遍，
    /// 每个节点被处理时其梯度已从所有子节点汇总完毕。
    pub fn backward(&mut self, loss: NodeId) -> Result<f32, GraphError> {
        if !self.is_grad_enabled() {
            return Err(GraphError::InvalidOperation(
                "eval 模式下不能执行反向传播".to_string(),
            ));
        }

        let loss_value = self.get_node_value(loss)?;
        if loss_value.size() != 1 {
            return Err(GraphError::InvalidOperation(format!(
                "反向传播要求损失为标量 [1, 1]，但得到 {:?}",
                loss_value.shape()
            )));
        }
        let loss_scalar = loss_value.to_vec()[0];
        let loss_grad = Tensor::ones(loss_value.shape());

        self.clear_grads();
        self.get_node_mut(loss)?.set_grad(Some(loss_grad));

        for index in (0..=loss.0).rev() {
            let parent_grads = self.calc_parent_grads(NodeId(index))?;
            for (parent, grad) in parent_grads {
                self.get_node_mut(parent)?.accumulate_grad(grad);
            }
        }

        Ok(loss_scalar)
    }

    /// 把某节点的梯度按 VJP 传给它所有需要梯度的父节点
    fn calc_parent_grads(&self, id: NodeId) -> Result<Vec<(NodeId, Tensor)>, GraphError> {
        let node = self.get_node(id)?;
        let upstream = match node.grad() {
            Some(grad) if node.requires_grad() && !node.is_leaf() => grad,
            _ => return Ok(Vec::new()),
        };

        let parent_values = self.collect_values(node.parents())?;
        let mut grads = Vec::with_capacity(node.parents().len());
        for (i, &parent) in node.parents().iter().enumerate() {
            if !self.get_node(parent)?.requires_grad() {
                continue;
            }
            let grad = node
                .raw_node()
                .calc_grad_to_parent(i, &parent_values, node.value(), upstream)?;
            if grad.shape() != parent_values[i].shape() {
                return Err(GraphError::ComputationError(format!(
                    "{}传给父节点{}的梯度形状{:?}与父节点形状{:?}不符。不该触及本错误，否则说明crate代码有问题",
                    node,
                    parent,
                    grad.shape(),
                    parent_values[i].shape()
                )));
            }
            grads.push((parent, grad));
        }
        Ok(grads)
    }

    pub fn clear_grads(&mut self) {
        for node in &mut self.nodes {
            node.set_grad(None);
        }
    }

    /// 本图中所有收到梯度的参数：参数名 -> 梯度
    pub fn parameter_grads(&self) -> BTreeMap<String, Tensor> {
        self.param_nodes
            .iter()
            .filter_map(|(key, &id)| {
                self.get_node(id)
                    .ok()
                    .and_then(|node| node.grad())
                    .map(|grad| (key.clone(), grad.clone()))
            })
            .collect()
    }
}
