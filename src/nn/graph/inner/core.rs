/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : GraphInner 核心操作：节点查询与（即时求值式的）节点添加
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::NodeId;
use crate::nn::nodes::NodeHandle;
use crate::nn::nodes::raw_node::{NodeType, TraitNode};
use crate::tensor::{Precision, Tensor};

impl GraphInner {
    // ========== 基础访问 ==========

    pub fn nodes_count(&self) -> usize {
        self.nodes.len()
    }

    pub const fn precision(&self) -> Precision {
        self.precision
    }

    pub(in crate::nn) fn get_node(&self, id: NodeId) -> Result<&NodeHandle, GraphError> {
        self.nodes.get(id.0).ok_or(GraphError::NodeNotFound(id))
    }

    pub(in crate::nn) fn get_node_mut(&mut self, id: NodeId) -> Result<&mut NodeHandle, GraphError> {
        self.nodes.get_mut(id.0).ok_or(GraphError::NodeNotFound(id))
    }

    pub fn get_node_value(&self, id: NodeId) -> Result<&Tensor, GraphError> {
        Ok(self.get_node(id)?.value())
    }

    pub fn get_node_grad(&self, id: NodeId) -> Result<Option<&Tensor>, GraphError> {
        Ok(self.get_node(id)?.grad())
    }

    pub fn get_node_name(&self, id: NodeId) -> Result<&str, GraphError> {
        Ok(self.get_node(id)?.name())
    }

    /// 参数节点的编号（该参数尚未绑定到本图时为 None）
    pub fn get_parameter_node(&self, key: &str) -> Option<NodeId> {
        self.param_nodes.get(key).copied()
    }

    // ========== 节点添加 ==========

    /// 添加叶子节点（输入或参数），其值直接给定
    pub(in crate::nn::graph) fn add_leaf_node(
        &mut self,
        raw_node: NodeType,
        name: Option<&str>,
        value: Tensor,
        requires_grad: bool,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let name = self.generate_node_name(name, raw_node.kind(), id);
        let value = value.quantize(self.precision);
        self.nodes
            .push(NodeHandle::new(id, name, raw_node, Vec::new(), value, requires_grad));
        id
    }

    /// 添加运算节点：立即由父节点的值算出本节点的值
    pub(in crate::nn::graph) fn add_op_node(
        &mut self,
        raw_node: NodeType,
        parents: &[NodeId],
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let value = {
            let parent_values = self.collect_values(parents)?;
            raw_node.calc_value_by_parents(&parent_values)?
        };
        // 只要有一个父节点需要梯度，本节点就需要；eval 模式下一律不需要
        let mut requires_grad = false;
        for &p in parents {
            requires_grad |= self.get_node(p)?.requires_grad();
        }
        requires_grad &= self.is_train_mode();

        let id = NodeId(self.nodes.len());
        let name = self.generate_node_name(name, raw_node.kind(), id);
        let value = value.quantize(self.precision);
        self.nodes.push(NodeHandle::new(
            id,
            name,
            raw_node,
            parents.to_vec(),
            value,
            requires_grad,
        ));
        Ok(id)
    }

    pub(in crate::nn::graph) fn collect_values(&self, ids: &[NodeId]) -> Result<Vec<&Tensor>, GraphError> {
        ids.iter().map(|&id| self.get_node_value(id)).collect()
    }

    fn generate_node_name(&self, name: Option<&str>, kind: &str, id: NodeId) -> String {
        name.map_or_else(|| format!("{}_{}", kind.to_lowercase(), id.0), str::to_string)
    }
}
