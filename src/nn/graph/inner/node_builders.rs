/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : GraphInner 节点创建方法（new_*_node）
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::NodeId;
use crate::nn::nodes::raw_node::{
    Add, Concat, Gather, Input, MatMul, Multiply, Parameter, RowSelect, Sigmoid,
    SoftmaxCrossEntropy, Subtract, Tanh,
};
use crate::tensor::Tensor;

impl GraphInner {
    // ========== 叶子节点 ==========

    pub fn new_input_node(&mut self, value: &Tensor, name: Option<&str>) -> NodeId {
        self.add_leaf_node(Input.into(), name, value.clone(), false)
    }

    /// 绑定参数仓库中名为`key`的参数。已绑定过则直接返回原节点，
    /// 保证同一参数在一次前向中只有一个节点，梯度自然汇总到一处
    pub fn new_parameter_node(&mut self, key: &str, value: &Tensor) -> NodeId {
        if let Some(id) = self.get_parameter_node(key) {
            return id;
        }
        let requires_grad = self.is_grad_enabled();
        let id = self.add_leaf_node(
            Parameter::new(key.to_string()).into(),
            Some(key),
            value.clone(),
            requires_grad,
        );
        self.param_nodes.insert(key.to_string(), id);
        id
    }

    // ========== 运算节点 ==========

    pub fn new_add_node(&mut self, a: NodeId, b: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.add_op_node(Add.into(), &[a, b], name)
    }

    pub fn new_subtract_node(&mut self, a: NodeId, b: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.add_op_node(Subtract.into(), &[a, b], name)
    }

    pub fn new_multiply_node(&mut self, a: NodeId, b: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.add_op_node(Multiply.into(), &[a, b], name)
    }

    pub fn new_mat_mul_node(&mut self, a: NodeId, b: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.add_op_node(MatMul.into(), &[a, b], name)
    }

    pub fn new_sigmoid_node(&mut self, x: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.add_op_node(Sigmoid.into(), &[x], name)
    }

    pub fn new_tanh_node(&mut self, x: NodeId, name: Option<&str>) -> Result<NodeId, GraphError> {
        self.add_op_node(Tanh.into(), &[x], name)
    }

    pub fn new_concat_node(&mut self, parents: &[NodeId], name: Option<&str>) -> Result<NodeId, GraphError> {
        self.add_op_node(Concat.into(), parents, name)
    }

    pub fn new_gather_node(&mut self, table: NodeId, ids: &[usize], name: Option<&str>) -> Result<NodeId, GraphError> {
        self.add_op_node(Gather::new(ids.to_vec()).into(), &[table], name)
    }

    pub fn new_row_select_node(
        &mut self,
        parents: &[NodeId],
        sources: &[(usize, usize)],
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        self.add_op_node(RowSelect::new(sources.to_vec()).into(), parents, name)
    }

    pub fn new_softmax_cross_entropy_node(
        &mut self,
        logits: NodeId,
        targets: &[usize],
        weights: &[f32],
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let raw = SoftmaxCrossEntropy::new(targets.to_vec(), weights.to_vec())?;
        self.add_op_node(raw.into(), &[logits], name)
    }
}
