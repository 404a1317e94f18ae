/*
 * @Author       : 老董
 * @Date         : 2026-01-08
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : Var - 变量句柄，持有图引用，支持链式调用
 *
 * 算术运算在本文件中，激活、矩阵、形状与损失运算见`var_ops`下的扩展 trait。
 */

use super::graph::{Graph, GraphInner};
use super::{GraphError, NodeId};
use crate::tensor::Tensor;
use std::cell::RefCell;
use std::rc::Rc;

/// 变量句柄 - 携带图引用，支持链式调用
///
/// # 设计原则
/// - 持有 `Rc<RefCell<GraphInner>>` 引用
/// - Clone 语义（非 Copy），但开销极低（Rc clone）
///
/// # 使用示例
/// ```ignore
/// let graph = Graph::new();
/// let x = graph.input(&inputs);
/// let h = x.matmul(&w)?.try_add(&b)?.tanh()?;
/// let loss = h.softmax_cross_entropy(&targets, &weights)?;
/// graph.backward(&loss)?;
/// ```
#[derive(Clone)]
pub struct Var {
    /// 节点 ID
    id: NodeId,
    /// 图引用（用户不可见）
    graph: Rc<RefCell<GraphInner>>,
}

impl std::fmt::Debug for Var {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Var").field("id", &self.id).finish()
    }
}

impl Var {
    /// 创建新的 Var（内部使用）
    pub(crate) const fn new(id: NodeId, graph: Rc<RefCell<GraphInner>>) -> Self {
        Self { id, graph }
    }

    /// 获取节点 ID
    pub const fn node_id(&self) -> NodeId {
        self.id
    }

    /// 检查两个 Var 是否来自同一个 Graph
    pub fn same_graph(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.graph, &other.graph)
    }

    /// 获取 Var 所属的 Graph handle
    pub fn get_graph(&self) -> Graph {
        Graph::from_rc(Rc::clone(&self.graph))
    }

    /// 节点的值（拷贝）
    pub fn value(&self) -> Result<Tensor, GraphError> {
        Ok(self.graph.borrow().get_node_value(self.id)?.clone())
    }

    /// 节点的形状
    pub fn shape(&self) -> Result<Vec<usize>, GraphError> {
        Ok(self.graph.borrow().get_node_value(self.id)?.shape().to_vec())
    }

    /// 节点的梯度（反向传播之后才有）
    pub fn grad(&self) -> Result<Option<Tensor>, GraphError> {
        Ok(self.graph.borrow().get_node_grad(self.id)?.cloned())
    }

    /// 标量节点的值
    pub fn item(&self) -> Result<f32, GraphError> {
        let graph = self.graph.borrow();
        let value = graph.get_node_value(self.id)?;
        value.number().ok_or_else(|| {
            GraphError::InvalidOperation(format!("节点{}不是标量，形状为{:?}", self.id, value.shape()))
        })
    }

    /// 确认`other`来自同一张图，供各运算使用
    pub(crate) fn check_same_graph(&self, other: &Self) -> Result<(), GraphError> {
        if self.same_graph(other) {
            Ok(())
        } else {
            Err(GraphError::InvalidOperation(
                "不能对来自不同 Graph 的 Var 做运算".to_string(),
            ))
        }
    }

    /// 在同一张图中用`build`创建新节点并包装为 Var
    pub(crate) fn derive<F>(&self, build: F) -> Result<Self, GraphError>
    where
        F: FnOnce(&mut GraphInner) -> Result<NodeId, GraphError>,
    {
        let mut inner = self.graph.borrow_mut();
        let id = build(&mut *inner)?;
        drop(inner);
        Ok(Self::new(id, Rc::clone(&self.graph)))
    }

    // ==================== 算术运算 ====================

    pub fn try_add(&self, other: &Self) -> Result<Self, GraphError> {
        self.check_same_graph(other)?;
        self.derive(|g| g.new_add_node(self.id, other.id, None))
    }

    pub fn try_sub(&self, other: &Self) -> Result<Self, GraphError> {
        self.check_same_graph(other)?;
        self.derive(|g| g.new_subtract_node(self.id, other.id, None))
    }

    /// 逐元素乘法（可广播）
    pub fn try_mul(&self, other: &Self) -> Result<Self, GraphError> {
        self.check_same_graph(other)?;
        self.derive(|g| g.new_multiply_node(self.id, other.id, None))
    }

    /// 与常量张量逐元素相乘（dropout 掩码、时间步掩码等），常量不参与求导
    pub fn mul_tensor(&self, constant: &Tensor) -> Result<Self, GraphError> {
        self.derive(|g| {
            let c = g.new_input_node(constant, None);
            g.new_multiply_node(self.id, c, None)
        })
    }

    /// 乘以一个纯数
    pub fn scale(&self, factor: f32) -> Result<Self, GraphError> {
        self.mul_tensor(&Tensor::new(&[factor], &[1, 1]))
    }
}
