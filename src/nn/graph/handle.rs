/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : Graph 句柄（用户级 API）
 */

use super::error::GraphError;
use super::inner::GraphInner;
use crate::nn::param_store::ParamStore;
use crate::nn::{NodeId, Var};
use crate::tensor::{Precision, Tensor};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Graph - 计算图句柄
///
/// # 设计原则
/// - 是 `Rc<RefCell<GraphInner>>` 的薄封装
/// - Clone 语义：多个 Graph 引用同一个 GraphInner
/// - 创建的 Var 自动持有图引用
#[derive(Clone)]
pub struct Graph {
    inner: Rc<RefCell<GraphInner>>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    // ==================== 创建 ====================

    /// 创建新图（训练模式，单精度）
    pub fn new() -> Self {
        Self::from_inner(GraphInner::new())
    }

    /// 创建训练模式的图：参数节点记录梯度，可以反向传播
    pub fn new_train(precision: Precision) -> Self {
        Self::from_inner(GraphInner::with_precision(precision))
    }

    /// 创建 eval 模式的图：只做前向计算
    pub fn new_eval(precision: Precision) -> Self {
        let mut inner = GraphInner::with_precision(precision);
        inner.set_eval_mode();
        Self::from_inner(inner)
    }

    pub fn from_inner(inner: GraphInner) -> Self {
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    pub(crate) const fn from_rc(inner: Rc<RefCell<GraphInner>>) -> Self {
        Self { inner }
    }

    /// 获取内部 GraphInner 的不可变引用
    pub fn inner(&self) -> std::cell::Ref<'_, GraphInner> {
        self.inner.borrow()
    }

    /// 获取内部 GraphInner 的可变引用
    pub fn inner_mut(&self) -> std::cell::RefMut<'_, GraphInner> {
        self.inner.borrow_mut()
    }

    /// 将 NodeId 包装成 Var
    pub fn wrap_node_id(&self, node_id: NodeId) -> Var {
        Var::new(node_id, Rc::clone(&self.inner))
    }

    // ==================== 创建变量 ====================

    /// 创建输入节点并设置数据
    pub fn input(&self, data: &Tensor) -> Var {
        let id = self.inner.borrow_mut().new_input_node(data, None);
        self.wrap_node_id(id)
    }

    /// 创建带名称的输入节点
    pub fn input_named(&self, data: &Tensor, name: &str) -> Var {
        let id = self.inner.borrow_mut().new_input_node(data, Some(name));
        self.wrap_node_id(id)
    }

    /// 全零输入（如 RNN 的初始状态）
    pub fn zeros(&self, shape: &[usize]) -> Var {
        self.input(&Tensor::zeros(shape))
    }

    /// 把参数仓库中的参数绑定到本图。同名参数多次绑定得到同一个节点
    pub fn parameter(&self, store: &ParamStore, key: &str) -> Result<Var, GraphError> {
        let value = store
            .get(key)
            .ok_or_else(|| GraphError::ParameterNotFound(key.to_string()))?;
        let id = self.inner.borrow_mut().new_parameter_node(key, value);
        Ok(self.wrap_node_id(id))
    }

    // ==================== 执行 ====================

    /// 以`loss`为起点反向传播，返回损失值
    pub fn backward(&self, loss: &Var) -> Result<f32, GraphError> {
        self.inner.borrow_mut().backward(loss.node_id())
    }

    /// 反向传播后各参数的梯度（未参与本次前向的参数不在其中）
    pub fn parameter_grads(&self) -> BTreeMap<String, Tensor> {
        self.inner.borrow().parameter_grads()
    }

    // ==================== 属性 ====================

    pub fn nodes_count(&self) -> usize {
        self.inner.borrow().nodes_count()
    }

    pub fn precision(&self) -> Precision {
        self.inner.borrow().precision()
    }

    pub fn is_train_mode(&self) -> bool {
        self.inner.borrow().is_train_mode()
    }
}
