/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : 前向上下文：一次前向计算所需的图、参数仓库与 dropout 设置
 */

use super::param_store::ParamStore;
use super::{Graph, GraphError, Var};
use crate::tensor::Tensor;
use rand::rngs::StdRng;
use std::cell::RefCell;

/// 一次前向计算的上下文
///
/// - `keep_prob`为1时（eval/inference）dropout 是恒等映射，也不消耗随机数
/// - 训练时`keep_prob = 1 - dropout_rate`，每次调用都从`rng`抽取新的掩码
pub struct ForwardContext<'a> {
    graph: Graph,
    store: &'a ParamStore,
    keep_prob: f32,
    rng: Option<RefCell<&'a mut StdRng>>,
}

impl<'a> ForwardContext<'a> {
    /// 不带 dropout 的上下文
    pub fn new(graph: Graph, store: &'a ParamStore) -> Self {
        Self {
            graph,
            store,
            keep_prob: 1.0,
            rng: None,
        }
    }

    /// 开启 dropout：以`keep_prob`的概率保留每个元素
    pub fn with_dropout(mut self, keep_prob: f32, rng: &'a mut StdRng) -> Self {
        self.keep_prob = keep_prob;
        self.rng = Some(RefCell::new(rng));
        self
    }

    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    pub const fn store(&self) -> &ParamStore {
        self.store
    }

    pub const fn keep_prob(&self) -> f32 {
        self.keep_prob
    }

    /// 把名为`key`的参数绑定到本次前向的图
    pub fn param(&self, key: &str) -> Result<Var, GraphError> {
        self.graph.parameter(self.store, key)
    }

    /// 抽取一个新的 dropout 掩码；`keep_prob >= 1`或未提供随机数发生器时返回 None
    pub fn dropout_mask(&self, shape: &[usize]) -> Option<Tensor> {
        if self.keep_prob >= 1.0 {
            return None;
        }
        let rng = self.rng.as_ref()?;
        let mut rng = rng.borrow_mut();
        Some(Tensor::dropout_mask_with_rng(self.keep_prob, shape, &mut **rng))
    }
}
