/*
 * @Author       : 老董
 * @Date         : 2025-07-24 16:00:00
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : 优化器基础trait和辅助结构
 */

use crate::nn::GraphError;
use crate::nn::param_store::ParamStore;
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 参数全名 -> 梯度
pub type Gradients = BTreeMap<String, Tensor>;

/// 优化器累积状态的快照，随检查点一起保存
///
/// `slots`：槽名（如Adam的`m`、`v`）-> 参数全名 -> 张量
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSnapshot {
    pub timestep: u64,
    pub slots: BTreeMap<String, BTreeMap<String, Tensor>>,
}

/// 优化器核心 trait
pub trait Optimizer {
    /// 参数更新（使用已计算并裁剪过的梯度）
    ///
    /// 训练循环：
    /// ```ignore
    /// graph.backward(&loss)?;
    /// let mut grads = graph.parameter_grads();
    /// clip_by_global_norm(&mut grads, max_norm);
    /// optimizer.step(&mut store, &grads)?; // ← 只更新参数
    /// ```
    ///
    /// 所有梯度都先校验（参数存在、形状一致），全部通过后才写入参数，不会出现只更新了一部分的情况。
    fn step(&mut self, store: &mut ParamStore, grads: &Gradients) -> Result<(), GraphError>;

    /// 重置累积状态
    fn reset(&mut self);

    /// 导出累积状态
    fn snapshot(&self) -> OptimizerSnapshot;

    /// 载入累积状态。每个槽中的张量须对应`store`中形状相同的参数；
    /// 校验全部通过后才替换当前状态
    fn load_snapshot(&mut self, snapshot: OptimizerSnapshot, store: &ParamStore) -> Result<(), GraphError>;

    /// 获取学习率
    fn learning_rate(&self) -> f32;

    /// 设置学习率
    fn set_learning_rate(&mut self, lr: f32);
}

/// 支持的优化器类型（配置中按名称指定，大小写不敏感）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerType {
    Adam,
}

impl FromStr for OptimizerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "adam" => Ok(Self::Adam),
            other => Err(format!("不支持的优化器类型`{other}`，目前只支持adam")),
        }
    }
}

impl fmt::Display for OptimizerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adam => write!(f, "adam"),
        }
    }
}
