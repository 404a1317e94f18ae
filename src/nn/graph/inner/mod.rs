/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : GraphInner 计算图的底层实现
 *
 * 各 impl 块分散在子模块中：
 * - core.rs: 基础操作（节点的增查、求值）
 * - backward.rs: VJP 反向传播
 * - mode.rs: train/eval
 * - node_builders.rs: new_*_node
 */

mod backward;
mod core;
mod mode;
mod node_builders;

use crate::nn::NodeId;
use crate::nn::nodes::NodeHandle;
use crate::tensor::Precision;
use std::collections::HashMap;

/// 图的完整定义（核心实现）
///
/// 用户通常通过 `Graph` 句柄使用此结构。
/// 节点存放在按创建顺序排列的`Vec`中，`NodeId`即下标。
pub struct GraphInner {
    pub(in crate::nn::graph) nodes: Vec<NodeHandle>,
    /// 参数名 -> 参数节点。同一参数在一张图中只绑定一次，多处使用共享同一节点
    pub(in crate::nn::graph) param_nodes: HashMap<String, NodeId>,
    pub(in crate::nn::graph) is_eval_mode: bool,
    /// 所有节点值在写入前都按此精度舍入
    pub(in crate::nn::graph) precision: Precision,
}

impl Default for GraphInner {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphInner {
    pub fn new() -> Self {
        Self::with_precision(Precision::default())
    }

    pub fn with_precision(precision: Precision) -> Self {
        Self {
            nodes: Vec::new(),
            param_nodes: HashMap::new(),
            is_eval_mode: false,
            precision,
        }
    }
}
