/*
 * @Author       : 老董
 * @Date         : 2026-01-27
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : Graph 模块：计算图的核心实现
 *
 * 公开 API：
 * - `Graph`: 用户级句柄
 * - `GraphInner`: 底层实现
 * - `GraphError`: 错误类型
 *
 * 本图是“即时求值”的动态图（tape）：每创建一个运算节点就立刻算出它的值，
 * 节点按创建顺序编号，父节点的编号总是小于子节点，
 * 因此反向传播只需按编号逆序遍历一次即可，无需额外的拓扑排序。
 * 每次 train/eval/inference 调用都新建一张图，参数值来自外部的参数仓库（`ParamStore`）。
 */

mod error;
mod handle;
mod inner;

pub use error::GraphError;
pub use handle::Graph;
pub use inner::GraphInner;
