/*
 * @Author       : 老董
 * @Date         : 2024-01-31 20:23:53
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : 负责神经网络（neural network）的构建
 */

mod context;
mod graph;
pub mod layer;
mod module;
mod nodes;
pub mod optimizer;
pub mod param_store;
mod var;
mod var_ops;

pub use context::ForwardContext;
pub use graph::{Graph, GraphError, GraphInner};
pub use layer::{Embedding, GruCell, Linear, MultiCell, RecurrentCell};
pub use module::Module;
pub use nodes::NodeId;
pub use optimizer::{Adam, Optimizer};
pub use param_store::{Init, ParamStore};
pub use var::Var;
pub use var_ops::{VarActivationOps, VarLossOps, VarMatrixOps, VarShapeOps};

#[cfg(test)]
mod tests;
