/*
 * @Author       : 老董
 * @Date         : 2026-01-09
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : Var 扩展 trait 模块
 *
 * 按功能领域组织 Var 的扩展方法，用户按需 import。
 *
 * # 模块结构
 * - `activation`: 激活函数（sigmoid, tanh）
 * - `loss`: 损失函数（softmax_cross_entropy）
 * - `matrix`: 矩阵运算（matmul）
 * - `shape`: 拼接与按行选取（concat, gather_rows, select_rows）
 *
 * # 使用示例
 * ```ignore
 * use only_seq2seq::nn::{Var, VarActivationOps, VarLossOps, VarMatrixOps, VarShapeOps};
 *
 * let h = x.matmul(&w)?.tanh()?;
 * let hc = Var::concat(&[&h, &c])?;
 * let loss = logits.softmax_cross_entropy(&targets, &weights)?;
 * ```
 */

mod activation;
mod loss;
mod matrix;
mod shape;

pub use activation::VarActivationOps;
pub use loss::VarLossOps;
pub use matrix::VarMatrixOps;
pub use shape::VarShapeOps;
