/*
 * @Author       : 老董
 * @Date         : 2025-12-22
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : Layer 模块 - 组合 Node 构建常见网络结构
 *
 * Layer 不是新的抽象层，只是语法糖：
 * 层只记住参数名，参数值在`ParamStore`里，每次前向时才绑定到当次的图上。
 */

mod dropout;
mod dynamic_rnn;
mod embedding;
mod gru;
mod linear;
mod multi_cell;

pub use dropout::DropoutWrapper;
pub use dynamic_rnn::{BiRnnOutput, RnnOutput, bidirectional_dynamic_rnn, dynamic_rnn, reverse_sequence};
pub use embedding::Embedding;
pub use gru::GruCell;
pub use linear::Linear;
pub use multi_cell::{MultiCell, RecurrentCell};
