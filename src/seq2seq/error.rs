/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : seq2seq 模型层面的错误类型
 */

use crate::nn::GraphError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Seq2SeqError {
    /// 超参数缺失/非法、模式不支持、编码器与解码器状态不匹配等，构造时即报错
    #[error("配置错误：{0}")]
    Configuration(String),

    /// 批数据的批大小不一致、长度或token越界，整批被拒绝
    #[error("批数据形状错误：{0}")]
    ShapeMismatch(String),

    /// 损失或梯度出现非有限数（NaN/inf）
    #[error("数值不稳定：{0}")]
    NumericInstability(String),

    /// 检查点读写失败或与当前模型不兼容
    #[error("检查点错误：{0}")]
    Storage(String),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
