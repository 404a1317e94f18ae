/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : GRU 序列到序列（seq2seq）模型
 *
 * 由下至上：
 * - `config`: 超参数与运行模式
 * - `batch`: 批数据与特殊 token
 * - `cell_factory`: GRU 单元及其多层堆叠
 * - `encoder`/`decoder`: 编码器与解码器
 * - `checkpoint`: 参数与计数器的保存/恢复
 * - `model`: 对外的`Seq2SeqModel`
 */

mod batch;
pub mod cell_factory;
mod checkpoint;
mod config;
mod decoder;
mod encoder;
mod error;
mod model;

pub use batch::{Batch, EOS, EncoderBatch, GO, NUM_SPECIAL_TOKENS, PAD, UNK};
pub use checkpoint::Checkpoint;
pub use config::{Mode, Seq2SeqConfig};
pub use decoder::{DecodeStep, Decoder, GreedySteps, InferenceOutput, TrainDecoderOutput};
pub use encoder::{Encoder, EncoderOutput};
pub use error::Seq2SeqError;
pub use model::{InferenceResult, Seq2SeqModel, TrainOutput};

#[cfg(test)]
mod tests;
