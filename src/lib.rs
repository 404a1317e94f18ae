//! # Only Seq2Seq
//!
//! `only_seq2seq`用纯rust实现一个基于GRU的序列到序列（seq2seq）模型：
//! 编码器（可选双向、多层）、教师强制训练的解码器、贪心自回归推理，
//! 以及按全局范数裁剪梯度的Adam训练与检查点保存/恢复。
//!
//! 数值部分是一个小型的即时求值反向自动微分图（`nn`），张量基于`ndarray`（`tensor`）。
//!
//! ```ignore
//! use only_seq2seq::seq2seq::{Batch, Mode, Seq2SeqConfig, Seq2SeqModel};
//!
//! let config = Seq2SeqConfig::from_json_file("config.json")?;
//! let mut model = Seq2SeqModel::new(config, Mode::Train)?;
//! let batch = Batch::new(
//!     vec![vec![4, 5, 6], vec![4, 5, 0]],
//!     vec![3, 2],
//!     vec![vec![7, 8], vec![7, 0]],
//!     vec![2, 1],
//! )?;
//! let out = model.train(&batch)?;
//! println!("step {} loss {}", out.global_step, out.loss);
//! ```

pub mod errors;
pub mod nn;
pub mod seq2seq;
pub mod tensor;
