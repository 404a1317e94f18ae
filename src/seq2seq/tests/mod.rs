mod batch;
mod checkpoint;
mod decoder;
mod encoder;

use crate::seq2seq::{Batch, Seq2SeqConfig, Seq2SeqError};

/// 小尺寸的配置，单元测试都从它改起
fn test_config(use_bidirectional: bool, depth: usize) -> Seq2SeqConfig {
    Seq2SeqConfig {
        hidden_units: 6,
        embedding_size: 4,
        encoder_max_time_steps: 5,
        decoder_max_time_steps: 4,
        encoder_depth: depth,
        decoder_depth: depth,
        encoder_vocab_size: 10,
        decoder_vocab_size: 12,
        dropout_rate: 0.2,
        use_fp16: false,
        optimizer_type: "adam".to_string(),
        learning_rate: 0.01,
        max_gradient_norm: 5.0,
        use_bidirectional,
        use_dropout: true,
        seed: Some(7),
        logger_name: None,
    }
}

/// 编码器`[[4,5,6],[4,5,0]]`/`[3,2]`，解码器`[[7,8],[7,0]]`/`[2,1]`
fn scenario_batch() -> Result<Batch, Seq2SeqError> {
    Batch::new(
        vec![vec![4, 5, 6], vec![4, 5, 0]],
        vec![3, 2],
        vec![vec![7, 8], vec![7, 0]],
        vec![2, 1],
    )
}
