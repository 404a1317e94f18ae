use super::{scenario_batch, test_config};
use crate::seq2seq::{Batch, EOS, EncoderBatch, GO, PAD, Seq2SeqError};

#[test]
fn test_decoder_train_sequences() -> Result<(), Seq2SeqError> {
    let batch = scenario_batch()?;
    assert_eq!(batch.batch_size(), 2);
    assert_eq!(batch.decoder_train_steps(), 3);
    assert_eq!(batch.decoder_train_inputs(), vec![vec![GO, 7, 8], vec![GO, 7, 0]]);
    // EOS 放在每个样本的真实末尾，其后补 PAD
    assert_eq!(
        batch.decoder_train_targets(),
        vec![vec![7, 8, EOS], vec![7, EOS, PAD]]
    );
    Ok(())
}

#[test]
fn test_decoder_train_lengths_are_one_longer() -> Result<(), Seq2SeqError> {
    let batch = Batch::new(
        vec![vec![4, 4, 4], vec![5, 0, 0], vec![6, 6, 0]],
        vec![3, 1, 2],
        vec![vec![7, 8, 9, 0], vec![7, 0, 0, 0], vec![9, 9, 9, 9]],
        vec![3, 1, 4],
    )?;
    let train_lengths = batch.decoder_train_lengths();
    for (train_len, len) in train_lengths.iter().zip(batch.decoder_lengths()) {
        assert_eq!(*train_len, len + 1);
    }
    // 训练输入与训练目标的每一行都比最长的原序列多1步
    assert!(batch.decoder_train_inputs().iter().all(|row| row.len() == 5));
    assert!(batch.decoder_train_targets().iter().all(|row| row.len() == 5));
    assert_eq!(batch.decoder_train_targets()[2], vec![9, 9, 9, 9, EOS]);
    Ok(())
}

#[test]
fn test_time_major_stops_at_longest_example() -> Result<(), Seq2SeqError> {
    let batch = EncoderBatch::new(vec![vec![4, 5, 0, 0], vec![6, 0, 0, 0]], vec![2, 1])?;
    assert_eq!(batch.padded_width(), 4);
    assert_eq!(batch.max_length(), 2);
    assert_eq!(batch.time_major(), vec![vec![4, 6], vec![5, 0]]);
    Ok(())
}

#[test]
fn test_batch_shape_errors() {
    let shape_err = |r: Result<Batch, Seq2SeqError>| matches!(r, Err(Seq2SeqError::ShapeMismatch(_)));

    // 行宽不一致
    assert!(shape_err(Batch::new(vec![vec![4, 5], vec![4]], vec![2, 1], vec![vec![7], vec![7]], vec![1, 1])));
    // 长度个数与批大小不符
    assert!(shape_err(Batch::new(vec![vec![4, 5]], vec![2, 1], vec![vec![7]], vec![1])));
    // 长度超过行宽、长度为0
    assert!(shape_err(Batch::new(vec![vec![4, 5]], vec![3], vec![vec![7]], vec![1])));
    assert!(shape_err(Batch::new(vec![vec![4, 5]], vec![2], vec![vec![7]], vec![0])));
    // 编码器与解码器的批大小不同
    assert!(shape_err(Batch::new(
        vec![vec![4, 5], vec![4, 5]],
        vec![2, 2],
        vec![vec![7]],
        vec![1]
    )));
    // 空批
    assert!(matches!(EncoderBatch::new(vec![], vec![]), Err(Seq2SeqError::ShapeMismatch(_))));
}

#[test]
fn test_check_config_bounds() -> Result<(), Seq2SeqError> {
    let config = test_config(false, 1);
    scenario_batch()?.check_config(&config)?;

    // 编码器 token 超出词表（encoder_vocab_size = 10）
    let batch = Batch::new(vec![vec![10]], vec![1], vec![vec![7]], vec![1])?;
    assert!(matches!(batch.check_config(&config), Err(Seq2SeqError::ShapeMismatch(_))));

    // 解码器 token 超出词表（decoder_vocab_size = 12），填充位置也要检查
    let batch = Batch::new(vec![vec![4]], vec![1], vec![vec![7, 12]], vec![1])?;
    assert!(matches!(batch.check_config(&config), Err(Seq2SeqError::ShapeMismatch(_))));

    // 行宽超过最大时间步数（encoder_max_time_steps = 5）
    let batch = EncoderBatch::new(vec![vec![4; 6]], vec![6])?;
    assert!(matches!(batch.check_config(&config), Err(Seq2SeqError::ShapeMismatch(_))));

    // 解码器行宽不受 decoder_max_time_steps（= 4）限制，它只是推理步数
    let batch = Batch::new(vec![vec![4]], vec![1], vec![vec![7; 6]], vec![6])?;
    batch.check_config(&config)?;
    Ok(())
}
