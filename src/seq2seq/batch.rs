/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : 一批训练/推理数据，以及教师强制（teacher forcing）所需的移位序列
 *
 * 所有序列都已按批内最长者右侧补齐（矩形）。长度为各样本的真实长度，
 * 超出真实长度的位置在循环与损失中都会被掩码掉。
 */

use super::{Seq2SeqConfig, Seq2SeqError};

/// 填充
pub const PAD: usize = 0;
/// 解码开始标记
pub const GO: usize = 1;
/// 序列结束标记
pub const EOS: usize = 2;
/// 未登录词
pub const UNK: usize = 3;
/// 特殊token的个数，词表大小须大于它
pub const NUM_SPECIAL_TOKENS: usize = 4;

/// 一组补齐后的 token 序列及其真实长度
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderBatch {
    tokens: Vec<Vec<usize>>,
    lengths: Vec<usize>,
}

impl EncoderBatch {
    /// 校验形状：非空、各行等宽、长度个数等于批大小、`1 <= length[i] <= 行宽`
    pub fn new(tokens: Vec<Vec<usize>>, lengths: Vec<usize>) -> Result<Self, Seq2SeqError> {
        check_sequences(&tokens, &lengths, "encoder")?;
        Ok(Self { tokens, lengths })
    }

    pub fn tokens(&self) -> &[Vec<usize>] {
        &self.tokens
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn batch_size(&self) -> usize {
        self.tokens.len()
    }

    /// 补齐后的行宽
    pub fn padded_width(&self) -> usize {
        self.tokens[0].len()
    }

    /// 批内最大的真实长度
    pub fn max_length(&self) -> usize {
        self.lengths.iter().copied().max().unwrap_or(0)
    }

    /// 按时间步排列：第 t 项是所有样本第 t 个 token。只取到`max_length`为止
    pub fn time_major(&self) -> Vec<Vec<usize>> {
        time_major(&self.tokens, self.max_length())
    }

    /// 对照配置检查行宽与 token 范围
    pub(crate) fn check_config(&self, config: &Seq2SeqConfig) -> Result<(), Seq2SeqError> {
        check_bounds(
            &self.tokens,
            config.encoder_vocab_size,
            Some(config.encoder_max_time_steps),
            "encoder",
        )
    }
}

/// 训练/评估用的一批数据：编码器输入加解码器目标序列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    encoder: EncoderBatch,
    decoder_tokens: Vec<Vec<usize>>,
    decoder_lengths: Vec<usize>,
}

impl Batch {
    pub fn new(
        encoder_tokens: Vec<Vec<usize>>,
        encoder_lengths: Vec<usize>,
        decoder_tokens: Vec<Vec<usize>>,
        decoder_lengths: Vec<usize>,
    ) -> Result<Self, Seq2SeqError> {
        let encoder = EncoderBatch::new(encoder_tokens, encoder_lengths)?;
        check_sequences(&decoder_tokens, &decoder_lengths, "decoder")?;
        if decoder_tokens.len() != encoder.batch_size() {
            return Err(Seq2SeqError::ShapeMismatch(format!(
                "编码器的批大小为{}，解码器的批大小为{}",
                encoder.batch_size(),
                decoder_tokens.len()
            )));
        }
        Ok(Self {
            encoder,
            decoder_tokens,
            decoder_lengths,
        })
    }

    pub const fn encoder(&self) -> &EncoderBatch {
        &self.encoder
    }

    pub fn decoder_tokens(&self) -> &[Vec<usize>] {
        &self.decoder_tokens
    }

    pub fn decoder_lengths(&self) -> &[usize] {
        &self.decoder_lengths
    }

    pub fn batch_size(&self) -> usize {
        self.encoder.batch_size()
    }

    /// 训练序列的时间步数：最长的解码序列再加1（GO 或 EOS）
    pub fn decoder_train_steps(&self) -> usize {
        self.decoder_lengths.iter().copied().max().unwrap_or(0) + 1
    }

    /// 解码器训练输入：`GO`接原序列，比原序列多1步
    pub fn decoder_train_inputs(&self) -> Vec<Vec<usize>> {
        let steps = self.decoder_train_steps();
        self.decoder_tokens
            .iter()
            .map(|row| {
                std::iter::once(GO)
                    .chain(row.iter().copied())
                    .chain(std::iter::repeat(PAD))
                    .take(steps)
                    .collect()
            })
            .collect()
    }

    /// 解码器训练目标：原序列的有效部分接`EOS`，其余补`PAD`
    ///
    /// `EOS`放在第`length[i]`位，而不是接在补齐后的整行之后。
    /// 因此较短的样本在其真实结尾处学的是`EOS`而非`PAD`，掩码损失的数值也随之不同
    pub fn decoder_train_targets(&self) -> Vec<Vec<usize>> {
        let steps = self.decoder_train_steps();
        self.decoder_tokens
            .iter()
            .zip(&self.decoder_lengths)
            .map(|(row, &len)| {
                row[..len]
                    .iter()
                    .copied()
                    .chain(std::iter::once(EOS))
                    .chain(std::iter::repeat(PAD))
                    .take(steps)
                    .collect()
            })
            .collect()
    }

    /// 训练输入与训练目标共用的长度：原长度加1
    pub fn decoder_train_lengths(&self) -> Vec<usize> {
        self.decoder_lengths.iter().map(|&len| len + 1).collect()
    }

    /// 解码器一侧只检查词表：`decoder_max_time_steps`只是推理步数，不限制训练序列的宽度
    pub(crate) fn check_config(&self, config: &Seq2SeqConfig) -> Result<(), Seq2SeqError> {
        self.encoder.check_config(config)?;
        check_bounds(&self.decoder_tokens, config.decoder_vocab_size, None, "decoder")
    }
}

/// `rows[b][t]` -> `[t][b]`，只取前`steps`列
pub(crate) fn time_major(rows: &[Vec<usize>], steps: usize) -> Vec<Vec<usize>> {
    (0..steps)
        .map(|t| rows.iter().map(|row| row[t]).collect())
        .collect()
}

fn check_sequences(tokens: &[Vec<usize>], lengths: &[usize], side: &str) -> Result<(), Seq2SeqError> {
    let Some(first) = tokens.first() else {
        return Err(Seq2SeqError::ShapeMismatch(format!("{side}批数据为空")));
    };
    let width = first.len();
    if let Some((i, row)) = tokens.iter().enumerate().find(|(_, row)| row.len() != width) {
        return Err(Seq2SeqError::ShapeMismatch(format!(
            "{side}第{i}行的宽度为{}，与第0行的宽度{width}不一致",
            row.len()
        )));
    }
    if lengths.len() != tokens.len() {
        return Err(Seq2SeqError::ShapeMismatch(format!(
            "{side}有{}个样本，却有{}个长度",
            tokens.len(),
            lengths.len()
        )));
    }
    if let Some((i, &len)) = lengths
        .iter()
        .enumerate()
        .find(|&(_, &len)| len == 0 || len > width)
    {
        return Err(Seq2SeqError::ShapeMismatch(format!(
            "{side}第{i}个样本的长度{len}须在[1, {width}]内"
        )));
    }
    Ok(())
}

fn check_bounds(
    tokens: &[Vec<usize>],
    vocab_size: usize,
    max_time_steps: Option<usize>,
    side: &str,
) -> Result<(), Seq2SeqError> {
    let width = tokens.first().map_or(0, Vec::len);
    if let Some(max_time_steps) = max_time_steps.filter(|&max| width > max) {
        return Err(Seq2SeqError::ShapeMismatch(format!(
            "{side}序列宽度{width}超过配置的最大时间步数{max_time_steps}"
        )));
    }
    for (i, row) in tokens.iter().enumerate() {
        if let Some(&bad) = row.iter().find(|&&token| token >= vocab_size) {
            return Err(Seq2SeqError::ShapeMismatch(format!(
                "{side}第{i}行的token {bad}超出词表大小{vocab_size}"
            )));
        }
    }
    Ok(())
}
