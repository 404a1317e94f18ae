/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : 解码器：训练时教师强制 + 掩码交叉熵，推理时贪心自回归
 *
 * 两种模式各有一个构建函数（`decode_train`/`decode_inference`），
 * 它们共用同一个词嵌入（`decoder/embedding`）与同一个输出投影（`decoder/decoder_logits`），
 * 任何一种模式都不会另建一份。
 */

use super::batch::{GO, time_major};
use super::cell_factory::build_multi_cell;
use super::{Batch, Seq2SeqConfig, Seq2SeqError};
use crate::nn::layer::{MultiCell, dynamic_rnn};
use crate::nn::{
    Embedding, ForwardContext, GraphError, Linear, Module, ParamStore, RecurrentCell, Var, VarLossOps,
};
use crate::tensor::Tensor;
use rand::Rng;
use tracing::debug;

/// 训练解码的结果
pub struct TrainDecoderOutput {
    /// 掩码平均后的交叉熵损失`[1, 1]`
    pub loss: Var,
    /// 每个时间步的 logits`[batch, vocab]`
    pub logits: Vec<Var>,
    pub outputs: Vec<Var>,
    pub final_state: Vec<Var>,
}

/// 贪心解码的一步
pub struct DecodeStep {
    /// 解码单元的输出`[batch, hidden]`
    pub output: Var,
    pub logits: Var,
    /// softmax 后的概率`[batch, vocab]`
    pub probabilities: Tensor,
    /// 每个样本概率最大的 token
    pub predictions: Vec<usize>,
    /// 对应的最大概率
    pub scores: Vec<f32>,
    /// 本步之后的状态
    pub state: Vec<Var>,
}

/// 推理结果，各量已沿时间维堆叠
#[derive(Debug, Clone)]
pub struct InferenceOutput {
    /// `[batch, time, hidden]`
    pub outputs: Tensor,
    /// `[batch, time, vocab]`
    pub logits: Tensor,
    /// `[batch, time, vocab]`
    pub probabilities: Tensor,
    /// `[batch][time]`
    pub predictions: Vec<Vec<usize>>,
    /// `[batch][time]`，均在[0, 1]内
    pub scores: Vec<Vec<f32>>,
    /// 最后一步之后的状态，每层一个`[batch, hidden]`
    pub final_state: Vec<Tensor>,
}

pub struct Decoder {
    cell: MultiCell,
    embedding: Embedding,
    projection: Linear,
    max_time_steps: usize,
}

impl Decoder {
    pub fn new<R: Rng + ?Sized>(
        store: &mut ParamStore,
        rng: &mut R,
        config: &Seq2SeqConfig,
    ) -> Result<Self, Seq2SeqError> {
        let cell = build_multi_cell(
            store,
            rng,
            config,
            "decoder/rnn",
            config.embedding_size,
            config.decoder_depth,
        )?;
        let embedding = Embedding::new(
            store,
            rng,
            "decoder",
            config.decoder_vocab_size,
            config.embedding_size,
        )?;
        let projection = Linear::new(
            store,
            rng,
            "decoder/decoder_logits",
            config.hidden_units,
            config.decoder_vocab_size,
            true,
        )?;
        Ok(Self {
            cell,
            embedding,
            projection,
            max_time_steps: config.decoder_max_time_steps,
        })
    }

    pub fn num_layers(&self) -> usize {
        self.cell.num_layers()
    }

    pub fn hidden_size(&self) -> usize {
        self.cell.hidden_size()
    }

    pub const fn max_time_steps(&self) -> usize {
        self.max_time_steps
    }

    pub const fn embedding(&self) -> &Embedding {
        &self.embedding
    }

    pub const fn projection(&self) -> &Linear {
        &self.projection
    }

    /// 初始状态须与解码单元的层数、宽度一致
    pub fn check_state_layout(&self, layers: usize, width: usize) -> Result<(), Seq2SeqError> {
        if layers != self.num_layers() || width != self.hidden_size() {
            return Err(Seq2SeqError::Configuration(format!(
                "解码器需要{}层宽为{}的初始状态，编码器给出的是{layers}层宽为{width}的状态",
                self.num_layers(),
                self.hidden_size()
            )));
        }
        Ok(())
    }

    fn check_initial_state(&self, state: &[Var]) -> Result<(), Seq2SeqError> {
        if state.len() != self.num_layers() {
            return self.check_state_layout(state.len(), self.hidden_size());
        }
        for layer in state {
            let shape = layer.shape()?;
            self.check_state_layout(state.len(), shape.get(1).copied().unwrap_or(0))?;
        }
        Ok(())
    }

    /// 教师强制解码并计算掩码交叉熵：
    /// `loss = Σ mask[b,t] · CE(logits[b,t], target[b,t]) / Σ mask`
    pub fn decode_train(
        &self,
        ctx: &ForwardContext<'_>,
        initial_state: Vec<Var>,
        batch: &Batch,
    ) -> Result<TrainDecoderOutput, Seq2SeqError> {
        self.check_initial_state(&initial_state)?;
        let steps = batch.decoder_train_steps();
        let inputs = time_major(&batch.decoder_train_inputs(), steps);
        let targets = time_major(&batch.decoder_train_targets(), steps);
        let lengths = batch.decoder_train_lengths();

        let embedded = inputs
            .iter()
            .map(|ids| self.embedding.lookup(ctx, ids))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(time_steps = steps, batch_size = batch.batch_size(), "decoder_inputs_embedded");

        let rnn = dynamic_rnn(ctx, &self.cell, &embedded, &lengths, initial_state)?;

        let mut logits = Vec::with_capacity(steps);
        let mut total: Option<Var> = None;
        for (t, (output, step_targets)) in rnn.outputs.iter().zip(&targets).enumerate() {
            let step_logits = self.projection.forward(ctx, output)?;
            let mask: Vec<f32> = lengths
                .iter()
                .map(|&len| if t < len { 1.0 } else { 0.0 })
                .collect();
            let step_loss = step_logits.softmax_cross_entropy(step_targets, &mask)?;
            total = Some(match total {
                Some(sum) => sum.try_add(&step_loss)?,
                None => step_loss,
            });
            logits.push(step_logits);
        }

        let mask_total: usize = lengths.iter().sum();
        let loss = total
            .ok_or_else(|| Seq2SeqError::ShapeMismatch("解码序列至少需要1个时间步".to_string()))?
            .scale(1.0 / mask_total as f32)?;
        debug!(mask_total, loss = loss.item()?, "decoder loss");

        Ok(TrainDecoderOutput {
            loss,
            logits,
            outputs: rnn.outputs,
            final_state: rnn.final_state,
        })
    }

    /// 逐步的贪心解码器：从嵌入后的`GO`开始，正好走`max_time_steps`步
    pub fn greedy_steps<'d, 'c>(
        &'d self,
        ctx: &'d ForwardContext<'c>,
        initial_state: Vec<Var>,
    ) -> Result<GreedySteps<'d, 'c>, Seq2SeqError> {
        self.check_initial_state(&initial_state)?;
        let batch_size = match initial_state.first() {
            Some(layer) => layer.shape()?[0],
            None => return Err(Seq2SeqError::Configuration("解码器的初始状态为空".to_string())),
        };
        let go_tokens = vec![GO; batch_size];
        let input = self.embedding.lookup(ctx, &go_tokens)?;
        Ok(GreedySteps {
            decoder: self,
            ctx,
            state: initial_state,
            input,
            remaining: self.max_time_steps,
        })
    }

    /// 贪心推理：跑满`max_time_steps`步（预测到`EOS`也不提前停止），结果沿时间维堆叠
    pub fn decode_inference(
        &self,
        ctx: &ForwardContext<'_>,
        initial_state: Vec<Var>,
    ) -> Result<InferenceOutput, Seq2SeqError> {
        let steps = self
            .greedy_steps(ctx, initial_state)?
            .collect::<Result<Vec<_>, _>>()?;
        let Some(last) = steps.last() else {
            return Err(Seq2SeqError::Configuration(
                "decoder_max_time_steps须为正整数".to_string(),
            ));
        };
        let final_state = last
            .state
            .iter()
            .map(Var::value)
            .collect::<Result<Vec<_>, _>>()?;
        let batch_size = last.predictions.len();

        let mut outputs = Vec::with_capacity(steps.len());
        let mut logits = Vec::with_capacity(steps.len());
        let mut probabilities = Vec::with_capacity(steps.len());
        let mut predictions = vec![Vec::with_capacity(steps.len()); batch_size];
        let mut scores = vec![Vec::with_capacity(steps.len()); batch_size];
        for step in steps {
            outputs.push(step.output.value()?);
            logits.push(step.logits.value()?);
            probabilities.push(step.probabilities);
            for (b, (&id, &score)) in step.predictions.iter().zip(&step.scores).enumerate() {
                predictions[b].push(id);
                scores[b].push(score);
            }
        }

        let output = InferenceOutput {
            outputs: Tensor::stack_time(&outputs).map_err(GraphError::from)?,
            logits: Tensor::stack_time(&logits).map_err(GraphError::from)?,
            probabilities: Tensor::stack_time(&probabilities).map_err(GraphError::from)?,
            predictions,
            scores,
            final_state,
        };
        debug!(
            logits = ?output.logits.shape(),
            predictions = ?output.predictions,
            "decoder inference"
        );
        Ok(output)
    }
}

impl Module for Decoder {
    fn parameter_names(&self) -> Vec<String> {
        let mut names = self.cell.parameter_names();
        names.extend(self.embedding.parameter_names());
        names.extend(self.projection.parameter_names());
        names
    }
}

// ==================== GreedySteps ====================

/// 贪心解码的迭代器：每次`next`走一步，状态随之前进，不能回退或重来。
/// 出错后不再产生新的步
pub struct GreedySteps<'d, 'c> {
    decoder: &'d Decoder,
    ctx: &'d ForwardContext<'c>,
    state: Vec<Var>,
    /// 下一步的输入（上一步预测的嵌入）
    input: Var,
    remaining: usize,
}

impl GreedySteps<'_, '_> {
    fn advance(&mut self) -> Result<DecodeStep, Seq2SeqError> {
        let decoder = self.decoder;
        let (output, state) = decoder.cell.step(self.ctx, &self.input, &self.state)?;
        let logits = decoder.projection.forward(self.ctx, &output)?;
        let probabilities = logits
            .value()?
            .softmax_rows()
            .quantize(self.ctx.graph().precision());
        let predictions = probabilities.argmax_rows();
        let scores = probabilities.max_rows();

        self.input = decoder.embedding.lookup(self.ctx, &predictions)?;
        self.state = state.clone();
        Ok(DecodeStep {
            output,
            logits,
            probabilities,
            predictions,
            scores,
            state,
        })
    }
}

impl Iterator for GreedySteps<'_, '_> {
    type Item = Result<DecodeStep, Seq2SeqError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let step = self.advance();
        if step.is_err() {
            self.remaining = 0;
        }
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for GreedySteps<'_, '_> {}
