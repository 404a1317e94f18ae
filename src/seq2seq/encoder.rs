/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : 编码器：词嵌入 -> 投影到隐藏宽度 -> （可选双向的）多层 GRU
 *
 * 参数作用域：
 * - `encoder/embedding`
 * - `encoder/inputs_embedded_dense`（无偏置）
 * - 单向：`encoder/rnn/cell_<i>`
 * - 双向：`encoder/bidirectional/fw`、`encoder/bidirectional/bw`、
 *   `encoder/bi_outputs_dense`（无偏置）、上层`encoder/upper[/cell_<i>]`
 */

use super::cell_factory::{build_multi_cell, build_single_cell};
use super::{EncoderBatch, Seq2SeqConfig, Seq2SeqError};
use crate::nn::layer::{bidirectional_dynamic_rnn, dynamic_rnn};
use crate::nn::{Embedding, ForwardContext, Linear, Module, ParamStore, RecurrentCell, Var, VarShapeOps};
use rand::Rng;
use tracing::debug;

/// 编码结果
pub struct EncoderOutput {
    /// 每个时间步的输出`[batch, hidden]`，填充位置为0
    pub outputs: Vec<Var>,
    /// 每层一个`[batch, hidden]`，作为解码器的初始状态
    pub final_state: Vec<Var>,
}

enum EncoderBody {
    Unidirectional(Box<dyn RecurrentCell>),
    Bidirectional {
        fw: Box<dyn RecurrentCell>,
        bw: Box<dyn RecurrentCell>,
        /// `[2 * hidden] -> [hidden]`
        outputs_dense: Linear,
        /// 叠在双向层之上的其余`depth - 1`层；depth 为1时没有
        upper: Option<Box<dyn RecurrentCell>>,
    },
}

pub struct Encoder {
    embedding: Embedding,
    inputs_dense: Linear,
    body: EncoderBody,
}

impl Encoder {
    pub fn new<R: Rng + ?Sized>(
        store: &mut ParamStore,
        rng: &mut R,
        config: &Seq2SeqConfig,
    ) -> Result<Self, Seq2SeqError> {
        let hidden = config.hidden_units;
        let embedding = Embedding::new(
            store,
            rng,
            "encoder",
            config.encoder_vocab_size,
            config.embedding_size,
        )?;
        let inputs_dense = Linear::new(
            store,
            rng,
            "encoder/inputs_embedded_dense",
            config.embedding_size,
            hidden,
            false,
        )?;

        let depth = config.encoder_depth;
        let body = if config.use_bidirectional {
            let fw = build_single_cell(store, rng, config, "encoder/bidirectional/fw", hidden)?;
            let bw = build_single_cell(store, rng, config, "encoder/bidirectional/bw", hidden)?;
            let outputs_dense = Linear::new(store, rng, "encoder/bi_outputs_dense", 2 * hidden, hidden, false)?;
            let upper: Option<Box<dyn RecurrentCell>> = match depth {
                0 => {
                    return Err(Seq2SeqError::Configuration(
                        "encoder_depth须为正整数".to_string(),
                    ));
                }
                1 => None,
                2 => Some(build_single_cell(store, rng, config, "encoder/upper", hidden)?),
                _ => Some(Box::new(build_multi_cell(
                    store,
                    rng,
                    config,
                    "encoder/upper",
                    hidden,
                    depth - 1,
                )?)),
            };
            EncoderBody::Bidirectional {
                fw,
                bw,
                outputs_dense,
                upper,
            }
        } else {
            EncoderBody::Unidirectional(Box::new(build_multi_cell(
                store,
                rng,
                config,
                "encoder/rnn",
                hidden,
                depth,
            )?))
        };

        Ok(Self {
            embedding,
            inputs_dense,
            body,
        })
    }

    /// 最终状态的层数
    pub fn state_layers(&self) -> usize {
        match &self.body {
            EncoderBody::Unidirectional(cell) => cell.num_layers(),
            EncoderBody::Bidirectional { fw, upper, .. } => {
                fw.num_layers() + upper.as_ref().map_or(0, |cell| cell.num_layers())
            }
        }
    }

    pub fn hidden_size(&self) -> usize {
        self.inputs_dense.out_features()
    }

    pub const fn is_bidirectional(&self) -> bool {
        matches!(self.body, EncoderBody::Bidirectional { .. })
    }

    /// 编码一批序列
    pub fn encode(&self, ctx: &ForwardContext<'_>, batch: &EncoderBatch) -> Result<EncoderOutput, Seq2SeqError> {
        let lengths = batch.lengths();
        let batch_size = batch.batch_size();

        let inputs = batch
            .time_major()
            .iter()
            .map(|ids| {
                let embedded = self.embedding.lookup(ctx, ids)?;
                self.inputs_dense.forward(ctx, &embedded)
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            time_steps = inputs.len(),
            batch_size,
            hidden = self.hidden_size(),
            "encoder_inputs_embedded_dense"
        );

        let output = match &self.body {
            EncoderBody::Unidirectional(cell) => {
                let rnn = dynamic_rnn(ctx, cell.as_ref(), &inputs, lengths, cell.zero_state(ctx, batch_size))?;
                EncoderOutput {
                    outputs: rnn.outputs,
                    final_state: rnn.final_state,
                }
            }
            EncoderBody::Bidirectional {
                fw,
                bw,
                outputs_dense,
                upper,
            } => {
                let bi = bidirectional_dynamic_rnn(
                    ctx,
                    fw.as_ref(),
                    bw.as_ref(),
                    &inputs,
                    lengths,
                    fw.zero_state(ctx, batch_size),
                    bw.zero_state(ctx, batch_size),
                )?;
                let bi_outputs = bi
                    .fw_outputs
                    .iter()
                    .zip(&bi.bw_outputs)
                    .map(|(f, b)| outputs_dense.forward(ctx, &Var::concat(&[f, b])?))
                    .collect::<Result<Vec<_>, _>>()?;
                debug!(time_steps = bi_outputs.len(), "bi_outputs");

                let mut final_state = bi.fw_state;
                let outputs = match upper {
                    Some(cell) => {
                        let rnn = dynamic_rnn(ctx, cell.as_ref(), &bi_outputs, lengths, cell.zero_state(ctx, batch_size))?;
                        final_state.extend(rnn.final_state);
                        rnn.outputs
                    }
                    None => bi_outputs,
                };
                EncoderOutput { outputs, final_state }
            }
        };
        debug!(
            time_steps = output.outputs.len(),
            state_layers = output.final_state.len(),
            "encoder_last_state"
        );
        Ok(output)
    }
}

impl Module for Encoder {
    fn parameter_names(&self) -> Vec<String> {
        let mut names = self.embedding.parameter_names();
        names.extend(self.inputs_dense.parameter_names());
        match &self.body {
            EncoderBody::Unidirectional(cell) => names.extend(cell.parameter_names()),
            EncoderBody::Bidirectional {
                fw,
                bw,
                outputs_dense,
                upper,
            } => {
                names.extend(fw.parameter_names());
                names.extend(bw.parameter_names());
                names.extend(outputs_dense.parameter_names());
                if let Some(cell) = upper {
                    names.extend(cell.parameter_names());
                }
            }
        }
        names
    }
}
