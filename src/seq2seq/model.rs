/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : seq2seq 模型：按模式构造一次，之后反复调用 train/eval/inference
 *
 * 每次调用都新建一张计算图，参数值始终保存在模型自己的`ParamStore`里：
 * - train：前向 + 反向 + 全局范数裁剪 + Adam，成功后`global_step`加1
 * - eval：只做前向，不用 dropout，不改参数
 * - inference：贪心解码`decoder_max_time_steps`步
 */

use super::checkpoint::Checkpoint;
use super::decoder::{Decoder, InferenceOutput};
use super::encoder::Encoder;
use super::{Batch, EncoderBatch, Mode, Seq2SeqConfig, Seq2SeqError};
use crate::nn::optimizer::{Adam, Optimizer, OptimizerType, clip_by_global_norm};
use crate::nn::{ForwardContext, Graph, Module, ParamStore};
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use tracing::{Span, debug, info, info_span, warn};

/// 一次训练调用的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainOutput {
    /// 本批的掩码平均损失（更新前）
    pub loss: f32,
    /// 本次更新后的全局步数
    pub global_step: u64,
    /// 裁剪前的全局梯度范数
    pub gradient_norm: f32,
}

/// 推理结果：每个样本`decoder_max_time_steps`个预测及其概率
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResult {
    pub predictions: Vec<Vec<usize>>,
    pub scores: Vec<Vec<f32>>,
}

pub struct Seq2SeqModel {
    config: Seq2SeqConfig,
    mode: Mode,
    store: ParamStore,
    encoder: Encoder,
    decoder: Decoder,
    /// 只在训练模式下存在
    optimizer: Option<Box<dyn Optimizer>>,
    rng: StdRng,
    global_step: u64,
    global_epoch_step: u64,
    span: Span,
}

impl Seq2SeqModel {
    /// 按配置与模式构造模型，所有参数在此一次性创建
    pub fn new(config: Seq2SeqConfig, mode: Mode) -> Result<Self, Seq2SeqError> {
        config.validate()?;
        let span = info_span!("seq2seq", name = %config.logger_name(), %mode);
        let entered = span.enter();

        let mut rng = StdRng::seed_from_u64(config.seed());
        let mut store = ParamStore::new(config.precision());
        let encoder = Encoder::new(&mut store, &mut rng, &config)?;
        let decoder = Decoder::new(&mut store, &mut rng, &config)?;
        decoder.check_state_layout(encoder.state_layers(), encoder.hidden_size())?;
        debug!(
            parameters = store.len(),
            elements = store.num_elements(),
            bidirectional = encoder.is_bidirectional(),
            "model built"
        );

        let optimizer: Option<Box<dyn Optimizer>> = match mode {
            Mode::Train => {
                info!("Setting optimizer...");
                let optimizer: Box<dyn Optimizer> = match config.optimizer()? {
                    OptimizerType::Adam => Box::new(Adam::new_default(config.learning_rate)),
                };
                info!(
                    optimizer = %config.optimizer_type,
                    learning_rate = config.learning_rate,
                    "Optimizer has been set"
                );
                Some(optimizer)
            }
            Mode::Inference => None,
        };

        drop(entered);
        Ok(Self {
            config,
            mode,
            store,
            encoder,
            decoder,
            optimizer,
            rng,
            global_step: 0,
            global_epoch_step: 0,
            span,
        })
    }

    /// 训练一步：前向、反向、裁剪、更新。
    /// 损失或梯度范数不是有限数时报错，且参数不做任何修改
    pub fn train(&mut self, batch: &Batch) -> Result<TrainOutput, Seq2SeqError> {
        let _entered = self.span.enter();
        if self.optimizer.is_none() {
            return Err(Seq2SeqError::Configuration(format!(
                "train只能在train模式下调用，当前模式为{}",
                self.mode
            )));
        }
        batch.check_config(&self.config)?;

        let graph = Graph::new_train(self.config.precision());
        let loss = {
            let ctx = ForwardContext::new(graph.clone(), &self.store)
                .with_dropout(self.config.train_keep_prob(), &mut self.rng);
            let encoded = self.encoder.encode(&ctx, batch.encoder())?;
            self.decoder
                .decode_train(&ctx, encoded.final_state, batch)?
                .loss
        };
        let loss_value = graph.backward(&loss)?;
        if !loss_value.is_finite() {
            warn!(loss = loss_value, "non-finite loss");
            return Err(Seq2SeqError::NumericInstability(format!(
                "第{}步的损失为{loss_value}",
                self.global_step + 1
            )));
        }

        let mut grads = graph.parameter_grads();
        let gradient_norm = clip_by_global_norm(&mut grads, self.config.max_gradient_norm);
        if !gradient_norm.is_finite() {
            warn!(gradient_norm, "non-finite gradient norm");
            return Err(Seq2SeqError::NumericInstability(format!(
                "第{}步的全局梯度范数为{gradient_norm}",
                self.global_step + 1
            )));
        }

        if let Some(optimizer) = self.optimizer.as_mut() {
            optimizer.step(&mut self.store, &grads)?;
        }
        self.global_step += 1;
        debug!(
            loss = loss_value,
            gradient_norm,
            global_step = self.global_step,
            "train step"
        );

        Ok(TrainOutput {
            loss: loss_value,
            global_step: self.global_step,
            gradient_norm,
        })
    }

    /// 计算一批数据的损失：不用 dropout，不改参数，相同参数下结果确定
    pub fn eval(&self, batch: &Batch) -> Result<f32, Seq2SeqError> {
        let _entered = self.span.enter();
        batch.check_config(&self.config)?;

        let ctx = ForwardContext::new(Graph::new_eval(self.config.precision()), &self.store);
        let encoded = self.encoder.encode(&ctx, batch.encoder())?;
        let loss = self
            .decoder
            .decode_train(&ctx, encoded.final_state, batch)?
            .loss
            .item()?;
        if !loss.is_finite() {
            warn!(loss, "non-finite eval loss");
        }
        Ok(loss)
    }

    /// 贪心推理，只返回预测与概率
    pub fn inference(&self, batch: &EncoderBatch) -> Result<InferenceResult, Seq2SeqError> {
        let output = self.inference_full(batch)?;
        Ok(InferenceResult {
            predictions: output.predictions,
            scores: output.scores,
        })
    }

    /// 贪心推理，返回沿时间维堆叠的全部中间结果
    pub fn inference_full(&self, batch: &EncoderBatch) -> Result<InferenceOutput, Seq2SeqError> {
        let _entered = self.span.enter();
        batch.check_config(&self.config)?;

        let ctx = ForwardContext::new(Graph::new_eval(self.config.precision()), &self.store);
        let encoded = self.encoder.encode(&ctx, batch)?;
        self.decoder.decode_inference(&ctx, encoded.final_state)
    }

    /// 保存参数（缺省为全部）与计数器，返回实际写入的路径。
    /// 给出`global_step`时写入`<path>-<global_step>`
    pub fn save<P: AsRef<Path>>(
        &self,
        path: P,
        names: Option<&[String]>,
        global_step: Option<u64>,
    ) -> Result<PathBuf, Seq2SeqError> {
        let _entered = self.span.enter();
        let save_all = names.is_none();
        let names = names.map_or_else(|| self.store.names(), <[String]>::to_vec);
        let params = names
            .into_iter()
            .map(|name| match self.store.get(&name) {
                Some(value) => Ok((name, value.clone())),
                None => Err(Seq2SeqError::Storage(format!("模型中没有参数`{name}`"))),
            })
            .collect::<Result<_, _>>()?;

        let checkpoint = Checkpoint {
            global_step: self.global_step,
            global_epoch_step: self.global_epoch_step,
            params,
            optimizer: self
                .optimizer
                .as_ref()
                .filter(|_| save_all)
                .map(|optimizer| optimizer.snapshot()),
        };
        let path = Checkpoint::resolve_path(path, global_step);
        checkpoint.write(&path)?;
        info!(path = %path.display(), parameters = checkpoint.params.len(), "model saved");
        Ok(path)
    }

    /// 从检查点恢复参数（缺省为全部）。先校验所有参数都存在且形状一致，再统一写入。
    /// 恢复全部参数时计数器与优化器状态一并恢复（检查点里没有优化器状态时清零），
    /// 只恢复部分参数时优化器状态清零
    pub fn restore<P: AsRef<Path>>(&mut self, path: P, names: Option<&[String]>) -> Result<(), Seq2SeqError> {
        let _entered = self.span.enter();
        let path = path.as_ref();
        let checkpoint = Checkpoint::read(path)?;
        let names = names.map_or_else(|| self.store.names(), <[String]>::to_vec);
        let restore_all = names.len() == self.store.len();

        let selected = checkpoint.select(&names, |name| {
            self.store.get(name).map(|value| value.shape().to_vec())
        })?;
        // 优化器状态先于参数载入，失败时参数保持不变
        if let Some(optimizer) = self.optimizer.as_mut() {
            match checkpoint.optimizer {
                Some(snapshot) if restore_all => optimizer
                    .load_snapshot(snapshot, &self.store)
                    .map_err(|e| Seq2SeqError::Storage(format!("优化器状态无法恢复：{e}")))?,
                _ => optimizer.reset(),
            }
        }
        for (name, value) in selected {
            self.store.set(&name, value)?;
        }
        if restore_all {
            self.global_step = checkpoint.global_step;
            self.global_epoch_step = checkpoint.global_epoch_step;
        }
        info!(path = %path.display(), parameters = names.len(), "model restored");
        Ok(())
    }

    /// 外部训练循环每完成一轮调用一次，返回新的轮数
    pub fn increment_epoch(&mut self) -> u64 {
        self.global_epoch_step += 1;
        self.global_epoch_step
    }

    // ==================== 属性 ====================

    pub const fn config(&self) -> &Seq2SeqConfig {
        &self.config
    }

    pub const fn mode(&self) -> Mode {
        self.mode
    }

    pub const fn global_step(&self) -> u64 {
        self.global_step
    }

    pub const fn global_epoch_step(&self) -> u64 {
        self.global_epoch_step
    }

    pub const fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    pub const fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub const fn param_store(&self) -> &ParamStore {
        &self.store
    }

    /// 所有参数的全名（有序）
    pub fn parameter_names(&self) -> Vec<String> {
        self.store.names()
    }

    pub fn parameter(&self, name: &str) -> Option<&Tensor> {
        self.store.get(name)
    }

    /// 可训练参数的个数
    pub fn num_params(&self) -> usize {
        self.encoder.num_params() + self.decoder.num_params()
    }
}
