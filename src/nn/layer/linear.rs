/*
 * @Author       : 老董
 * @Date         : 2026-01-17
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : Linear (全连接) 层
 */

use crate::nn::param_store::{Init, ParamStore};
use crate::nn::{ForwardContext, GraphError, Module, Var, VarMatrixOps};
use rand::Rng;

/// Linear (全连接) 层
///
/// PyTorch 风格的全连接层：`output = x @ W + b`
///
/// # 输入/输出形状
/// - 输入：[batch_size, in_features]
/// - 输出：[batch_size, out_features]
///
/// # 使用示例
/// ```ignore
/// let fc = Linear::new(&mut store, &mut rng, "decoder/decoder_logits", 128, vocab, true)?;
/// let logits = fc.forward(&ctx, &h)?;
/// ```
#[derive(Debug, Clone)]
pub struct Linear {
    /// 权重参数 [in_features, out_features] 的全名
    weights: String,
    /// 偏置参数 [1, out_features] 的全名（可选）
    bias: Option<String>,
    in_features: usize,
    out_features: usize,
}

impl Linear {
    /// 创建新的 Linear 层，参数登记在`scope`下（`scope/kernel`、`scope/bias`）
    ///
    /// # 参数
    /// - `store`: 参数仓库
    /// - `rng`: 权重初始化用的随机数发生器
    /// - `scope`: 层的作用域
    /// - `in_features`: 输入特征维度
    /// - `out_features`: 输出特征维度
    /// - `use_bias`: 是否使用偏置
    pub fn new<R: Rng + ?Sized>(
        store: &mut ParamStore,
        rng: &mut R,
        scope: &str,
        in_features: usize,
        out_features: usize,
        use_bias: bool,
    ) -> Result<Self, GraphError> {
        // 权重：Xavier 均匀初始化
        let weights = store.get_or_create(scope, "kernel", &[in_features, out_features], &Init::Xavier, rng)?;

        // 偏置（可选）：零初始化
        let bias = if use_bias {
            Some(store.get_or_create(scope, "bias", &[1, out_features], &Init::Zeros, rng)?)
        } else {
            None
        };

        Ok(Self {
            weights,
            bias,
            in_features,
            out_features,
        })
    }

    /// 前向传播：`x @ W (+ b)`
    pub fn forward(&self, ctx: &ForwardContext<'_>, x: &Var) -> Result<Var, GraphError> {
        let w = ctx.param(&self.weights)?;
        let out = x.matmul(&w)?;
        match &self.bias {
            Some(bias) => out.try_add(&ctx.param(bias)?),
            None => Ok(out),
        }
    }

    pub const fn in_features(&self) -> usize {
        self.in_features
    }

    pub const fn out_features(&self) -> usize {
        self.out_features
    }

    pub const fn has_bias(&self) -> bool {
        self.bias.is_some()
    }
}

impl Module for Linear {
    fn parameter_names(&self) -> Vec<String> {
        std::iter::once(self.weights.clone())
            .chain(self.bias.clone())
            .collect()
    }
}
