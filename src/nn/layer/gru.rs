/*
 * @Author       : 老董
 * @Date         : 2026-01-21
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : GruCell (门控循环单元) - 单个时间步的计算
 *
 * 公式:
 *   r_t = σ(x_t @ W_ir + h_{t-1} @ W_hr + b_r)     # 重置门
 *   z_t = σ(x_t @ W_iz + h_{t-1} @ W_hz + b_z)     # 更新门
 *   n_t = tanh(x_t @ W_in + r_t ⊙ (h_{t-1} @ W_hn) + b_n)  # 候选状态
 *   h_t = (1 - z_t) ⊙ n_t + z_t ⊙ h_{t-1}         # 隐藏状态
 *
 * 这是 PyTorch `nn.GRUCell`的写法：重置门作用在`h_{t-1} @ W_hn`上。
 * TensorFlow `GRUCell`则是 tanh([x_t, r_t ⊙ h_{t-1}] @ W + b)，且门偏置初始化为1.0；
 * 这里的门偏置初始化为0。
 *
 * 最后一式按 h_t = n_t + z_t ⊙ (h_{t-1} - n_t) 计算，二者等价。
 * 时间步的展开由`dynamic_rnn`负责，这里只算一步。
 */

use super::RecurrentCell;
use crate::nn::param_store::{Init, ParamStore};
use crate::nn::var_ops::{VarActivationOps, VarMatrixOps};
use crate::nn::{ForwardContext, GraphError, Module, Var};
use rand::Rng;

/// GruCell - 一个时间步的 GRU
///
/// # 输入/输出形状
/// - 输入：[`batch_size`, `input_size`]
/// - 状态：1 个 [`batch_size`, `hidden_size`]
/// - 输出：新的隐藏状态（同时作为输出）
#[derive(Debug, Clone)]
pub struct GruCell {
    // === 重置门参数 ===
    w_ir: String, // [input_size, hidden_size]
    w_hr: String, // [hidden_size, hidden_size]
    b_r: String,  // [1, hidden_size]
    // === 更新门参数 ===
    w_iz: String,
    w_hz: String,
    b_z: String,
    // === 候选状态参数 ===
    w_in: String,
    w_hn: String,
    b_n: String,
    input_size: usize,
    hidden_size: usize,
}

impl GruCell {
    /// 创建新的 GruCell，9 个参数登记在`scope`下
    pub fn new<R: Rng + ?Sized>(
        store: &mut ParamStore,
        rng: &mut R,
        scope: &str,
        input_size: usize,
        hidden_size: usize,
    ) -> Result<Self, GraphError> {
        let input_shape = [input_size, hidden_size];
        let hidden_shape = [hidden_size, hidden_size];
        let bias_shape = [1, hidden_size];
        let mut create = |name: &str, shape: &[usize], init: Init| {
            store.get_or_create(scope, name, shape, &init, &mut *rng)
        };

        Ok(Self {
            // === 重置门参数 ===
            w_ir: create("W_ir", &input_shape, Init::Xavier)?,
            w_hr: create("W_hr", &hidden_shape, Init::Xavier)?,
            b_r: create("b_r", &bias_shape, Init::Zeros)?,
            // === 更新门参数 ===
            w_iz: create("W_iz", &input_shape, Init::Xavier)?,
            w_hz: create("W_hz", &hidden_shape, Init::Xavier)?,
            b_z: create("b_z", &bias_shape, Init::Zeros)?,
            // === 候选状态参数 ===
            w_in: create("W_in", &input_shape, Init::Xavier)?,
            w_hn: create("W_hn", &hidden_shape, Init::Xavier)?,
            b_n: create("b_n", &bias_shape, Init::Zeros)?,
            input_size,
            hidden_size,
        })
    }

    /// `σ(x @ W_i + h @ W_h + b)`形式的门
    fn gate(&self, ctx: &ForwardContext<'_>, x: &Var, h: &Var, keys: [&str; 3]) -> Result<Var, GraphError> {
        let [w_i, w_h, b] = keys;
        x.matmul(&ctx.param(w_i)?)?
            .try_add(&h.matmul(&ctx.param(w_h)?)?)?
            .try_add(&ctx.param(b)?)?
            .sigmoid()
    }
}

impl RecurrentCell for GruCell {
    fn input_size(&self) -> usize {
        self.input_size
    }

    fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn step(&self, ctx: &ForwardContext<'_>, input: &Var, state: &[Var]) -> Result<(Var, Vec<Var>), GraphError> {
        let [h] = state else {
            return Err(GraphError::InvalidOperation(format!(
                "GruCell需要1个状态，实际为{}个",
                state.len()
            )));
        };

        let r = self.gate(ctx, input, h, [&self.w_ir, &self.w_hr, &self.b_r])?;
        let z = self.gate(ctx, input, h, [&self.w_iz, &self.w_hz, &self.b_z])?;
        let n = input
            .matmul(&ctx.param(&self.w_in)?)?
            .try_add(&r.try_mul(&h.matmul(&ctx.param(&self.w_hn)?)?)?)?
            .try_add(&ctx.param(&self.b_n)?)?
            .tanh()?;
        let h_new = n.try_add(&z.try_mul(&h.try_sub(&n)?)?)?;

        Ok((h_new.clone(), vec![h_new]))
    }
}

impl Module for GruCell {
    fn parameter_names(&self) -> Vec<String> {
        vec![
            self.w_ir.clone(),
            self.w_hr.clone(),
            self.b_r.clone(),
            self.w_iz.clone(),
            self.w_hz.clone(),
            self.b_z.clone(),
            self.w_in.clone(),
            self.w_hn.clone(),
            self.b_n.clone(),
        ]
    }
}
