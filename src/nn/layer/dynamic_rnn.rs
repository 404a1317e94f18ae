/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : 按样本长度展开循环单元（带掩码的动态 RNN），以及双向版本
 *
 * 序列以“时间步列表”表示：`inputs[t]`为第t步所有样本的输入`[batch, dim]`。
 * 对样本 i，当 t >= lengths[i] 时：
 * - 其状态原样保持（不被填充位置改写）
 * - 其输出行为0
 * 因此最终状态就是各样本在自身最后一个有效时间步的状态。
 */

use super::RecurrentCell;
use crate::nn::var_ops::VarShapeOps;
use crate::nn::{ForwardContext, GraphError, Var};
use crate::tensor::Tensor;

/// 动态 RNN 的结果
pub struct RnnOutput {
    /// 每个时间步的输出`[batch, hidden]`，共 T 个
    pub outputs: Vec<Var>,
    /// 最终状态，每层一个`[batch, hidden]`
    pub final_state: Vec<Var>,
}

/// 双向动态 RNN 的结果
pub struct BiRnnOutput {
    pub fw_outputs: Vec<Var>,
    /// 反向分支的输出已还原到原始时间位置
    pub bw_outputs: Vec<Var>,
    pub fw_state: Vec<Var>,
    pub bw_state: Vec<Var>,
}

fn check_lengths(inputs: &[Var], lengths: &[usize]) -> Result<usize, GraphError> {
    let batch_size = match inputs.first() {
        Some(first) => first.shape()?[0],
        None => return Err(GraphError::InvalidOperation("序列至少需要1个时间步".to_string())),
    };
    if lengths.len() != batch_size {
        return Err(GraphError::ShapeMismatch {
            expected: vec![batch_size],
            got: vec![lengths.len()],
            message: "样本长度的个数须与批大小一致".to_string(),
        });
    }
    Ok(batch_size)
}

/// 把`cell`按时间展开到`inputs`上
///
/// # 参数
/// - `inputs`: T 个`[batch, input_size]`
/// - `lengths`: 每个样本的有效长度
/// - `initial_state`: 初始状态（层数须与`cell.num_layers()`一致）
pub fn dynamic_rnn(
    ctx: &ForwardContext<'_>,
    cell: &dyn RecurrentCell,
    inputs: &[Var],
    lengths: &[usize],
    initial_state: Vec<Var>,
) -> Result<RnnOutput, GraphError> {
    let batch_size = check_lengths(inputs, lengths)?;
    if initial_state.len() != cell.num_layers() {
        return Err(GraphError::InvalidOperation(format!(
            "初始状态有{}层，循环单元需要{}层",
            initial_state.len(),
            cell.num_layers()
        )));
    }

    let mut state = initial_state;
    let mut outputs = Vec::with_capacity(inputs.len());
    for (t, input) in inputs.iter().enumerate() {
        let active: Vec<f32> = lengths
            .iter()
            .map(|&len| if t < len { 1.0 } else { 0.0 })
            .collect();
        let active_count = active.iter().filter(|&&a| a > 0.0).count();

        // 所有样本都已结束：输出全零，状态不变
        if active_count == 0 {
            outputs.push(ctx.graph().zeros(&[batch_size, cell.hidden_size()]));
            continue;
        }

        let (output, new_state) = cell.step(ctx, input, &state)?;
        if active_count == batch_size {
            outputs.push(output);
            state = new_state;
            continue;
        }

        // 部分样本已结束：用掩码选择新旧状态
        let mask = Tensor::new(&active, &[batch_size, 1]);
        let keep = 1.0 - &mask;
        outputs.push(output.mul_tensor(&mask)?);
        state = new_state
            .iter()
            .zip(&state)
            .map(|(new, old)| new.mul_tensor(&mask)?.try_add(&old.mul_tensor(&keep)?))
            .collect::<Result<Vec<_>, _>>()?;
    }

    Ok(RnnOutput {
        outputs,
        final_state: state,
    })
}

/// 在各样本自身的有效长度内翻转时间顺序，填充位置保持不动
///
/// 输出第 t 步第 b 行 = 输入第`lengths[b] - 1 - t`步第 b 行（t < lengths[b]时），
/// 否则为输入第 t 步第 b 行。该操作是自身的逆。
pub fn reverse_sequence(inputs: &[Var], lengths: &[usize]) -> Result<Vec<Var>, GraphError> {
    check_lengths(inputs, lengths)?;
    let steps = inputs.len();
    if let Some(&bad) = lengths.iter().find(|&&len| len > steps) {
        return Err(GraphError::InvalidOperation(format!(
            "样本长度{bad}超过序列长度{steps}"
        )));
    }

    (0..steps)
        .map(|t| {
            let source_steps: Vec<usize> = lengths
                .iter()
                .map(|&len| if t < len { len - 1 - t } else { t })
                .collect();
            // 只把用到的时间步作为父节点
            let mut used: Vec<usize> = source_steps.clone();
            used.sort_unstable();
            used.dedup();
            let parents: Vec<&Var> = used.iter().map(|&s| &inputs[s]).collect();
            let sources: Vec<(usize, usize)> = source_steps
                .iter()
                .enumerate()
                .map(|(b, s)| (used.binary_search(s).unwrap_or_default(), b))
                .collect();
            Var::select_rows(&parents, &sources)
        })
        .collect()
}

/// 双向动态 RNN：前向单元读原序列，反向单元读按长度翻转后的序列，
/// 反向输出再翻转回原始时间位置
pub fn bidirectional_dynamic_rnn(
    ctx: &ForwardContext<'_>,
    fw_cell: &dyn RecurrentCell,
    bw_cell: &dyn RecurrentCell,
    inputs: &[Var],
    lengths: &[usize],
    fw_initial_state: Vec<Var>,
    bw_initial_state: Vec<Var>,
) -> Result<BiRnnOutput, GraphError> {
    let fw = dynamic_rnn(ctx, fw_cell, inputs, lengths, fw_initial_state)?;
    let reversed = reverse_sequence(inputs, lengths)?;
    let bw = dynamic_rnn(ctx, bw_cell, &reversed, lengths, bw_initial_state)?;
    let bw_outputs = reverse_sequence(&bw.outputs, lengths)?;
    Ok(BiRnnOutput {
        fw_outputs: fw.outputs,
        bw_outputs,
        fw_state: fw.final_state,
        bw_state: bw.final_state,
    })
}
