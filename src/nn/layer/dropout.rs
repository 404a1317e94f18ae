/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : 循环单元的输出 dropout 包装
 */

use super::RecurrentCell;
use crate::nn::{ForwardContext, GraphError, Module, Var};

/// 给任意循环单元的输出加 dropout：每次调用都抽取新的掩码，状态不受影响。
/// 上下文的`keep_prob`为1时原样输出。
pub struct DropoutWrapper {
    cell: Box<dyn RecurrentCell>,
}

impl DropoutWrapper {
    pub fn new(cell: Box<dyn RecurrentCell>) -> Self {
        Self { cell }
    }
}

impl RecurrentCell for DropoutWrapper {
    fn input_size(&self) -> usize {
        self.cell.input_size()
    }

    fn hidden_size(&self) -> usize {
        self.cell.hidden_size()
    }

    fn num_layers(&self) -> usize {
        self.cell.num_layers()
    }

    fn step(&self, ctx: &ForwardContext<'_>, input: &Var, state: &[Var]) -> Result<(Var, Vec<Var>), GraphError> {
        let (output, new_state) = self.cell.step(ctx, input, state)?;
        let output = match ctx.dropout_mask(&output.shape()?) {
            Some(mask) => output.mul_tensor(&mask)?,
            None => output,
        };
        Ok((output, new_state))
    }
}

impl Module for DropoutWrapper {
    fn parameter_names(&self) -> Vec<String> {
        self.cell.parameter_names()
    }
}
