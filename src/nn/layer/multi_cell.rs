/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : 循环单元 trait 与多层堆叠（MultiCell）
 */

use crate::nn::{ForwardContext, GraphError, Module, Var};

/// 循环单元：给定一个时间步的输入和上一步的状态，得到输出和新状态
///
/// 状态是按层排列的列表，每层一个`[batch, hidden_size]`。
pub trait RecurrentCell: Module {
    fn input_size(&self) -> usize;

    fn hidden_size(&self) -> usize;

    /// 状态列表的长度
    fn num_layers(&self) -> usize {
        1
    }

    fn step(&self, ctx: &ForwardContext<'_>, input: &Var, state: &[Var]) -> Result<(Var, Vec<Var>), GraphError>;

    /// 全零初始状态
    fn zero_state(&self, ctx: &ForwardContext<'_>, batch_size: usize) -> Vec<Var> {
        (0..self.num_layers())
            .map(|_| ctx.graph().zeros(&[batch_size, self.hidden_size()]))
            .collect()
    }
}

/// 多层循环单元：第`i`层的输出作为第`i+1`层的输入，状态为各层状态按层排列
pub struct MultiCell {
    cells: Vec<Box<dyn RecurrentCell>>,
}

impl MultiCell {
    /// 至少要有一层
    pub fn new(cells: Vec<Box<dyn RecurrentCell>>) -> Result<Self, GraphError> {
        if cells.is_empty() {
            return Err(GraphError::InvalidOperation(
                "MultiCell至少需要1层".to_string(),
            ));
        }
        for pair in cells.windows(2) {
            if pair[0].hidden_size() != pair[1].input_size() {
                return Err(GraphError::ShapeMismatch {
                    expected: vec![pair[0].hidden_size()],
                    got: vec![pair[1].input_size()],
                    message: "MultiCell上一层的输出宽度须等于下一层的输入宽度".to_string(),
                });
            }
        }
        Ok(Self { cells })
    }

    pub fn cells(&self) -> &[Box<dyn RecurrentCell>] {
        &self.cells
    }
}

impl RecurrentCell for MultiCell {
    fn input_size(&self) -> usize {
        self.cells[0].input_size()
    }

    fn hidden_size(&self) -> usize {
        self.cells[self.cells.len() - 1].hidden_size()
    }

    fn num_layers(&self) -> usize {
        self.cells.iter().map(|c| c.num_layers()).sum()
    }

    fn step(&self, ctx: &ForwardContext<'_>, input: &Var, state: &[Var]) -> Result<(Var, Vec<Var>), GraphError> {
        if state.len() != self.num_layers() {
            return Err(GraphError::InvalidOperation(format!(
                "MultiCell需要{}个状态，实际为{}个",
                self.num_layers(),
                state.len()
            )));
        }

        let mut output = input.clone();
        let mut new_state = Vec::with_capacity(state.len());
        let mut offset = 0;
        for cell in &self.cells {
            let layers = cell.num_layers();
            let (out, cell_state) = cell.step(ctx, &output, &state[offset..offset + layers])?;
            output = out;
            new_state.extend(cell_state);
            offset += layers;
        }
        Ok((output, new_state))
    }

    fn zero_state(&self, ctx: &ForwardContext<'_>, batch_size: usize) -> Vec<Var> {
        self.cells
            .iter()
            .flat_map(|c| c.zero_state(ctx, batch_size))
            .collect()
    }
}

impl Module for MultiCell {
    fn parameter_names(&self) -> Vec<String> {
        self.cells.iter().flat_map(|c| c.parameter_names()).collect()
    }
}
