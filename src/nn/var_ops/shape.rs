/*
 * @Author       : 老董
 * @Date         : 2026-01-09
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : Var 拼接与按行选取扩展 trait
 */

use crate::nn::{GraphError, Var};

/// 拼接与按行选取扩展 trait
pub trait VarShapeOps: Sized {
    /// 沿列拼接：`[b, n1] ++ [b, n2] -> [b, n1 + n2]`
    fn concat(vars: &[&Self]) -> Result<Self, GraphError>;

    /// 把 self 当作查找表`[rows, dim]`，按`ids`取行得到`[ids.len(), dim]`
    fn gather_rows(&self, ids: &[usize]) -> Result<Self, GraphError>;

    /// 逐行从若干同形状的 Var 中挑选：输出第`b`行取自`vars[sources[b].0]`的第`sources[b].1`行
    fn select_rows(vars: &[&Self], sources: &[(usize, usize)]) -> Result<Self, GraphError>;
}

impl VarShapeOps for Var {
    fn concat(vars: &[&Self]) -> Result<Self, GraphError> {
        let first = first_of(vars, "concat")?;
        for v in vars {
            first.check_same_graph(v)?;
        }
        let ids: Vec<_> = vars.iter().map(|v| v.node_id()).collect();
        first.derive(|g| g.new_concat_node(&ids, None))
    }

    fn gather_rows(&self, ids: &[usize]) -> Result<Self, GraphError> {
        self.derive(|g| g.new_gather_node(self.node_id(), ids, None))
    }

    fn select_rows(vars: &[&Self], sources: &[(usize, usize)]) -> Result<Self, GraphError> {
        let first = first_of(vars, "select_rows")?;
        for v in vars {
            first.check_same_graph(v)?;
        }
        let ids: Vec<_> = vars.iter().map(|v| v.node_id()).collect();
        first.derive(|g| g.new_row_select_node(&ids, sources, None))
    }
}

fn first_of<'a>(vars: &[&'a Var], op: &str) -> Result<&'a Var, GraphError> {
    vars.first()
        .copied()
        .ok_or_else(|| GraphError::InvalidOperation(format!("{op}至少需要1个Var")))
}
