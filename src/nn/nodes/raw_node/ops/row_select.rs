use crate::nn::GraphError;
use crate::nn::nodes::raw_node::TraitNode;
use crate::tensor::Tensor;

/// 逐行从不同父节点中挑选：输出第`b`行 = 第`sources[b].0`个父节点的第`sources[b].1`行。
/// 所有父节点须同为`[rows, dim]`。按样本长度翻转时间序列（双向编码器的反向分支）就是用它
/// 在各时间步之间搬运行。
pub(in crate::nn) struct RowSelect {
    sources: Vec<(usize, usize)>,
}

impl RowSelect {
    pub(in crate::nn) const fn new(sources: Vec<(usize, usize)>) -> Self {
        Self { sources }
    }
}

impl TraitNode for RowSelect {
    fn kind(&self) -> &'static str {
        "RowSelect"
    }

    fn calc_value_by_parents(&self, parents: &[&Tensor]) -> Result<Tensor, GraphError> {
        let first = parents.first().ok_or_else(|| {
            GraphError::InvalidOperation("RowSelect节点至少需要1个父节点".to_string())
        })?;
        if first.dimension() != 2 {
            return Err(GraphError::InvalidOperation(format!(
                "RowSelect节点的父节点须为2阶张量，实际形状为{:?}",
                first.shape()
            )));
        }
        let dim = first.shape()[1];
        let mut data = Vec::with_capacity(self.sources.len() * dim);
        for &(parent, row) in &self.sources {
            let source = parents.get(parent).ok_or_else(|| {
                GraphError::InvalidOperation(format!("RowSelect引用了不存在的第{parent}个父节点"))
            })?;
            if source.shape() != first.shape() || row >= source.shape()[0] {
                return Err(GraphError::ShapeMismatch {
                    expected: first.shape().to_vec(),
                    got: source.shape().to_vec(),
                    message: format!("RowSelect无法从第{parent}个父节点中取第{row}行"),
                });
            }
            data.extend(source.row(row));
        }
        Ok(Tensor::try_new(&data, &[self.sources.len(), dim])?)
    }

    fn calc_grad_to_parent(
        &self,
        index: usize,
        parents: &[&Tensor],
        _value: &Tensor,
        upstream_grad: &Tensor,
    ) -> Result<Tensor, GraphError> {
        let (out_rows, src_rows): (Vec<usize>, Vec<usize>) = self
            .sources
            .iter()
            .enumerate()
            .filter(|(_, (parent, _))| *parent == index)
            .map(|(out_row, &(_, src_row))| (out_row, src_row))
            .unzip();
        let picked = upstream_grad.gather_rows(&out_rows)?;
        Ok(Tensor::scatter_add_rows(&src_rows, &picked, parents[index].shape()[0])?)
    }
}
