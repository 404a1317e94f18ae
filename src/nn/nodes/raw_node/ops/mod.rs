/*
 * @Author       : 老董
 * @Date         : 2024-01-31 21:19:34
 * @Description  : 运算节点。每个节点只实现前向求值与 VJP，逐元素二元运算支持 NumPy 式广播，
 *                 其梯度通过`sum_to_shape`还原到父节点的形状
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 */

mod add;
mod concat;
mod gather;
mod mat_mul;
mod multiply;
mod row_select;
mod sigmoid;
mod subtract;
mod tanh;

pub(in crate::nn) use add::Add;
pub(in crate::nn) use concat::Concat;
pub(in crate::nn) use gather::Gather;
pub(in crate::nn) use mat_mul::MatMul;
pub(in crate::nn) use multiply::Multiply;
pub(in crate::nn) use row_select::RowSelect;
pub(in crate::nn) use sigmoid::Sigmoid;
pub(in crate::nn) use subtract::Subtract;
pub(in crate::nn) use tanh::Tanh;

use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 逐元素二元运算前的广播检查
fn check_broadcast(kind: &str, a: &Tensor, b: &Tensor) -> Result<(), GraphError> {
    if a.can_broadcast_with(b) {
        Ok(())
    } else {
        Err(GraphError::ShapeMismatch {
            expected: a.shape().to_vec(),
            got: b.shape().to_vec(),
            message: format!("{kind}节点的两个父节点形状无法广播"),
        })
    }
}
