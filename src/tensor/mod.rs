/*
 * @Author       : 老董
 * @Date         : 2023-08-17 17:24:24
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-02
 * @Description  : 张量（Tensor）：基于 ndarray 的 f32 多维数组，是计算图中所有数值的载体
 */

use ndarray::{Array, IxDyn};
use rand::Rng;
use rand::distributions::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::errors::TensorError;

mod ops {
    pub mod add;
    pub mod div;
    pub mod eq;
    pub mod mat_mul;
    pub mod mul;
    pub mod others;
    pub mod sub;
}

mod index;
mod precision;
mod property;
mod shape;

pub use precision::Precision;

#[cfg(test)]
mod tests;

/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 注：seq2seq 模型中绝大多数张量都是形如`[batch, features]`的2阶张量，
/// 时间维度由外部以`Vec`的方式展开，不在张量内部体现。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tensor {
    data: Array<f32, IxDyn>,
}

impl Tensor {
    /// 创建一个张量，`data`的长度必须和`shape`中所有元素的乘积相等，否则会panic。
    /// 需要可恢复的错误时请使用[`Tensor::try_new`]。
    pub fn new(data: &[f32], shape: &[usize]) -> Self {
        Self::try_new(data, shape).unwrap_or_else(|e| panic!("{e}"))
    }

    /// 创建一个张量，`data`的长度与`shape`不符时返回错误
    pub fn try_new(data: &[f32], shape: &[usize]) -> Result<Self, TensorError> {
        let data = Array::from_shape_vec(IxDyn(shape), data.to_vec()).map_err(|_| {
            TensorError::DataShapeMismatch {
                data_len: data.len(),
                shape: shape.to_vec(),
            }
        })?;
        Ok(Self { data })
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: Array::zeros(IxDyn(shape)),
        }
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self {
            data: Array::ones(IxDyn(shape)),
        }
    }

    /// 所有元素都为`value`的张量
    pub fn from_elem(value: f32, shape: &[usize]) -> Self {
        Self {
            data: Array::from_elem(IxDyn(shape), value),
        }
    }

    /// 创建一个随机张量，其值服从[min, max]闭区间上的均匀分布。
    /// 随机数来自调用方给定的`rng`，以便整个模型的初始化可由单一种子复现。
    pub fn uniform_with_rng<R: Rng + ?Sized>(min: f32, max: f32, shape: &[usize], rng: &mut R) -> Self {
        let dist = Uniform::from(min..=max);
        let data = (0..shape.iter().product::<usize>())
            .map(|_| dist.sample(rng))
            .collect::<Vec<_>>();
        Self::new(&data, shape)
    }

    /// 伯努利丢弃掩码（inverted dropout）：以`keep_prob`的概率取`1 / keep_prob`，否则取0。
    /// 这样训练期输出的期望与推理期一致，推理时无需再缩放。
    pub fn dropout_mask_with_rng<R: Rng + ?Sized>(keep_prob: f32, shape: &[usize], rng: &mut R) -> Self {
        let scale = 1.0 / keep_prob;
        let data = (0..shape.iter().product::<usize>())
            .map(|_| if rng.r#gen::<f32>() < keep_prob { scale } else { 0.0 })
            .collect::<Vec<_>>();
        Self::new(&data, shape)
    }

    pub(crate) fn from_array(data: Array<f32, IxDyn>) -> Self {
        Self { data }
    }
}
