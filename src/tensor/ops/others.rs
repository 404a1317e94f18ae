/*
 * @Author       : 老董
 * @Date         : 2023-08-29 09:21:30
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-02
 * @Description  : 张量的逐元素函数、归约与按行归一化
 */

use crate::tensor::Tensor;
use ndarray::Axis;

impl Tensor {
    /// 对每个元素应用`f`，返回新张量
    pub fn map<F: Fn(f32) -> f32>(&self, f: F) -> Self {
        Self::from_array(self.data.mapv(f))
    }

    pub fn sigmoid(&self) -> Self {
        self.map(|x| 1.0 / (1.0 + (-x).exp()))
    }

    pub fn tanh(&self) -> Self {
        self.map(f32::tanh)
    }

    pub fn sqrt(&self) -> Self {
        self.map(f32::sqrt)
    }

    /// 所有元素之和（纯数）
    pub fn sum(&self) -> f32 {
        self.data.sum()
    }

    /// 所有元素的平方和，梯度裁剪计算全局范数时使用
    pub fn sum_squares(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum()
    }

    /// 是否所有元素都是有限数（非 NaN、非 ±inf）
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    /// 按行计算数值稳定的 softmax：`exp(x - max) / Σ exp(x - max)`。
    /// 只接受2阶张量`[batch, classes]`。
    pub fn softmax_rows(&self) -> Self {
        let mut result = self.data.clone();
        for mut row in result.axis_iter_mut(Axis(0)) {
            let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            row.mapv_inplace(|x| (x - max).exp());
            let sum = row.sum();
            row.mapv_inplace(|x| x / sum);
        }
        Self::from_array(result)
    }

    /// 按行计算 log-softmax，交叉熵损失使用
    pub fn log_softmax_rows(&self) -> Self {
        let mut result = self.data.clone();
        for mut row in result.axis_iter_mut(Axis(0)) {
            let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let log_sum_exp = row.iter().map(|&x| (x - max).exp()).sum::<f32>().ln() + max;
            row.mapv_inplace(|x| x - log_sum_exp);
        }
        Self::from_array(result)
    }

    /// `self * (1 - self)`，即 sigmoid 输出对输入的导数
    pub(crate) fn sigmoid_derivative_from_output(&self) -> Self {
        self.map(|y| y * (1.0 - y))
    }

    /// `1 - self²`，即 tanh 输出对输入的导数
    pub(crate) fn tanh_derivative_from_output(&self) -> Self {
        self.map(|y| 1.0 - y * y)
    }
}
