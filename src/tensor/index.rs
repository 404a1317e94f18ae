/*
 * @Author       : 老董
 * @Date         : 2023-09-12 11:03:15
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-02
 * @Description  : 张量的索引，以及按行（样本）选取/回填的操作（词嵌入查表和它的反向传播都靠这里）
 */

use super::Tensor;
use crate::errors::TensorError;
use ndarray::Axis;
use std::ops::{Index, IndexMut};

impl Index<[usize; 2]> for Tensor {
    type Output = f32;

    fn index(&self, index: [usize; 2]) -> &f32 {
        &self.data[&index[..]]
    }
}

impl IndexMut<[usize; 2]> for Tensor {
    fn index_mut(&mut self, index: [usize; 2]) -> &mut f32 {
        &mut self.data[&index[..]]
    }
}

impl Tensor {
    /// 按`ids`从2阶张量`[rows, cols]`中选取若干行，得到`[ids.len(), cols]`，
    /// 即词嵌入的查表操作
    pub fn gather_rows(&self, ids: &[usize]) -> Result<Self, TensorError> {
        let rows = self.shape().first().copied().unwrap_or(0);
        if let Some(&bad) = ids.iter().find(|&&id| id >= rows) {
            return Err(TensorError::IndexOutOfRange {
                index: bad,
                bound: rows,
            });
        }
        Ok(Self::from_array(self.data.select(Axis(0), ids)))
    }

    /// `gather_rows`的逆运算：把`values`的第k行累加到结果的第`ids[k]`行，
    /// 结果形状为`[rows, values.cols]`，同一行被选中多次时梯度会累加
    pub fn scatter_add_rows(ids: &[usize], values: &Self, rows: usize) -> Result<Self, TensorError> {
        if values.dimension() != 2 {
            return Err(TensorError::NotMatrix(values.shape().to_vec()));
        }
        let cols = values.shape()[1];
        let mut result = Self::zeros(&[rows, cols]);
        for (k, &id) in ids.iter().enumerate() {
            if id >= rows {
                return Err(TensorError::IndexOutOfRange {
                    index: id,
                    bound: rows,
                });
            }
            let mut target = result.data.index_axis_mut(Axis(0), id);
            target += &values.data.index_axis(Axis(0), k);
        }
        Ok(result)
    }

    /// 2阶张量第`row`行的拷贝
    pub fn row(&self, row: usize) -> Vec<f32> {
        self.data.index_axis(Axis(0), row).iter().copied().collect()
    }

    /// 每行最大值所在的列下标（贪心解码用）
    pub fn argmax_rows(&self) -> Vec<usize> {
        self.data
            .axis_iter(Axis(0))
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f32::NEG_INFINITY), |(best_i, best_v), (i, &v)| {
                        if v > best_v { (i, v) } else { (best_i, best_v) }
                    })
                    .0
            })
            .collect()
    }

    /// 每行的最大值
    pub fn max_rows(&self) -> Vec<f32> {
        self.data
            .axis_iter(Axis(0))
            .map(|row| row.iter().copied().fold(f32::NEG_INFINITY, f32::max))
            .collect()
    }
}
