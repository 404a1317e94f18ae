/*
 * @Author       : 老董
 * @Date         : 2026-03-02
 * @Description  : 数值精度。张量始终以 f32 存储；选择半精度时，每个参数与每个中间结果
 *                 都会经由 `half::f16` 舍入一次，从而模拟整个网络在 fp16 下的数值表现
 */

use super::Tensor;
use half::f16;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Precision {
    /// 16位浮点（fp16）
    Half,
    /// 32位浮点（默认）
    #[default]
    Single,
}

impl Precision {
    pub const fn from_use_fp16(use_fp16: bool) -> Self {
        if use_fp16 { Self::Half } else { Self::Single }
    }

    /// 把单个数舍入到该精度可表示的值
    pub fn round(self, x: f32) -> f32 {
        match self {
            Self::Half => f16::from_f32(x).to_f32(),
            Self::Single => x,
        }
    }
}

impl Tensor {
    /// 按给定精度舍入所有元素；`Single`时原样返回
    pub fn quantize(self, precision: Precision) -> Self {
        match precision {
            Precision::Single => self,
            Precision::Half => self.map(|x| precision.round(x)),
        }
    }
}
