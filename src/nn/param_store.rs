/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : 参数仓库：按“作用域/名称”登记模型的所有可训练参数。
 *
 * 参数只在首次登记时创建并初始化，之后按名称查找；
 * 图（Graph）在每次前向时通过名称把参数绑定进来，优化器按名称写回更新。
 */

use super::GraphError;
use crate::tensor::{Precision, Tensor};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==================== Init 枚举 ====================

/// 参数初始化策略
#[derive(Debug, Clone, PartialEq)]
pub enum Init {
    /// 全零
    Zeros,
    /// 常数初始化
    Constant(f32),
    /// [min, max] 上的均匀分布
    Uniform { min: f32, max: f32 },
    /// Xavier/Glorot 均匀初始化（适用于 Sigmoid/Tanh）：U(-√(6/(fan_in+fan_out)), +…)
    Xavier,
}

impl Init {
    /// 生成初始化后的 Tensor（使用指定的 RNG）
    pub fn generate_with_rng<R: Rng + ?Sized>(&self, shape: &[usize], rng: &mut R) -> Tensor {
        match self {
            Self::Zeros => Tensor::zeros(shape),
            Self::Constant(v) => Tensor::from_elem(*v, shape),
            Self::Uniform { min, max } => Tensor::uniform_with_rng(*min, *max, shape, rng),
            Self::Xavier => {
                let (fan_in, fan_out) = (shape[0], shape.get(1).copied().unwrap_or(1));
                let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
                Tensor::uniform_with_rng(-limit, limit, shape, rng)
            }
        }
    }
}

// ==================== ParamStore ====================

/// 参数仓库：参数全名（`scope/name`）-> 张量，按名称有序
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamStore {
    params: BTreeMap<String, Tensor>,
    precision: Precision,
}

impl ParamStore {
    pub fn new(precision: Precision) -> Self {
        Self {
            params: BTreeMap::new(),
            precision,
        }
    }

    /// 拼出参数全名
    pub fn full_name(scope: &str, name: &str) -> String {
        if scope.is_empty() {
            name.to_string()
        } else {
            format!("{scope}/{name}")
        }
    }

    /// 登记参数：不存在则按`init`创建，已存在则复用（形状须一致）。返回参数全名
    pub fn get_or_create<R: Rng + ?Sized>(
        &mut self,
        scope: &str,
        name: &str,
        shape: &[usize],
        init: &Init,
        rng: &mut R,
    ) -> Result<String, GraphError> {
        let key = Self::full_name(scope, name);
        if let Some(existing) = self.params.get(&key) {
            if existing.shape() != shape {
                return Err(GraphError::ShapeMismatch {
                    expected: existing.shape().to_vec(),
                    got: shape.to_vec(),
                    message: format!("参数`{key}`已以另一形状登记"),
                });
            }
            return Ok(key);
        }
        let value = init.generate_with_rng(shape, rng).quantize(self.precision);
        self.params.insert(key.clone(), value);
        Ok(key)
    }

    pub fn get(&self, key: &str) -> Option<&Tensor> {
        self.params.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// 覆盖已有参数的值（形状须一致），写入前按仓库精度舍入
    pub fn set(&mut self, key: &str, value: Tensor) -> Result<(), GraphError> {
        let precision = self.precision;
        let slot = self
            .params
            .get_mut(key)
            .ok_or_else(|| GraphError::ParameterNotFound(key.to_string()))?;
        if slot.shape() != value.shape() {
            return Err(GraphError::ShapeMismatch {
                expected: slot.shape().to_vec(),
                got: value.shape().to_vec(),
                message: format!("不能用不同形状的值覆盖参数`{key}`"),
            });
        }
        *slot = value.quantize(precision);
        Ok(())
    }

    /// 所有参数名（有序）
    pub fn names(&self) -> Vec<String> {
        self.params.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Tensor)> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// 所有参数的元素总数
    pub fn num_elements(&self) -> usize {
        self.params.values().map(Tensor::size).sum()
    }

    pub const fn precision(&self) -> Precision {
        self.precision
    }
}
