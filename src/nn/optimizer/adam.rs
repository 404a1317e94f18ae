/*
 * @Author       : 老董
 * @Date         : 2025-07-24 16:30:00
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : Adam优化器实现
 */

use super::base::{Gradients, Optimizer, OptimizerSnapshot};
use crate::nn::GraphError;
use crate::nn::param_store::ParamStore;
use crate::tensor::Tensor;
use std::collections::{BTreeMap, HashMap};

const SLOT_M: &str = "m";
const SLOT_V: &str = "v";

/// Adam优化器，矩估计按参数全名保存
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    /// 一阶矩估计
    m: HashMap<String, Tensor>,
    /// 二阶矩估计
    v: HashMap<String, Tensor>,
    /// 时间步
    t: usize,
}

impl Adam {
    pub fn new(learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            m: HashMap::new(),
            v: HashMap::new(),
            t: 0,
        }
    }

    /// 使用默认参数创建Adam优化器（β1=0.9, β2=0.999, ε=1e-8）
    pub fn new_default(learning_rate: f32) -> Self {
        Self::new(learning_rate, 0.9, 0.999, 1e-8)
    }

    /// 已执行的更新次数
    pub const fn timestep(&self) -> usize {
        self.t
    }

    /// 先校验所有梯度都对应已有参数且形状一致
    fn check_gradients(store: &ParamStore, grads: &Gradients) -> Result<(), GraphError> {
        for (key, grad) in grads {
            let param = store
                .get(key)
                .ok_or_else(|| GraphError::ParameterNotFound(key.clone()))?;
            if param.shape() != grad.shape() {
                return Err(GraphError::ShapeMismatch {
                    expected: param.shape().to_vec(),
                    got: grad.shape().to_vec(),
                    message: format!("参数`{key}`的梯度形状与参数不符"),
                });
            }
        }
        Ok(())
    }

    fn check_slot(
        store: &ParamStore,
        slot: &str,
        moments: &BTreeMap<String, Tensor>,
    ) -> Result<(), GraphError> {
        for (key, moment) in moments {
            let param = store
                .get(key)
                .ok_or_else(|| GraphError::ParameterNotFound(key.clone()))?;
            if param.shape() != moment.shape() {
                return Err(GraphError::ShapeMismatch {
                    expected: param.shape().to_vec(),
                    got: moment.shape().to_vec(),
                    message: format!("参数`{key}`的矩估计`{slot}`形状与参数不符"),
                });
            }
        }
        Ok(())
    }
}

impl Optimizer for Adam {
    fn step(&mut self, store: &mut ParamStore, grads: &Gradients) -> Result<(), GraphError> {
        Self::check_gradients(store, grads)?;
        self.t += 1;

        let bias_correction1 = 1.0 - self.beta1.powi(self.t as i32);
        let bias_correction2 = 1.0 - self.beta2.powi(self.t as i32);

        for (key, gradient) in grads {
            // m = β1 * m + (1 - β1) * g
            let m = self
                .m
                .entry(key.clone())
                .or_insert_with(|| Tensor::zeros(gradient.shape()));
            *m *= self.beta1;
            *m += &(gradient * (1.0 - self.beta1));

            // v = β2 * v + (1 - β2) * g²
            let v = self
                .v
                .entry(key.clone())
                .or_insert_with(|| Tensor::zeros(gradient.shape()));
            *v *= self.beta2;
            *v += &(&(gradient * gradient) * (1.0 - self.beta2));

            // θ = θ - α * m̂ / (sqrt(v̂) + ε)
            let m_hat = &*m / bias_correction1;
            let v_hat = &*v / bias_correction2;
            let update = &(&m_hat / &(&v_hat.sqrt() + self.epsilon)) * self.learning_rate;

            let current = store
                .get(key)
                .ok_or_else(|| GraphError::ParameterNotFound(key.clone()))?;
            let new_value = current - &update;
            store.set(key, new_value)?;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.m.clear();
        self.v.clear();
        self.t = 0;
    }

    fn snapshot(&self) -> OptimizerSnapshot {
        let to_sorted = |moments: &HashMap<String, Tensor>| {
            moments
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<BTreeMap<_, _>>()
        };
        let mut slots = BTreeMap::new();
        slots.insert(SLOT_M.to_string(), to_sorted(&self.m));
        slots.insert(SLOT_V.to_string(), to_sorted(&self.v));
        OptimizerSnapshot {
            timestep: self.t as u64,
            slots,
        }
    }

    fn load_snapshot(&mut self, mut snapshot: OptimizerSnapshot, store: &ParamStore) -> Result<(), GraphError> {
        if let Some(unknown) = snapshot.slots.keys().find(|slot| *slot != SLOT_M && *slot != SLOT_V) {
            return Err(GraphError::InvalidOperation(format!(
                "Adam没有名为`{unknown}`的状态槽"
            )));
        }
        let m = snapshot.slots.remove(SLOT_M).unwrap_or_default();
        let v = snapshot.slots.remove(SLOT_V).unwrap_or_default();
        Self::check_slot(store, SLOT_M, &m)?;
        Self::check_slot(store, SLOT_V, &v)?;
        let t = usize::try_from(snapshot.timestep).map_err(|_| {
            GraphError::InvalidOperation(format!("Adam时间步{}超出范围", snapshot.timestep))
        })?;

        self.m = m.into_iter().collect();
        self.v = v.into_iter().collect();
        self.t = t;
        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.learning_rate = lr;
    }
}
