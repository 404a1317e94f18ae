/*
 * @Author       : 老董
 * @Date         : 2025-07-24 16:00:00
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : 优化器模块：全局范数梯度裁剪 + Adam
 */

mod adam;
mod base;
mod clip;

pub use adam::Adam;
pub use base::{Gradients, Optimizer, OptimizerSnapshot, OptimizerType};
pub use clip::{clip_by_global_norm, global_norm};
