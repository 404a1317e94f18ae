/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : 按全局范数裁剪梯度
 */

use super::Gradients;

/// 所有梯度拼成一个长向量后的 L2 范数：sqrt(Σ ||g||²)
pub fn global_norm(grads: &Gradients) -> f32 {
    grads.values().map(|g| g.sum_squares()).sum::<f32>().sqrt()
}

/// 全局范数超过`max_norm`时，把每个梯度都乘以`max_norm / norm`，否则不动。
/// 返回裁剪前的全局范数（非有限数时不做缩放，交由调用方处理）。
pub fn clip_by_global_norm(grads: &mut Gradients, max_norm: f32) -> f32 {
    let norm = global_norm(grads);
    if norm.is_finite() && norm > max_norm {
        let factor = max_norm / norm;
        for grad in grads.values_mut() {
            *grad *= factor;
        }
    }
    norm
}
