/*
 * @Author       : 老董
 * @Date         : 2026-01-09
 * @LastEditors  : 老董
 * @LastEditTime : 2026-03-04
 * @Description  : Module trait 定义
 */

/// 模块 trait
///
/// # 设计原则
/// - `forward()` **不是** trait 方法（签名各异）
/// - `new()` **不是** trait 方法（参数各异）
/// - 参数值放在`ParamStore`中，模块只记住自己参数的全名
///
/// # 使用示例
///
/// ```ignore
/// struct Projection {
///     fc1: Linear,
///     fc2: Linear,
/// }
///
/// impl Module for Projection {
///     fn parameter_names(&self) -> Vec<String> {
///         [self.fc1.parameter_names(), self.fc2.parameter_names()].concat()
///     }
/// }
/// ```
pub trait Module {
    /// 获取所有可训练参数的全名
    ///
    /// 这是 Module trait 的唯一必须实现的方法。
    /// 用于：
    /// - 保存/恢复部分参数
    /// - 统计参数数量
    fn parameter_names(&self) -> Vec<String>;

    /// 获取参数数量
    fn num_params(&self) -> usize {
        self.parameter_names().len()
    }
}
