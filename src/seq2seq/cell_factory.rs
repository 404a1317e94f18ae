/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : 循环单元工厂：单个 GRU（可选输出 dropout）及其多层堆叠
 */

use super::{Seq2SeqConfig, Seq2SeqError};
use crate::nn::ParamStore;
use crate::nn::layer::{DropoutWrapper, GruCell, MultiCell, RecurrentCell};
use rand::Rng;

/// 宽度为`hidden_units`的单个 GRU；`use_dropout`时包上输出 dropout，
/// 保留概率在每次调用时由前向上下文给出
pub fn build_single_cell<R: Rng + ?Sized>(
    store: &mut ParamStore,
    rng: &mut R,
    config: &Seq2SeqConfig,
    scope: &str,
    input_size: usize,
) -> Result<Box<dyn RecurrentCell>, Seq2SeqError> {
    let cell = GruCell::new(store, rng, scope, input_size, config.hidden_units)?;
    if config.use_dropout {
        Ok(Box::new(DropoutWrapper::new(Box::new(cell))))
    } else {
        Ok(Box::new(cell))
    }
}

/// `depth`层堆叠：第0层读`input_size`宽的输入，其余各层读上一层的输出。
/// 第`i`层的参数在`<scope>/cell_<i>`下
pub fn build_multi_cell<R: Rng + ?Sized>(
    store: &mut ParamStore,
    rng: &mut R,
    config: &Seq2SeqConfig,
    scope: &str,
    input_size: usize,
    depth: usize,
) -> Result<MultiCell, Seq2SeqError> {
    if depth == 0 {
        return Err(Seq2SeqError::Configuration(format!(
            "`{scope}`的层数须为正整数"
        )));
    }
    let mut cells = Vec::with_capacity(depth);
    for i in 0..depth {
        let layer_input = if i == 0 { input_size } else { config.hidden_units };
        cells.push(build_single_cell(
            store,
            &mut *rng,
            config,
            &format!("{scope}/cell_{i}"),
            layer_input,
        )?);
    }
    Ok(MultiCell::new(cells)?)
}
