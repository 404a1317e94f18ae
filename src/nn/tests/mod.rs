mod graph_backward;
mod layer_dynamic_rnn;

use crate::nn::{GraphError, Init, ParamStore};
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// 用给定的值构造参数仓库（参数名不带作用域）
fn store_from(params: &[(&str, Tensor)]) -> Result<ParamStore, GraphError> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut store = ParamStore::default();
    for (name, value) in params {
        store.get_or_create("", name, value.shape(), &Init::Zeros, &mut rng)?;
        store.set(name, value.clone())?;
    }
    Ok(store)
}
