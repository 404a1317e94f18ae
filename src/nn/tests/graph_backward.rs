use super::store_from;
use crate::nn::layer::{GruCell, Linear, bidirectional_dynamic_rnn};
use crate::nn::{
    ForwardContext, Graph, GraphError, ParamStore, RecurrentCell, Var, VarLossOps, VarMatrixOps,
    VarShapeOps,
};
use crate::tensor::{Precision, Tensor};
use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn test_backward_linear_softmax_cross_entropy() -> Result<(), GraphError> {
    // logits = x @ w + b，w、b 全零时 softmax = [0.5, 0.5]
    let store = store_from(&[("w", Tensor::zeros(&[2, 2])), ("b", Tensor::zeros(&[1, 2]))])?;
    let graph = Graph::new();
    let x = graph.input(&Tensor::new(&[1.0, 2.0], &[1, 2]));
    let w = graph.parameter(&store, "w")?;
    let b = graph.parameter(&store, "b")?;
    let loss = x.matmul(&w)?.try_add(&b)?.softmax_cross_entropy(&[0], &[1.0])?;

    let loss_value = graph.backward(&loss)?;
    assert_abs_diff_eq!(loss_value, 2f32.ln(), epsilon = 1e-6);

    // dL/dlogits = softmax - onehot = [-0.5, 0.5]
    let grads = graph.parameter_grads();
    assert_abs_diff_eq!(
        grads["b"],
        Tensor::new(&[-0.5, 0.5], &[1, 2]),
        epsilon = 1e-6
    );
    // dL/dw = xᵀ · dL/dlogits
    assert_abs_diff_eq!(
        grads["w"],
        Tensor::new(&[-0.5, 0.5, -1.0, 1.0], &[2, 2]),
        epsilon = 1e-6
    );
    // 输入节点不需要梯度
    assert_eq!(x.grad()?, None);
    Ok(())
}

#[test]
fn test_backward_accumulates_shared_parameter() -> Result<(), GraphError> {
    let store = store_from(&[("w", Tensor::zeros(&[1, 2]))])?;
    let graph = Graph::new();
    let w1 = graph.parameter(&store, "w")?;
    let w2 = graph.parameter(&store, "w")?;
    let loss = w1.try_add(&w2)?.softmax_cross_entropy(&[0], &[1.0])?;
    graph.backward(&loss)?;

    // 同一参数被用了两次，两路梯度相加
    let grads = graph.parameter_grads();
    assert_eq!(grads.len(), 1);
    assert_abs_diff_eq!(
        grads["w"],
        Tensor::new(&[-1.0, 1.0], &[1, 2]),
        epsilon = 1e-6
    );
    Ok(())
}

#[test]
fn test_backward_through_broadcast_and_concat() -> Result<(), GraphError> {
    let store = store_from(&[
        ("a", Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[2, 2])),
        ("bias", Tensor::new(&[0.5], &[1, 1])),
    ])?;
    let graph = Graph::new();
    let a = graph.parameter(&store, "a")?;
    let bias = graph.parameter(&store, "bias")?;
    // [2, 2] - [1, 1]，再与自身拼接为 [2, 4]
    let shifted = a.try_sub(&bias)?;
    let wide = Var::concat(&[&shifted, &shifted])?;
    let loss = wide.softmax_cross_entropy(&[0, 3], &[1.0, 1.0])?;
    graph.backward(&loss)?;

    let grads = graph.parameter_grads();
    // 对全体 logits 的梯度每行之和为0，经减法传给 bias 后也为0
    assert_abs_diff_eq!(grads["bias"].sum(), 0.0, epsilon = 1e-6);
    assert_eq!(grads["a"].shape(), &[2, 2]);
    Ok(())
}

#[test]
fn test_backward_in_eval_mode_fails() -> Result<(), GraphError> {
    let store = store_from(&[("w", Tensor::zeros(&[1, 2]))])?;
    let graph = Graph::new_eval(Precision::Single);
    let loss = graph
        .parameter(&store, "w")?
        .softmax_cross_entropy(&[1], &[1.0])?;
    assert!(matches!(
        graph.backward(&loss),
        Err(GraphError::InvalidOperation(_))
    ));
    assert!(graph.parameter_grads().is_empty());
    Ok(())
}

#[test]
fn test_backward_requires_scalar_loss() -> Result<(), GraphError> {
    let store = store_from(&[("w", Tensor::zeros(&[2, 2]))])?;
    let graph = Graph::new();
    let w = graph.parameter(&store, "w")?;
    assert!(matches!(
        graph.backward(&w),
        Err(GraphError::InvalidOperation(_))
    ));
    Ok(())
}

// ==================== 数值梯度校验 ====================

struct BiGru {
    fw: GruCell,
    bw: GruCell,
    proj: Linear,
}

const LENGTHS: [usize; 2] = [3, 2];
const TARGETS: [[usize; 2]; 3] = [[1, 0], [3, 2], [2, 1]];

fn bi_gru_loss(ctx: &ForwardContext<'_>, model: &BiGru) -> Result<Var, GraphError> {
    let graph = ctx.graph();
    let inputs: Vec<Var> = (0..3)
        .map(|t| {
            let t = t as f32;
            graph.input(&Tensor::new(&[0.1 * t, -0.3, 0.5, 0.2 * t - 0.1], &[2, 2]))
        })
        .collect();
    let fw_init = model.fw.zero_state(ctx, 2);
    let bw_init = model.bw.zero_state(ctx, 2);
    let bi = bidirectional_dynamic_rnn(ctx, &model.fw, &model.bw, &inputs, &LENGTHS, fw_init, bw_init)?;

    let mut total: Option<Var> = None;
    for t in 0..3 {
        let both = Var::concat(&[&bi.fw_outputs[t], &bi.bw_outputs[t]])?;
        let logits = model.proj.forward(ctx, &both)?;
        let weights: Vec<f32> = LENGTHS.iter().map(|&len| if t < len { 1.0 } else { 0.0 }).collect();
        let step_loss = logits.softmax_cross_entropy(&TARGETS[t], &weights)?;
        total = Some(match total {
            Some(sum) => sum.try_add(&step_loss)?,
            None => step_loss,
        });
    }
    total.ok_or_else(|| GraphError::ComputationError("空序列".to_string()))
}

fn eval_loss(store: &ParamStore, model: &BiGru) -> Result<f32, GraphError> {
    let ctx = ForwardContext::new(Graph::new_eval(Precision::Single), store);
    bi_gru_loss(&ctx, model)?.item()
}

#[test]
fn test_gradients_match_finite_differences() -> Result<(), GraphError> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut store = ParamStore::default();
    let model = BiGru {
        fw: GruCell::new(&mut store, &mut rng, "fw", 2, 3)?,
        bw: GruCell::new(&mut store, &mut rng, "bw", 2, 3)?,
        proj: Linear::new(&mut store, &mut rng, "proj", 6, 4, true)?,
    };

    let graph = Graph::new();
    let ctx = ForwardContext::new(graph.clone(), &store);
    let loss = bi_gru_loss(&ctx, &model)?;
    graph.backward(&loss)?;
    let grads = graph.parameter_grads();
    // 每个参数都收到了梯度
    assert_eq!(grads.len(), store.len());

    let eps = 1e-2;
    for name in store.names() {
        let analytic = &grads[&name];
        let shape = analytic.shape().to_vec();
        for (r, c) in [(0, 0), (shape[0] - 1, shape[1] - 1)] {
            let original = store.get(&name).cloned().ok_or(GraphError::ParameterNotFound(name.clone()))?;

            let mut plus = original.clone();
            plus[[r, c]] += eps;
            let mut store_plus = store.clone();
            store_plus.set(&name, plus)?;

            let mut minus = original.clone();
            minus[[r, c]] -= eps;
            let mut store_minus = store.clone();
            store_minus.set(&name, minus)?;

            let numeric = (eval_loss(&store_plus, &model)? - eval_loss(&store_minus, &model)?) / (2.0 * eps);
            assert_abs_diff_eq!(analytic[[r, c]], numeric, epsilon = 5e-3);
        }
    }
    Ok(())
}
