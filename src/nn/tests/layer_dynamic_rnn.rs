use crate::nn::layer::{GruCell, bidirectional_dynamic_rnn, dynamic_rnn, reverse_sequence};
use crate::nn::{ForwardContext, Graph, GraphError, ParamStore, RecurrentCell, Var};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn column_inputs(graph: &Graph, columns: &[[f32; 2]]) -> Vec<Var> {
    columns
        .iter()
        .map(|col| graph.input(&Tensor::new(col, &[2, 1])))
        .collect()
}

fn setup() -> Result<(ParamStore, GruCell), GraphError> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut store = ParamStore::default();
    let cell = GruCell::new(&mut store, &mut rng, "rnn", 1, 3)?;
    Ok((store, cell))
}

#[test]
fn test_reverse_sequence_within_lengths() -> Result<(), GraphError> {
    let graph = Graph::new();
    let inputs = column_inputs(&graph, &[[1.0, 10.0], [2.0, 20.0], [3.0, 30.0]]);
    let reversed = reverse_sequence(&inputs, &[3, 2])?;

    let values: Vec<Vec<f32>> = reversed
        .iter()
        .map(|v| v.value().map(|t| t.to_vec()))
        .collect::<Result<_, _>>()?;
    // 样本0整体翻转；样本1只翻转前2步，填充位置不动
    assert_eq!(values, vec![vec![3.0, 20.0], vec![2.0, 10.0], vec![1.0, 30.0]]);

    // 翻转两次还原
    let restored = reverse_sequence(&reversed, &[3, 2])?;
    for (a, b) in restored.iter().zip(&inputs) {
        assert_eq!(a.value()?, b.value()?);
    }
    Ok(())
}

#[test]
fn test_reverse_sequence_rejects_bad_lengths() {
    let graph = Graph::new();
    let inputs = column_inputs(&graph, &[[1.0, 10.0], [2.0, 20.0]]);
    assert!(reverse_sequence(&inputs, &[3, 1]).is_err());
    assert!(reverse_sequence(&inputs, &[1]).is_err());
    assert!(reverse_sequence(&[], &[]).is_err());
}

#[test]
fn test_dynamic_rnn_masks_finished_examples() -> Result<(), GraphError> {
    let (store, cell) = setup()?;
    let ctx = ForwardContext::new(Graph::new(), &store);
    let inputs = column_inputs(ctx.graph(), &[[0.5, 0.5], [-1.0, 7.0], [2.0, 9.0]]);
    let init = cell.zero_state(&ctx, 2);
    let out = dynamic_rnn(&ctx, &cell, &inputs, &[3, 1], init)?;

    assert_eq!(out.outputs.len(), 3);
    assert_eq!(out.final_state.len(), 1);

    // 样本1只有1步：其最终状态等于第0步的输出，之后的输出为0
    let first = out.outputs[0].value()?.row(1);
    assert_eq!(out.final_state[0].value()?.row(1), first);
    for t in 1..3 {
        assert!(out.outputs[t].value()?.row(1).iter().all(|&v| v == 0.0));
    }
    // 样本0一直有效：最终状态等于最后一步的输出
    assert_eq!(
        out.final_state[0].value()?.row(0),
        out.outputs[2].value()?.row(0)
    );
    Ok(())
}

#[test]
fn test_dynamic_rnn_padding_is_ignored() -> Result<(), GraphError> {
    let (store, cell) = setup()?;

    // 同一批数据，只改填充位置的值，结果不变
    let run = |pad: f32| -> Result<Vec<f32>, GraphError> {
        let ctx = ForwardContext::new(Graph::new(), &store);
        let inputs = column_inputs(ctx.graph(), &[[0.5, 0.3], [-1.0, pad], [2.0, pad]]);
        let init = cell.zero_state(&ctx, 2);
        let out = dynamic_rnn(&ctx, &cell, &inputs, &[3, 1], init)?;
        out.final_state[0].value().map(|t| t.to_vec())
    };
    assert_eq!(run(0.0)?, run(100.0)?);
    Ok(())
}

#[test]
fn test_dynamic_rnn_all_finished_step() -> Result<(), GraphError> {
    let (store, cell) = setup()?;
    let ctx = ForwardContext::new(Graph::new(), &store);
    let inputs = column_inputs(ctx.graph(), &[[0.5, 0.5], [1.0, 1.0]]);
    let init = cell.zero_state(&ctx, 2);
    let out = dynamic_rnn(&ctx, &cell, &inputs, &[1, 1], init)?;

    assert_eq!(out.outputs[1].value()?, Tensor::zeros(&[2, 3]));
    assert_eq!(out.final_state[0].value()?, out.outputs[0].value()?);
    Ok(())
}

#[test]
fn test_dynamic_rnn_checks_state_layers() -> Result<(), GraphError> {
    let (store, cell) = setup()?;
    let ctx = ForwardContext::new(Graph::new(), &store);
    let inputs = column_inputs(ctx.graph(), &[[0.5, 0.5]]);
    assert!(dynamic_rnn(&ctx, &cell, &inputs, &[1, 1], Vec::new()).is_err());
    let init = cell.zero_state(&ctx, 2);
    assert!(dynamic_rnn(&ctx, &cell, &inputs, &[1], init).is_err());
    Ok(())
}

#[test]
fn test_bidirectional_backward_branch_sees_reversed_input() -> Result<(), GraphError> {
    let (store, cell) = setup()?;
    let ctx = ForwardContext::new(Graph::new(), &store);
    let inputs = column_inputs(ctx.graph(), &[[1.0, 4.0], [2.0, 5.0], [3.0, 0.0]]);
    let lengths = [3, 2];

    let bi = bidirectional_dynamic_rnn(
        &ctx,
        &cell,
        &cell,
        &inputs,
        &lengths,
        cell.zero_state(&ctx, 2),
        cell.zero_state(&ctx, 2),
    )?;
    assert_eq!(bi.fw_outputs.len(), 3);
    assert_eq!(bi.bw_outputs.len(), 3);

    // 前向与反向共用同一单元时，反向分支在最后一个有效位置的输出
    // 等于前向单元只读该位置输入一步的结果
    let single = column_inputs(ctx.graph(), &[[3.0, 5.0]]);
    let one = dynamic_rnn(&ctx, &cell, &single, &[1, 1], cell.zero_state(&ctx, 2))?;
    let expected = one.outputs[0].value()?;
    assert_abs_diff_eq!(bi.bw_outputs[2].value()?[[0, 0]], expected[[0, 0]], epsilon = 1e-6);
    assert_abs_diff_eq!(bi.bw_outputs[1].value()?[[1, 0]], expected[[1, 0]], epsilon = 1e-6);
    // 填充位置仍为0
    assert!(bi.bw_outputs[2].value()?.row(1).iter().all(|&v| v == 0.0));
    Ok(())
}
