use super::test_config;
use crate::nn::{ForwardContext, Graph, Module, ParamStore, RecurrentCell};
use crate::seq2seq::cell_factory::{build_multi_cell, build_single_cell};
use crate::seq2seq::{Encoder, EncoderBatch, Seq2SeqConfig, Seq2SeqError};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn build_encoder(config: &Seq2SeqConfig) -> Result<(ParamStore, Encoder), Seq2SeqError> {
    let mut rng = StdRng::seed_from_u64(3);
    let mut store = ParamStore::default();
    let encoder = Encoder::new(&mut store, &mut rng, config)?;
    Ok((store, encoder))
}

#[test]
fn test_multi_cell_scopes_and_widths() -> Result<(), Seq2SeqError> {
    let config = test_config(false, 3);
    let mut rng = StdRng::seed_from_u64(1);
    let mut store = ParamStore::default();
    let stack = build_multi_cell(&mut store, &mut rng, &config, "decoder/rnn", 4, 3)?;

    assert_eq!(stack.num_layers(), 3);
    assert_eq!(stack.input_size(), 4);
    assert_eq!(stack.hidden_size(), 6);
    assert_eq!(stack.num_params(), 27);
    assert_eq!(store.get("decoder/rnn/cell_0/W_ir").map(Tensor::shape), Some(&[4, 6][..]));
    assert_eq!(store.get("decoder/rnn/cell_1/W_ir").map(Tensor::shape), Some(&[6, 6][..]));
    assert!(store.contains("decoder/rnn/cell_2/b_n"));
    Ok(())
}

#[test]
fn test_zero_depth_is_configuration_error() {
    let config = test_config(false, 1);
    let mut rng = StdRng::seed_from_u64(1);
    let mut store = ParamStore::default();
    let result = build_multi_cell(&mut store, &mut rng, &config, "encoder/rnn", 6, 0);
    assert!(matches!(result, Err(Seq2SeqError::Configuration(_))));
}

#[test]
fn test_dropout_cell_only_active_below_keep_prob_one() -> Result<(), Seq2SeqError> {
    let config = test_config(false, 1);
    let mut rng = StdRng::seed_from_u64(1);
    let mut store = ParamStore::default();
    let cell = build_single_cell(&mut store, &mut rng, &config, "cell", 6)?;
    let x = Tensor::new(&[0.3; 24], &[4, 6]);

    let run = |ctx: &ForwardContext<'_>| -> Result<Tensor, Seq2SeqError> {
        let input = ctx.graph().input(&x);
        let state = cell.zero_state(ctx, 4);
        Ok(cell.step(ctx, &input, &state)?.0.value()?)
    };

    let plain = run(&ForwardContext::new(Graph::new(), &store))?;
    let mut dropout_rng = StdRng::seed_from_u64(5);
    let same = run(&ForwardContext::new(Graph::new(), &store).with_dropout(1.0, &mut dropout_rng))?;
    assert_eq!(plain, same);

    let dropped = run(&ForwardContext::new(Graph::new(), &store).with_dropout(0.5, &mut dropout_rng))?;
    // 每个元素要么被置0，要么被放大为1/keep_prob倍
    let mut zeros = 0;
    for (d, p) in dropped.to_vec().iter().zip(plain.to_vec()) {
        if *d == 0.0 {
            zeros += 1;
        } else {
            assert_abs_diff_eq!(*d, p * 2.0, epsilon = 1e-5);
        }
    }
    assert!(zeros > 0 && zeros < 24);
    Ok(())
}

#[test]
fn test_final_state_layers() -> Result<(), Seq2SeqError> {
    let batch = EncoderBatch::new(vec![vec![4, 5, 6], vec![4, 5, 0]], vec![3, 2])?;
    for (bidirectional, depth) in [(true, 1), (true, 2), (true, 3), (false, 1), (false, 2)] {
        let config = test_config(bidirectional, depth);
        let (store, encoder) = build_encoder(&config)?;
        assert_eq!(encoder.state_layers(), depth);
        assert_eq!(encoder.is_bidirectional(), bidirectional);

        let ctx = ForwardContext::new(Graph::new_eval(store.precision()), &store);
        let out = encoder.encode(&ctx, &batch)?;
        assert_eq!(out.final_state.len(), depth, "bidirectional={bidirectional}, depth={depth}");
        assert_eq!(out.outputs.len(), 3);
        for layer in &out.final_state {
            assert_eq!(layer.shape()?, vec![2, 6]);
        }
    }
    Ok(())
}

#[test]
fn test_bidirectional_parameter_scopes() -> Result<(), Seq2SeqError> {
    let (store, encoder) = build_encoder(&test_config(true, 3))?;
    let names = encoder.parameter_names();
    assert_eq!(names.len(), store.len());
    for expected in [
        "encoder/embedding",
        "encoder/inputs_embedded_dense/kernel",
        "encoder/bidirectional/fw/W_iz",
        "encoder/bidirectional/bw/W_iz",
        "encoder/bi_outputs_dense/kernel",
        "encoder/upper/cell_1/b_z",
    ] {
        assert!(store.contains(expected), "缺少参数{expected}");
    }
    // 两个投影都没有偏置
    assert!(!store.contains("encoder/inputs_embedded_dense/bias"));
    assert!(!store.contains("encoder/bi_outputs_dense/bias"));
    assert_eq!(store.get("encoder/bi_outputs_dense/kernel").map(Tensor::shape), Some(&[12, 6][..]));

    // depth 为2时上层只有一个单元
    let (store, _) = build_encoder(&test_config(true, 2))?;
    assert!(store.contains("encoder/upper/W_ir"));
    assert!(!store.contains("encoder/upper/cell_0/W_ir"));
    Ok(())
}

#[test]
fn test_padding_does_not_leak() -> Result<(), Seq2SeqError> {
    for bidirectional in [false, true] {
        let (store, encoder) = build_encoder(&test_config(bidirectional, 2))?;
        let ctx = ForwardContext::new(Graph::new_eval(store.precision()), &store);

        let padded = EncoderBatch::new(vec![vec![4, 5, 6, 7], vec![8, 9, 3, 3]], vec![4, 2])?;
        let alone = EncoderBatch::new(vec![vec![8, 9]], vec![2])?;
        let out = encoder.encode(&ctx, &padded)?;
        let short = encoder.encode(&ctx, &alone)?;

        // 第1个样本的最终状态只取决于它的前2个 token
        for (layer, alone_layer) in out.final_state.iter().zip(&short.final_state) {
            let row = layer.value()?.row(1);
            assert_abs_diff_eq!(row.as_slice(), alone_layer.value()?.row(0).as_slice(), epsilon = 1e-5);
        }
        // 填充位置的输出为0
        for t in 2..4 {
            assert!(out.outputs[t].value()?.row(1).iter().all(|&v| v == 0.0));
        }
    }
    Ok(())
}
