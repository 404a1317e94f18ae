use super::{scenario_batch, test_config};
use crate::nn::{ForwardContext, Graph, Module, ParamStore, Var};
use crate::seq2seq::{Decoder, EOS, Encoder, Seq2SeqConfig, Seq2SeqError};
use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn build(config: &Seq2SeqConfig) -> Result<(ParamStore, Encoder, Decoder), Seq2SeqError> {
    let mut rng = StdRng::seed_from_u64(11);
    let mut store = ParamStore::default();
    let encoder = Encoder::new(&mut store, &mut rng, config)?;
    let decoder = Decoder::new(&mut store, &mut rng, config)?;
    Ok((store, encoder, decoder))
}

#[test]
fn test_decode_train_loss_is_masked_mean() -> Result<(), Seq2SeqError> {
    let config = test_config(true, 2);
    let (store, encoder, decoder) = build(&config)?;
    let batch = scenario_batch()?;
    let ctx = ForwardContext::new(Graph::new_eval(store.precision()), &store);
    let encoded = encoder.encode(&ctx, batch.encoder())?;
    let out = decoder.decode_train(&ctx, encoded.final_state, &batch)?;

    assert_eq!(out.logits.len(), 3);
    assert_eq!(out.logits[0].shape()?, vec![2, 12]);

    // 手算：只在各样本的训练长度（3和2）内累加交叉熵，再除以5
    let targets = batch.decoder_train_targets();
    let lengths = batch.decoder_train_lengths();
    let mut sum = 0.0;
    for (t, logits) in out.logits.iter().enumerate() {
        let log_probs = logits.value()?.log_softmax_rows();
        for b in 0..2 {
            if t < lengths[b] {
                sum -= log_probs[[b, targets[b][t]]];
            }
        }
    }
    assert_abs_diff_eq!(out.loss.item()?, sum / 5.0, epsilon = 1e-5);
    assert_eq!(targets[1][1], EOS);
    Ok(())
}

#[test]
fn test_greedy_steps_run_full_horizon() -> Result<(), Seq2SeqError> {
    let config = test_config(false, 2);
    let (store, encoder, decoder) = build(&config)?;
    let batch = scenario_batch()?;
    let ctx = ForwardContext::new(Graph::new_eval(store.precision()), &store);
    let encoded = encoder.encode(&ctx, batch.encoder())?;

    let mut steps = decoder.greedy_steps(&ctx, encoded.final_state)?;
    assert_eq!(steps.len(), 4);
    let first = steps.next().ok_or_else(|| Seq2SeqError::Configuration("没有第一步".into()))??;
    assert_eq!(steps.len(), 3);
    assert_eq!(first.predictions.len(), 2);
    assert_eq!(first.state.len(), 2);
    for (b, &id) in first.predictions.iter().enumerate() {
        let row = first.probabilities.row(b);
        assert_abs_diff_eq!(row.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        assert_eq!(row[id], first.scores[b]);
        assert!(row.iter().all(|&p| p <= first.scores[b]));
    }
    // 剩下的步数走完后迭代器结束
    assert_eq!(steps.by_ref().count(), 3);
    assert!(steps.next().is_none());
    Ok(())
}

#[test]
fn test_decode_inference_shapes_and_sharing() -> Result<(), Seq2SeqError> {
    let config = test_config(true, 1);
    let (store, encoder, decoder) = build(&config)?;
    let params_before = store.len();
    let batch = scenario_batch()?;
    let graph = Graph::new_eval(store.precision());
    let ctx = ForwardContext::new(graph.clone(), &store);
    let encoded = encoder.encode(&ctx, batch.encoder())?;
    let out = decoder.decode_inference(&ctx, encoded.final_state)?;

    assert_eq!(out.outputs.shape(), &[2, 4, 6]);
    assert_eq!(out.logits.shape(), &[2, 4, 12]);
    assert_eq!(out.probabilities.shape(), &[2, 4, 12]);
    assert_eq!(out.final_state.len(), 1);
    assert_eq!(out.predictions.len(), 2);
    for (row, scores) in out.predictions.iter().zip(&out.scores) {
        assert_eq!(row.len(), 4);
        assert!(row.iter().all(|&id| id < 12));
        assert!(scores.iter().all(|&s| (0.0..=1.0).contains(&s)));
    }

    // 4步共用同一份投影参数：仓库没有新增参数，图里的投影权重也只绑定了一次
    assert_eq!(store.len(), params_before);
    let kernel = graph.parameter(&store, "decoder/decoder_logits/kernel")?;
    let again = graph.parameter(&store, "decoder/decoder_logits/kernel")?;
    assert_eq!(kernel.node_id(), again.node_id());
    let names = decoder.parameter_names();
    assert_eq!(names.iter().filter(|n| n.starts_with("decoder/decoder_logits")).count(), 2);
    Ok(())
}

#[test]
fn test_initial_state_layout_is_checked() -> Result<(), Seq2SeqError> {
    let config = test_config(false, 2);
    let (store, _, decoder) = build(&config)?;
    assert_eq!(decoder.num_layers(), 2);
    assert!(decoder.check_state_layout(2, 6).is_ok());
    assert!(matches!(decoder.check_state_layout(1, 6), Err(Seq2SeqError::Configuration(_))));
    assert!(matches!(decoder.check_state_layout(2, 8), Err(Seq2SeqError::Configuration(_))));

    // 运行时给出宽度不对的状态同样是配置错误
    let ctx = ForwardContext::new(Graph::new_eval(store.precision()), &store);
    let wrong: Vec<Var> = (0..2).map(|_| ctx.graph().zeros(&[2, 5])).collect();
    let batch = scenario_batch()?;
    assert!(matches!(
        decoder.decode_train(&ctx, wrong.clone(), &batch),
        Err(Seq2SeqError::Configuration(_))
    ));
    assert!(matches!(decoder.greedy_steps(&ctx, wrong), Err(Seq2SeqError::Configuration(_))));
    Ok(())
}

#[test]
fn test_decoder_first_layer_reads_embeddings() -> Result<(), Seq2SeqError> {
    let mut config = test_config(false, 2);
    config.embedding_size = 3;
    let (store, _, decoder) = build(&config)?;
    assert_eq!(decoder.embedding().embedding_size(), 3);
    assert_eq!(store.get("decoder/rnn/cell_0/W_iz").map(|t| t.shape().to_vec()), Some(vec![3, 6]));
    assert!(decoder.projection().has_bias());
    Ok(())
}
