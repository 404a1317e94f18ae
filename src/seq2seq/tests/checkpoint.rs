use super::{scenario_batch, test_config};
use crate::seq2seq::{Checkpoint, Mode, Seq2SeqError, Seq2SeqModel};
use approx::assert_abs_diff_eq;
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("only_seq2seq_{name}_{}.ckpt", std::process::id()))
}

#[test]
fn test_save_restore_round_trip() -> Result<(), Seq2SeqError> {
    let batch = scenario_batch()?;
    let mut trained = Seq2SeqModel::new(test_config(true, 2), Mode::Train)?;
    trained.train(&batch)?;
    trained.train(&batch)?;
    trained.increment_epoch();
    let path = temp_path("round_trip");
    let written = trained.save(&path, None, None)?;
    assert_eq!(written, path);

    let mut config = test_config(true, 2);
    config.seed = Some(1234);
    let mut fresh = Seq2SeqModel::new(config, Mode::Train)?;
    assert_ne!(fresh.eval(&batch)?, trained.eval(&batch)?);

    fresh.restore(&path, None)?;
    let _ = std::fs::remove_file(&path);
    assert_eq!(fresh.eval(&batch)?, trained.eval(&batch)?);
    assert_eq!(fresh.global_step(), 2);
    assert_eq!(fresh.global_epoch_step(), 1);
    Ok(())
}

#[test]
fn test_restore_into_inference_model() -> Result<(), Seq2SeqError> {
    let batch = scenario_batch()?;
    let mut trained = Seq2SeqModel::new(test_config(false, 2), Mode::Train)?;
    trained.train(&batch)?;
    let path = trained.save(temp_path("inference"), None, Some(7))?;

    let mut inference = Seq2SeqModel::new(test_config(false, 2), Mode::Inference)?;
    inference.restore(&path, None)?;
    let _ = std::fs::remove_file(&path);
    assert_eq!(
        inference.inference(batch.encoder())?,
        trained.inference(batch.encoder())?
    );
    Ok(())
}

#[test]
fn test_step_suffix() {
    let path = PathBuf::from("/tmp/model.ckpt");
    assert_eq!(Checkpoint::resolve_path(&path, None), path);
    assert_eq!(
        Checkpoint::resolve_path(&path, Some(15)),
        PathBuf::from("/tmp/model.ckpt-15")
    );
}

#[test]
fn test_restore_shape_mismatch_fails_without_changes() -> Result<(), Seq2SeqError> {
    let small = Seq2SeqModel::new(test_config(false, 1), Mode::Train)?;
    let path = temp_path("mismatch");
    small.save(&path, None, None)?;

    let mut config = test_config(false, 1);
    config.hidden_units = 8;
    let mut larger = Seq2SeqModel::new(config, Mode::Train)?;
    let before: Vec<_> = larger.param_store().iter().map(|(_, v)| v.clone()).collect();
    let result = larger.restore(&path, None);
    let _ = std::fs::remove_file(&path);

    assert!(matches!(result, Err(Seq2SeqError::Storage(ref msg)) if msg.contains("形状")));
    let after: Vec<_> = larger.param_store().iter().map(|(_, v)| v.clone()).collect();
    assert_eq!(before, after);
    Ok(())
}

#[test]
fn test_partial_save_and_restore() -> Result<(), Seq2SeqError> {
    let batch = scenario_batch()?;
    let mut source = Seq2SeqModel::new(test_config(false, 1), Mode::Train)?;
    source.train(&batch)?;
    let embedding = vec!["encoder/embedding".to_string()];
    let path = temp_path("partial");
    source.save(&path, Some(embedding.as_slice()), None)?;

    let mut target = Seq2SeqModel::new(test_config(false, 1), Mode::Train)?;
    // 检查点里没有的参数不能恢复
    assert!(matches!(target.restore(&path, None), Err(Seq2SeqError::Storage(_))));

    target.restore(&path, Some(embedding.as_slice()))?;
    let _ = std::fs::remove_file(&path);
    assert_eq!(target.parameter("encoder/embedding"), source.parameter("encoder/embedding"));
    assert_ne!(
        target.parameter("decoder/embedding"),
        source.parameter("decoder/embedding")
    );
    // 只恢复部分参数时计数器不变
    assert_eq!(target.global_step(), 0);

    // 保存不存在的参数
    let unknown = vec!["encoder/nothing".to_string()];
    assert!(matches!(source.save(&path, Some(unknown.as_slice()), None), Err(Seq2SeqError::Storage(_))));
    Ok(())
}

#[test]
fn test_restore_rejects_foreign_files() -> Result<(), Seq2SeqError> {
    let mut model = Seq2SeqModel::new(test_config(false, 1), Mode::Train)?;
    let path = temp_path("foreign");
    std::fs::write(&path, b"not a checkpoint").map_err(|e| Seq2SeqError::Storage(e.to_string()))?;
    let result = model.restore(&path, None);
    let _ = std::fs::remove_file(&path);
    assert!(matches!(result, Err(Seq2SeqError::Storage(_))));

    assert!(matches!(
        model.restore(temp_path("missing"), None),
        Err(Seq2SeqError::Storage(_))
    ));
    Ok(())
}

#[test]
fn test_resumed_training_matches_uninterrupted() -> Result<(), Seq2SeqError> {
    let batch = scenario_batch()?;
    let mut config = test_config(true, 2);
    config.use_dropout = false;

    let mut uninterrupted = Seq2SeqModel::new(config.clone(), Mode::Train)?;
    for _ in 0..3 {
        uninterrupted.train(&batch)?;
    }
    let path = temp_path("resume");
    uninterrupted.save(&path, None, None)?;

    let mut other = config;
    other.seed = Some(99);
    let mut resumed = Seq2SeqModel::new(other, Mode::Train)?;
    resumed.restore(&path, None)?;
    let _ = std::fs::remove_file(&path);
    assert_eq!(resumed.eval(&batch)?, uninterrupted.eval(&batch)?);

    for _ in 0..2 {
        let a = uninterrupted.train(&batch)?;
        let b = resumed.train(&batch)?;
        assert_eq!(a.global_step, b.global_step);
        assert_abs_diff_eq!(a.loss, b.loss, epsilon = 1e-6);
    }
    assert_abs_diff_eq!(resumed.eval(&batch)?, uninterrupted.eval(&batch)?, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_partial_checkpoint_carries_no_optimizer_state() -> Result<(), Seq2SeqError> {
    let batch = scenario_batch()?;
    let mut model = Seq2SeqModel::new(test_config(false, 1), Mode::Train)?;
    model.train(&batch)?;

    let full = model.save(temp_path("full_state"), None, None)?;
    let embedding = vec!["encoder/embedding".to_string()];
    let partial = model.save(temp_path("partial_state"), Some(embedding.as_slice()), None)?;
    let full_ckpt = Checkpoint::read(&full)?;
    let partial_ckpt = Checkpoint::read(&partial)?;
    let _ = std::fs::remove_file(&full);
    let _ = std::fs::remove_file(&partial);

    let snapshot = full_ckpt
        .optimizer
        .ok_or_else(|| Seq2SeqError::Storage("缺少优化器状态".to_string()))?;
    assert_eq!(snapshot.timestep, 1);
    let names = model.parameter_names();
    assert!(!snapshot.slots["m"].is_empty());
    assert!(snapshot.slots["v"].keys().all(|key| names.contains(key)));
    assert!(partial_ckpt.optimizer.is_none());

    // 推理模式没有优化器
    let inference = Seq2SeqModel::new(test_config(false, 1), Mode::Inference)?;
    let path = inference.save(temp_path("inference_state"), None, None)?;
    let ckpt = Checkpoint::read(&path)?;
    let _ = std::fs::remove_file(&path);
    assert!(ckpt.optimizer.is_none());
    Ok(())
}
