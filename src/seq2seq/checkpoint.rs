/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : 检查点：参数（按全名）与训练计数器的二进制读写
 *
 * 文件格式：
 * - 4 字节魔数`OSSQ`
 * - u32 版本号（小端）
 * - bincode 编码的`Checkpoint`（计数器 + 按名称有序的参数表 + 优化器状态）
 *
 * 只有保存全部参数且模型处于训练模式时才带优化器状态（Adam 的矩估计与时间步）。
 */

use super::Seq2SeqError;
use crate::nn::optimizer::OptimizerSnapshot;
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// 检查点文件魔数
const CHECKPOINT_MAGIC: &[u8; 4] = b"OSSQ";
/// 检查点文件版本
const CHECKPOINT_VERSION: u32 = 2;

/// 一个检查点的全部内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub global_step: u64,
    pub global_epoch_step: u64,
    /// 参数全名 -> 值
    pub params: BTreeMap<String, Tensor>,
    pub optimizer: Option<OptimizerSnapshot>,
}

impl Checkpoint {
    /// 实际写入的路径：给出`global_step`时为`<path>-<step>`
    pub fn resolve_path<P: AsRef<Path>>(path: P, global_step: Option<u64>) -> PathBuf {
        let path = path.as_ref();
        match global_step {
            Some(step) => {
                let mut name = path.as_os_str().to_owned();
                name.push(format!("-{step}"));
                PathBuf::from(name)
            }
            None => path.to_path_buf(),
        }
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), Seq2SeqError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|e| Seq2SeqError::Storage(format!("无法创建目录{}：{e}", dir.display())))?;
        }
        let file = File::create(path)
            .map_err(|e| Seq2SeqError::Storage(format!("无法创建检查点文件{}：{e}", path.display())))?;
        let mut writer = BufWriter::new(file);

        writer
            .write_all(CHECKPOINT_MAGIC)
            .map_err(|e| Seq2SeqError::Storage(format!("写入魔数失败：{e}")))?;
        writer
            .write_all(&CHECKPOINT_VERSION.to_le_bytes())
            .map_err(|e| Seq2SeqError::Storage(format!("写入版本失败：{e}")))?;
        bincode::serialize_into(&mut writer, self)
            .map_err(|e| Seq2SeqError::Storage(format!("写入参数失败：{e}")))?;
        writer
            .flush()
            .map_err(|e| Seq2SeqError::Storage(format!("刷新缓冲区失败：{e}")))?;
        Ok(())
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, Seq2SeqError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Seq2SeqError::Storage(format!("无法打开检查点文件{}：{e}", path.display())))?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader
            .read_exact(&mut magic)
            .map_err(|e| Seq2SeqError::Storage(format!("读取魔数失败：{e}")))?;
        if &magic != CHECKPOINT_MAGIC {
            return Err(Seq2SeqError::Storage(format!(
                "{}不是本 crate 保存的检查点文件",
                path.display()
            )));
        }

        let mut version_bytes = [0u8; 4];
        reader
            .read_exact(&mut version_bytes)
            .map_err(|e| Seq2SeqError::Storage(format!("读取版本失败：{e}")))?;
        let version = u32::from_le_bytes(version_bytes);
        if version != CHECKPOINT_VERSION {
            return Err(Seq2SeqError::Storage(format!(
                "不支持的检查点版本：{version}"
            )));
        }

        bincode::deserialize_from(&mut reader)
            .map_err(|e| Seq2SeqError::Storage(format!("解析参数失败：{e}")))
    }

    /// 取出`names`中每个参数的值，并与`expected`（当前模型的参数）逐一核对形状。
    /// 任何一个缺失或形状不符都报错，不返回部分结果
    pub fn select<'a, I, F>(&self, names: I, expected: F) -> Result<Vec<(String, Tensor)>, Seq2SeqError>
    where
        I: IntoIterator<Item = &'a String>,
        F: Fn(&str) -> Option<Vec<usize>>,
    {
        names
            .into_iter()
            .map(|name| {
                let value = self.params.get(name).ok_or_else(|| {
                    Seq2SeqError::Storage(format!("检查点中没有参数`{name}`"))
                })?;
                let shape = expected(name).ok_or_else(|| {
                    Seq2SeqError::Storage(format!("当前模型没有参数`{name}`"))
                })?;
                if value.shape() != shape.as_slice() {
                    return Err(Seq2SeqError::Storage(format!(
                        "参数`{name}`的形状不符：检查点中为{:?}，当前模型为{shape:?}",
                        value.shape()
                    )));
                }
                Ok((name.clone(), value.clone()))
            })
            .collect()
    }
}
