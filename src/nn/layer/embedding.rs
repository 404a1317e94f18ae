/*
 * @Author       : 老董
 * @Date         : 2026-03-04
 * @Description  : Embedding（词嵌入）层：token id -> 向量
 */

use crate::nn::param_store::{Init, ParamStore};
use crate::nn::{ForwardContext, GraphError, Module, Var, VarShapeOps};
use rand::Rng;

/// 词嵌入表`[vocab_size, embedding_size]`，初始值服从`U(-√3, √3)`（方差为1）
#[derive(Debug, Clone)]
pub struct Embedding {
    table: String,
    vocab_size: usize,
    embedding_size: usize,
}

impl Embedding {
    /// 在`scope`下登记名为`embedding`的查找表
    pub fn new<R: Rng + ?Sized>(
        store: &mut ParamStore,
        rng: &mut R,
        scope: &str,
        vocab_size: usize,
        embedding_size: usize,
    ) -> Result<Self, GraphError> {
        let limit = 3f32.sqrt();
        let table = store.get_or_create(
            scope,
            "embedding",
            &[vocab_size, embedding_size],
            &Init::Uniform {
                min: -limit,
                max: limit,
            },
            rng,
        )?;
        Ok(Self {
            table,
            vocab_size,
            embedding_size,
        })
    }

    /// 查表：`ids`为一个时间步上各样本的 token，得到`[ids.len(), embedding_size]`
    pub fn lookup(&self, ctx: &ForwardContext<'_>, ids: &[usize]) -> Result<Var, GraphError> {
        if let Some(&bad) = ids.iter().find(|&&id| id >= self.vocab_size) {
            return Err(GraphError::InvalidOperation(format!(
                "token {bad} 超出词表大小 {}",
                self.vocab_size
            )));
        }
        ctx.param(&self.table)?.gather_rows(ids)
    }

    pub const fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub const fn embedding_size(&self) -> usize {
        self.embedding_size
    }
}

impl Module for Embedding {
    fn parameter_names(&self) -> Vec<String> {
        vec![self.table.clone()]
    }
}
