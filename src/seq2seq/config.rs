/*
 * @Author       : 老董
 * @Date         : 2026-03-05
 * @Description  : seq2seq 模型的超参数与运行模式
 */

use super::Seq2SeqError;
use super::batch::NUM_SPECIAL_TOKENS;
use crate::nn::optimizer::OptimizerType;
use crate::tensor::Precision;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// 模型的全部超参数。构造后不再改变
///
/// JSON 示例：
/// ```ignore
/// {
///     "hidden_units": 128, "embedding_size": 64,
///     "encoder_max_time_steps": 30, "decoder_max_time_steps": 30,
///     "encoder_depth": 2, "decoder_depth": 2,
///     "encoder_vocab_size": 5000, "decoder_vocab_size": 5000,
///     "dropout_rate": 0.2, "use_fp16": false,
///     "optimizer_type": "adam", "learning_rate": 0.001, "max_gradient_norm": 5.0,
///     "use_bidirectional": true, "use_dropout": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seq2SeqConfig {
    pub hidden_units: usize,
    pub embedding_size: usize,
    pub encoder_max_time_steps: usize,
    pub decoder_max_time_steps: usize,
    pub encoder_depth: usize,
    pub decoder_depth: usize,
    pub encoder_vocab_size: usize,
    pub decoder_vocab_size: usize,
    pub dropout_rate: f32,
    pub use_fp16: bool,
    pub optimizer_type: String,
    pub learning_rate: f32,
    pub max_gradient_norm: f32,
    pub use_bidirectional: bool,
    pub use_dropout: bool,
    /// 参数初始化与 dropout 的随机种子；缺省时取固定值0，保证可复现
    #[serde(default)]
    pub seed: Option<u64>,
    /// 日志 span 的名称
    #[serde(default)]
    pub logger_name: Option<String>,
}

impl Seq2SeqConfig {
    /// 从 JSON 字符串读取并校验；缺少必需的键时报配置错误
    pub fn from_json_str(json: &str) -> Result<Self, Seq2SeqError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Seq2SeqError::Configuration(format!("无法解析配置：{e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件读取并校验
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, Seq2SeqError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Seq2SeqError::Configuration(format!("无法读取配置文件{}：{e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, Seq2SeqError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Seq2SeqError::Configuration(format!("无法序列化配置：{e}")))
    }

    /// 检查各超参数的取值范围
    pub fn validate(&self) -> Result<(), Seq2SeqError> {
        let positive = [
            ("hidden_units", self.hidden_units),
            ("embedding_size", self.embedding_size),
            ("encoder_max_time_steps", self.encoder_max_time_steps),
            ("decoder_max_time_steps", self.decoder_max_time_steps),
            ("encoder_depth", self.encoder_depth),
            ("decoder_depth", self.decoder_depth),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(Seq2SeqError::Configuration(format!("{name}须为正整数")));
            }
        }
        for (name, value) in [
            ("encoder_vocab_size", self.encoder_vocab_size),
            ("decoder_vocab_size", self.decoder_vocab_size),
        ] {
            if value <= NUM_SPECIAL_TOKENS {
                return Err(Seq2SeqError::Configuration(format!(
                    "{name}须大于特殊token的个数{NUM_SPECIAL_TOKENS}，实际为{value}"
                )));
            }
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err(Seq2SeqError::Configuration(format!(
                "dropout_rate须在[0, 1)内，实际为{}",
                self.dropout_rate
            )));
        }
        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            return Err(Seq2SeqError::Configuration(format!(
                "learning_rate须为正数，实际为{}",
                self.learning_rate
            )));
        }
        if self.max_gradient_norm.is_nan() || self.max_gradient_norm <= 0.0 {
            return Err(Seq2SeqError::Configuration(format!(
                "max_gradient_norm须为正数，实际为{}",
                self.max_gradient_norm
            )));
        }
        self.optimizer()?;
        if self.encoder_depth != self.decoder_depth {
            return Err(Seq2SeqError::Configuration(format!(
                "解码器以编码器的最终状态为初始状态，两者层数须一致：encoder_depth={}, decoder_depth={}",
                self.encoder_depth, self.decoder_depth
            )));
        }
        Ok(())
    }

    pub fn optimizer(&self) -> Result<OptimizerType, Seq2SeqError> {
        self.optimizer_type
            .parse()
            .map_err(Seq2SeqError::Configuration)
    }

    pub const fn precision(&self) -> Precision {
        Precision::from_use_fp16(self.use_fp16)
    }

    /// 训练时 dropout 的保留概率；未开启 dropout 时为1
    pub fn train_keep_prob(&self) -> f32 {
        if self.use_dropout {
            1.0 - self.dropout_rate
        } else {
            1.0
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(0)
    }

    pub fn logger_name(&self) -> &str {
        self.logger_name.as_deref().unwrap_or("seq2seq")
    }
}

// ==================== Mode ====================

/// 模型的运行模式：每个模式单独构造一次模型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Inference,
}

impl FromStr for Mode {
    type Err = Seq2SeqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "train" => Ok(Self::Train),
            "inference" => Ok(Self::Inference),
            other => Err(Seq2SeqError::Configuration(format!(
                "模式须为train或inference，实际为`{other}`"
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Train => write!(f, "train"),
            Self::Inference => write!(f, "inference"),
        }
    }
}
