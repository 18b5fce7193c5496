//! TTS Engine Port - TTS 合成引擎抽象
//!
//! 定义语音合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

/// TTS 错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    /// 付费额度耗尽，调用方需要区别处理
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// TTS 合成请求
#[derive(Debug, Clone, Default)]
pub struct SynthesisRequest {
    /// 要合成的文本内容
    pub text: String,
    /// 音色 ID
    pub voice_id: String,
    /// 覆盖默认请求体的字段（浅合并）
    pub overrides: Map<String, Value>,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_id: voice_id.into(),
            overrides: Map::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: Map<String, Value>) -> Self {
        self.overrides = overrides;
        self
    }
}

/// TTS Engine Port
///
/// 外部 TTS 服务的抽象接口
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 合成音频并写入 `target`，返回写入的字节数
    async fn synthesize_to_file(
        &self,
        request: SynthesisRequest,
        target: &Path,
    ) -> Result<u64, TtsError>;

    /// 剩余字符额度，不支持时返回 None
    async fn remaining_credits(&self) -> Result<Option<u64>, TtsError> {
        Ok(None)
    }
}
