//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{CacheError, TtsError};
use crate::domain::voiceover::VoiceoverError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 验证错误
    #[error("{0}")]
    ValidationError(VoiceoverError),

    /// 上游额度耗尽
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl ApplicationError {
    /// 创建额度耗尽错误
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::QuotaExceeded(message.into())
    }

    /// 对外返回的状态码
    pub fn status(&self) -> &'static str {
        match self {
            Self::ValidationError(e) => e.status(),
            Self::QuotaExceeded(_) => "quota_exceeded",
            Self::ExternalServiceError(_) => "invalid_request",
            Self::StorageError(_) => "error",
        }
    }
}

impl From<VoiceoverError> for ApplicationError {
    fn from(err: VoiceoverError) -> Self {
        Self::ValidationError(err)
    }
}

impl From<CacheError> for ApplicationError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::StorageError(msg) => Self::StorageError(msg),
            CacheError::QuotaExceeded(msg) => Self::QuotaExceeded(msg),
            CacheError::GenerationFailed(msg) => Self::ExternalServiceError(msg),
            CacheError::InvalidVoiceId(id) => {
                Self::ValidationError(VoiceoverError::InvalidVoiceId(id))
            }
        }
    }
}

impl From<TtsError> for ApplicationError {
    fn from(err: TtsError) -> Self {
        match err {
            TtsError::QuotaExceeded(msg) => Self::QuotaExceeded(msg),
            other => Self::ExternalServiceError(other.to_string()),
        }
    }
}
