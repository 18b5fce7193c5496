//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::voiceover::VoiceoverMessage;

// ============================================================================
// 请求
// ============================================================================

/// 任务请求
///
/// 字段缺失时交给领域层校验，以便返回与字段对应的状态码
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum JobRequest {
    /// 生成配音
    Generate {
        #[serde(default, alias = "voiceId")]
        voice_id: String,
        #[serde(default)]
        messages: Vec<VoiceoverMessage>,
        /// 透传给 TTS 请求体
        #[serde(default)]
        request: Map<String, Value>,
    },
    /// 按文本清除缓存
    Clear {
        #[serde(default, alias = "voiceId")]
        voice_id: String,
        #[serde(default)]
        texts: Vec<String>,
    },
    /// 清空全部缓存
    ClearAll,
    /// 缓存统计
    Stats,
    /// 列出缓存条目
    Entries {
        #[serde(default, alias = "voiceId")]
        voice_id: Option<String>,
    },
}

// ============================================================================
// 响应
// ============================================================================

/// 统一任务响应格式
#[derive(Debug, Clone, Serialize)]
pub struct JobResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// 未能清除的文本（仅 partial）
    #[serde(rename = "invalidTexts", skip_serializing_if = "Option::is_none")]
    pub invalid_texts: Option<Vec<String>>,
}

impl JobResponse {
    pub fn success(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
            invalid_texts: None,
        }
    }

    pub fn partial(message: impl Into<String>, invalid_texts: Vec<String>, data: Option<Value>) -> Self {
        Self {
            status: "partial".to_string(),
            message: message.into(),
            data,
            invalid_texts: Some(invalid_texts),
        }
    }

    pub fn error(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: message.into(),
            data: None,
            invalid_texts: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}
