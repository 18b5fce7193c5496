//! Voiceover Commands - 配音相关命令

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::domain::voiceover::VoiceoverMessage;

/// 生成配音命令
#[derive(Debug, Clone)]
pub struct GenerateVoiceoverCommand {
    pub voice_id: String,
    pub messages: Vec<VoiceoverMessage>,
    /// 透传给 TTS 请求体的字段
    pub request_overrides: Map<String, Value>,
}

/// 单条配音结果
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedClip {
    pub name: String,
    pub text: String,
    pub path: PathBuf,
    pub cached: bool,
}

/// 生成配音响应
#[derive(Debug, Clone, Serialize)]
pub struct GenerateVoiceoverResponse {
    pub clips: Vec<GeneratedClip>,
    /// 因缺少 name/text 被跳过的消息数
    pub skipped: usize,
    pub remaining_credits: Option<u64>,
}
