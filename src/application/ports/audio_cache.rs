//! Audio Cache Port - 语音缓存抽象
//!
//! 定义 TTS 音频缓存的抽象接口，具体实现为文件系统缓存
//! (`infrastructure::persistence::FileAudioCache`)。
//!
//! - 去重 key: `{voice_id}-{text}`
//! - artifact 文件: `<cache_dir>/<artifact_id>.mp3`
//! - 映射文件: `<cache_dir>/fileMap.json` (dedup_key -> artifact_id)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use super::TtsError;
use crate::domain::voiceover::is_valid_voice_id;

/// Audio Cache 错误
///
/// 所有变体只携带字符串，保证 `Clone`，以便同一次生成的结果
/// 可以分发给所有等待者。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Upstream quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Upstream generation failed: {0}")]
    GenerationFailed(String),

    /// voice id 含有会与去重 key 分隔符冲突的字符
    #[error("Invalid voice id: {0}")]
    InvalidVoiceId(String),
}

impl CacheError {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::StorageError(err.to_string())
    }

    /// 是否为上游额度耗尽
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }
}

impl From<TtsError> for CacheError {
    fn from(err: TtsError) -> Self {
        match err {
            TtsError::QuotaExceeded(msg) => Self::QuotaExceeded(msg),
            other => Self::GenerationFailed(other.to_string()),
        }
    }
}

/// 缓存 key 策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// 首次生成时分配随机 UUID，映射文件是唯一来源
    #[default]
    Registry,
    /// md5(voice_id + text)，可以不查映射直接定位文件
    ContentHash,
}

impl KeyStrategy {
    /// 为新的 artifact 分配 id
    pub fn allocate_artifact_id(&self, text: &str, voice_id: Option<&str>) -> String {
        match self {
            Self::Registry => Uuid::new_v4().to_string(),
            Self::ContentHash => content_hash_key(text, voice_id),
        }
    }

    /// 无需查映射即可推导的 artifact id（仅 ContentHash）
    pub fn derived_artifact_id(&self, text: &str, voice_id: Option<&str>) -> Option<String> {
        match self {
            Self::Registry => None,
            Self::ContentHash => Some(content_hash_key(text, voice_id)),
        }
    }
}

/// 生成去重 key
///
/// 格式与既有的 fileMap.json 保持一致: `{voice_id}-{text}`，
/// 没有 voice_id 时直接使用文本。voice_id 必须先经过 `checked_voice_id`。
pub fn dedup_key(text: &str, voice_id: Option<&str>) -> String {
    match voice_id {
        Some(voice_id) => format!("{}-{}", voice_id, text),
        None => text.to_string(),
    }
}

/// 校验 voice id 可以安全地拼进去重 key
pub fn checked_voice_id(voice_id: &str) -> Result<&str, CacheError> {
    if is_valid_voice_id(voice_id) {
        Ok(voice_id)
    } else {
        Err(CacheError::InvalidVoiceId(voice_id.to_string()))
    }
}

/// 生成内容哈希 key
///
/// md5(voice_id \0 text)，分隔符避免 ("a", "bc") 与 ("ab", "c") 冲突
pub fn content_hash_key(text: &str, voice_id: Option<&str>) -> String {
    let mut ctx = md5::Context::new();
    if let Some(voice_id) = voice_id {
        ctx.consume(voice_id.as_bytes());
        ctx.consume([0u8]);
    }
    ctx.consume(text.as_bytes());
    format!("{:x}", ctx.compute())
}

/// 生成器：把音频写入给定路径
///
/// 由调用方提供（通常调用 TTS 引擎），缓存层本身不发起网络请求。
pub type Producer =
    Box<dyn FnOnce(PathBuf) -> BoxFuture<'static, Result<(), CacheError>> + Send + 'static>;

/// resolve 结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub artifact_id: String,
    pub path: PathBuf,
    /// 是否命中已有缓存（未触发生成）
    pub cached: bool,
}

/// 缓存条目
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    pub dedup_key: String,
    pub artifact_id: String,
    /// artifact 文件的修改时间，文件缺失时为 None
    pub created_at: Option<DateTime<Utc>>,
}

/// 缓存统计信息
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub artifact_files: usize,
    pub total_size_bytes: u64,
    pub in_flight: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub generation_count: u64,
}

/// Audio Cache Port
///
/// 保证同一 (text, voice_id) 在进程内至多同时生成一次，
/// 生成成功后才写入映射。
#[async_trait]
pub trait AudioCachePort: Send + Sync {
    /// 获取或生成音频
    ///
    /// 命中缓存时直接返回路径；否则通过 in-flight 注册表调用 `produce`
    async fn resolve(
        &self,
        text: &str,
        voice_id: &str,
        produce: Producer,
    ) -> Result<ResolvedArtifact, CacheError>;

    /// 检查缓存是否存在（不会触发生成）
    async fn exists(&self, text: &str, voice_id: &str) -> Result<bool, CacheError>;

    /// 按文本清除缓存，返回实际被清除的文本
    async fn clear_by_texts(
        &self,
        texts: &[String],
        voice_id: &str,
    ) -> Result<Vec<String>, CacheError>;

    /// 清空全部缓存，返回删除的文件数
    async fn clear_all(&self) -> Result<usize, CacheError>;

    /// 列出所有缓存条目
    async fn entries(&self) -> Result<Vec<CacheEntry>, CacheError>;

    /// 获取缓存统计信息
    async fn stats(&self) -> Result<CacheStats, CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_includes_voice() {
        assert_eq!(dedup_key("hello", Some("voice_a")), "voice_a-hello");
        assert_eq!(dedup_key("hello", None), "hello");
        assert_ne!(
            dedup_key("hello", Some("voice_a")),
            dedup_key("hello", Some("voice_b"))
        );
    }

    #[test]
    fn test_checked_voice_id() {
        assert_eq!(checked_voice_id("JBFqnCBsd6RMkjVDRZzb"), Ok("JBFqnCBsd6RMkjVDRZzb"));
        assert_eq!(
            checked_voice_id("a-b"),
            Err(CacheError::InvalidVoiceId("a-b".to_string()))
        );
        assert!(checked_voice_id("").is_err());
    }

    #[test]
    fn test_dedup_key_accepts_blank_text() {
        assert_eq!(dedup_key("", Some("v")), "v-");
        assert_eq!(dedup_key("   ", None), "   ");
    }

    #[test]
    fn test_content_hash_is_stable_and_distinct() {
        let a = content_hash_key("Round one!", Some("voice"));
        assert_eq!(a, content_hash_key("Round one!", Some("voice")));
        assert_eq!(a.len(), 32);
        assert_ne!(a, content_hash_key("Round two!", Some("voice")));
        assert_ne!(a, content_hash_key("Round one!", Some("other")));
        assert_ne!(
            content_hash_key("bc", Some("a")),
            content_hash_key("c", Some("ab"))
        );
        // 空文本也是合法输入
        assert_eq!(content_hash_key("", None), format!("{:x}", md5::compute(b"")));
    }

    #[test]
    fn test_key_strategy_allocation() {
        let a = KeyStrategy::Registry.allocate_artifact_id("t", Some("v"));
        let b = KeyStrategy::Registry.allocate_artifact_id("t", Some("v"));
        assert_ne!(a, b);
        assert!(KeyStrategy::Registry.derived_artifact_id("t", Some("v")).is_none());

        let hashed = KeyStrategy::ContentHash.allocate_artifact_id("t", Some("v"));
        assert_eq!(
            KeyStrategy::ContentHash.derived_artifact_id("t", Some("v")),
            Some(hashed)
        );
    }

    #[test]
    fn test_quota_error_mapping() {
        let err: CacheError = TtsError::QuotaExceeded("limit".to_string()).into();
        assert!(err.is_quota_exceeded());

        let err: CacheError = TtsError::Timeout.into();
        assert!(matches!(err, CacheError::GenerationFailed(_)));
    }
}
