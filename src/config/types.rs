//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::ports::KeyStrategy;
use crate::infrastructure::adapters::HttpTtsClientConfig;
use crate::infrastructure::persistence::FileCacheConfig;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// TTS 引擎配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 缓存根目录
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    /// 映射文件名（位于缓存根目录下）
    #[serde(default = "default_map_file")]
    pub map_file: String,

    /// artifact id 策略
    #[serde(default)]
    pub key_strategy: KeyStrategy,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("data/voiceover-cache")
}

fn default_map_file() -> String {
    "fileMap.json".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            map_file: default_map_file(),
            key_strategy: KeyStrategy::default(),
        }
    }
}

impl CacheConfig {
    pub fn to_file_cache_config(&self) -> FileCacheConfig {
        FileCacheConfig {
            dir: self.dir.clone(),
            map_file: self.map_file.clone(),
            key_strategy: self.key_strategy,
        }
    }
}

/// TTS 提供方
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtsProvider {
    /// ElevenLabs 兼容的 HTTP 服务
    #[default]
    Elevenlabs,
    /// 本地固定输出，不发网络请求
    Fake,
}

/// TTS 引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub provider: TtsProvider,

    /// TTS 服务基础 URL
    #[serde(default = "default_tts_base_url")]
    pub base_url: String,

    /// API Key
    #[serde(default)]
    pub api_key: Option<String>,

    /// 模型 ID
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// 输出格式
    #[serde(default = "default_output_format")]
    pub output_format: String,

    #[serde(default = "default_voice_setting")]
    pub stability: f32,

    #[serde(default = "default_voice_setting")]
    pub similarity_boost: f32,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,
}

fn default_tts_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_output_format() -> String {
    "mp3_44100_128".to_string()
}

fn default_voice_setting() -> f32 {
    0.5
}

fn default_tts_timeout() -> u64 {
    120
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: TtsProvider::default(),
            base_url: default_tts_base_url(),
            api_key: None,
            model_id: default_model_id(),
            output_format: default_output_format(),
            stability: default_voice_setting(),
            similarity_boost: default_voice_setting(),
            timeout_secs: default_tts_timeout(),
        }
    }
}

impl TtsConfig {
    /// 转换为 HTTP 客户端配置
    pub fn to_http_config(&self) -> HttpTtsClientConfig {
        HttpTtsClientConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone().unwrap_or_default(),
            model_id: self.model_id.clone(),
            output_format: self.output_format.clone(),
            stability: self.stability,
            similarity_boost: self.similarity_boost,
            timeout_secs: self.timeout_secs,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache.dir, PathBuf::from("data/voiceover-cache"));
        assert_eq!(config.cache.map_file, "fileMap.json");
        assert_eq!(config.cache.key_strategy, KeyStrategy::Registry);
        assert_eq!(config.tts.provider, TtsProvider::Elevenlabs);
        assert_eq!(config.tts.base_url, "https://api.elevenlabs.io");
        assert_eq!(config.tts.timeout_secs, 120);
        assert!(config.tts.api_key.is_none());
        assert_eq!(config.log.level, "info");
        assert!(!config.log.json);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: AppConfig = serde_json::from_str(
            r#"{"cache": {"key_strategy": "content_hash"}, "tts": {"provider": "fake"}}"#,
        )
        .unwrap();
        assert_eq!(config.cache.key_strategy, KeyStrategy::ContentHash);
        assert_eq!(config.cache.map_file, "fileMap.json");
        assert_eq!(config.tts.provider, TtsProvider::Fake);
        assert_eq!(config.tts.model_id, "eleven_multilingual_v2");
    }

    #[test]
    fn test_http_config_conversion() {
        let mut tts = TtsConfig::default();
        tts.api_key = Some("secret".to_string());
        tts.stability = 0.8;

        let http = tts.to_http_config();
        assert_eq!(http.api_key, "secret");
        assert_eq!(http.stability, 0.8);
        assert_eq!(http.output_format, "mp3_44100_128");
    }
}
