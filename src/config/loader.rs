//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, TtsProvider};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 未显式配置 `tts.api_key` 时读取的环境变量
pub const API_KEY_ENV: &str = "ELEVENLABS_API_KEY";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOXCACHE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOXCACHE_CACHE__DIR=/data/voiceover-cache`
/// - `VOXCACHE_CACHE__KEY_STRATEGY=content_hash`
/// - `VOXCACHE_TTS__BASE_URL=http://tts-proxy:8000`
/// - `VOXCACHE_LOG__JSON=true`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("cache.dir", "data/voiceover-cache")?
        .set_default("cache.map_file", "fileMap.json")?
        .set_default("cache.key_strategy", "registry")?
        .set_default("tts.provider", "elevenlabs")?
        .set_default("tts.base_url", "https://api.elevenlabs.io")?
        .set_default("tts.model_id", "eleven_multilingual_v2")?
        .set_default("tts.output_format", "mp3_44100_128")?
        .set_default("tts.stability", 0.5)?
        .set_default("tts.similarity_boost", 0.5)?
        .set_default("tts.timeout_secs", 120)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: VOXCACHE_TTS__BASE_URL=http://tts-proxy:8000
    builder = builder.add_source(
        Environment::with_prefix("VOXCACHE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let mut app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    apply_api_key_fallback(&mut app_config, std::env::var(API_KEY_ENV).ok());

    validate_config(&app_config)?;

    Ok(app_config)
}

/// `tts.api_key` 为空时使用回退值
fn apply_api_key_fallback(config: &mut AppConfig, fallback: Option<String>) {
    let missing = config
        .tts
        .api_key
        .as_deref()
        .map_or(true, |key| key.trim().is_empty());
    if missing {
        config.tts.api_key = fallback.filter(|key| !key.trim().is_empty());
    }
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.cache.dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Cache directory cannot be empty".to_string(),
        ));
    }

    let map_file = &config.cache.map_file;
    if map_file.is_empty() {
        return Err(ConfigError::ValidationError(
            "Cache map file name cannot be empty".to_string(),
        ));
    }
    if map_file.contains('/') || map_file.contains('\\') {
        return Err(ConfigError::ValidationError(format!(
            "Cache map file must be a plain file name: {}",
            map_file
        )));
    }

    if config.tts.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS base URL cannot be empty".to_string(),
        ));
    }

    if config.tts.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "TTS timeout cannot be 0".to_string(),
        ));
    }

    for (name, value) in [
        ("stability", config.tts.stability),
        ("similarity_boost", config.tts.similarity_boost),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::ValidationError(format!(
                "TTS {} must be within [0, 1], got {}",
                name, value
            )));
        }
    }

    if config.tts.provider == TtsProvider::Elevenlabs && config.tts.api_key.is_none() {
        return Err(ConfigError::ValidationError(format!(
            "TTS API key is required (set tts.api_key or {})",
            API_KEY_ENV
        )));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Cache Directory: {:?}", config.cache.dir);
    tracing::info!("Cache Map File: {}", config.cache.map_file);
    tracing::info!("Cache Key Strategy: {:?}", config.cache.key_strategy);
    tracing::info!("TTS Provider: {:?}", config.tts.provider);
    if config.tts.provider == TtsProvider::Elevenlabs {
        tracing::info!("TTS Base URL: {}", config.tts.base_url);
        tracing::info!("TTS Model: {}", config.tts.model_id);
        tracing::info!("TTS Output Format: {}", config.tts.output_format);
        tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
