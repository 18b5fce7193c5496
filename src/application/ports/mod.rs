//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_cache;
mod tts_engine;

pub use audio_cache::{
    checked_voice_id, content_hash_key, dedup_key, AudioCachePort, CacheEntry, CacheError,
    CacheStats, KeyStrategy, Producer, ResolvedArtifact,
};
pub use tts_engine::{SynthesisRequest, TtsEnginePort, TtsError};
