//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（AudioCache、TtsEngine）
//! - commands: CQRS 命令及处理器（配音生成、缓存清理）
//! - queries: CQRS 查询及处理器（缓存统计、条目列表）
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    // Voiceover commands
    GenerateVoiceoverCommand,
    GenerateVoiceoverResponse,
    GeneratedClip,
    // Cache commands
    ClearAllCacheCommand,
    ClearAllCacheResponse,
    ClearCacheByTextsCommand,
    ClearCacheByTextsResponse,
    // Handlers
    handlers::{ClearAllCacheHandler, ClearCacheByTextsHandler, GenerateVoiceoverHandler},
};

pub use error::ApplicationError;

pub use ports::{
    // Audio cache
    checked_voice_id,
    content_hash_key,
    dedup_key,
    AudioCachePort,
    CacheEntry,
    CacheError,
    CacheStats,
    KeyStrategy,
    Producer,
    ResolvedArtifact,
    // TTS engine
    SynthesisRequest,
    TtsEnginePort,
    TtsError,
};

pub use queries::{
    handlers::{GetCacheStatsHandler, ListCacheEntriesHandler},
    GetCacheStatsQuery,
    ListCacheEntriesQuery,
};
