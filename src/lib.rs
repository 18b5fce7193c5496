//! voxcache - 去重的 TTS 配音缓存
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Voiceover Context: 配音消息、音色与校验规则
//!
//! 应用层 (application/):
//! - Ports: 端口定义（AudioCache, TtsEngine）
//! - Commands: 配音生成、缓存清理
//! - Queries: 缓存统计、条目列表
//!
//! 基础设施层 (infrastructure/):
//! - Persistence: 文件缓存 + fileMap.json 映射
//! - Memory: in-flight 单飞注册表
//! - Adapters: HTTP / Fake TTS Client
//! - Job: 单次 JSON 任务执行

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
