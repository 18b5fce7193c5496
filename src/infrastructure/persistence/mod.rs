//! Persistence Layer - 数据持久化
//!
//! 文件系统缓存：artifact 文件 + JSON 映射文件

mod file_cache;
mod key_map;

pub use file_cache::{FileAudioCache, FileCacheConfig};
pub use key_map::{FileKeyMap, ARTIFACT_EXTENSION};
