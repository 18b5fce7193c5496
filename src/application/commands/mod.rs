//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：配音生成、缓存清理

mod cache_commands;
mod voiceover_commands;

pub mod handlers;

pub use cache_commands::*;
pub use voiceover_commands::*;
