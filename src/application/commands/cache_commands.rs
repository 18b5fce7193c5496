//! Cache Commands - 缓存维护命令

use serde::Serialize;

/// 按文本清除缓存
#[derive(Debug, Clone)]
pub struct ClearCacheByTextsCommand {
    pub voice_id: String,
    pub texts: Vec<String>,
}

/// 按文本清除缓存响应
#[derive(Debug, Clone, Serialize)]
pub struct ClearCacheByTextsResponse {
    pub cleared: Vec<String>,
    /// 请求中不存在于缓存的文本
    pub not_cleared: Vec<String>,
}

impl ClearCacheByTextsResponse {
    pub fn is_partial(&self) -> bool {
        !self.not_cleared.is_empty()
    }
}

/// 清空全部缓存
#[derive(Debug, Clone, Default)]
pub struct ClearAllCacheCommand;

/// 清空全部缓存响应
#[derive(Debug, Clone, Serialize)]
pub struct ClearAllCacheResponse {
    pub removed_files: usize,
}
