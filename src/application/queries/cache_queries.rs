//! Cache Queries - 缓存查询

/// 获取缓存统计
#[derive(Debug, Clone, Default)]
pub struct GetCacheStatsQuery;

/// 列出缓存条目
#[derive(Debug, Clone, Default)]
pub struct ListCacheEntriesQuery {
    /// 只返回该音色的条目
    pub voice_id: Option<String>,
}
