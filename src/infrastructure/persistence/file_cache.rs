//! File Audio Cache - 文件系统语音缓存
//!
//! 组合 `FileKeyMap`（持久化映射）与 `InFlightRegistry`（单飞），实现 AudioCachePort。
//!
//! resolve 流程:
//! 1. 计算 dedup_key，查映射得到 artifact_id
//! 2. artifact 文件存在 -> 命中，直接返回
//! 3. 否则经单飞注册表调用 produce 写入目标路径
//! 4. 生成成功后写入映射；失败时删除残留文件

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;

use super::key_map::{FileKeyMap, ARTIFACT_EXTENSION};
use crate::application::ports::{
    checked_voice_id, dedup_key, AudioCachePort, CacheEntry, CacheError, CacheStats, KeyStrategy, Producer,
    ResolvedArtifact,
};
use crate::infrastructure::memory::InFlightRegistry;

/// 文件缓存配置
#[derive(Debug, Clone)]
pub struct FileCacheConfig {
    /// 缓存根目录
    pub dir: PathBuf,
    /// 映射文件名
    pub map_file: String,
    /// artifact id 策略
    pub key_strategy: KeyStrategy,
}

impl Default for FileCacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/voiceover-cache"),
            map_file: "fileMap.json".to_string(),
            key_strategy: KeyStrategy::Registry,
        }
    }
}

impl FileCacheConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    pub fn with_key_strategy(mut self, key_strategy: KeyStrategy) -> Self {
        self.key_strategy = key_strategy;
        self
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    generations: AtomicU64,
}

/// 文件系统语音缓存
pub struct FileAudioCache {
    key_map: Arc<FileKeyMap>,
    in_flight: InFlightRegistry<ResolvedArtifact>,
    key_strategy: KeyStrategy,
    counters: Arc<Counters>,
}

impl FileAudioCache {
    /// 创建缓存实例（不做 I/O，使用前必须调用 `load`）
    pub fn new(config: &FileCacheConfig) -> Self {
        Self {
            key_map: Arc::new(FileKeyMap::new(&config.dir, &config.map_file)),
            in_flight: InFlightRegistry::new(),
            key_strategy: config.key_strategy,
            counters: Arc::new(Counters::default()),
        }
    }

    /// 创建并加载
    pub async fn open(config: &FileCacheConfig) -> Result<Self, CacheError> {
        let cache = Self::new(config);
        cache.load().await?;
        Ok(cache)
    }

    /// 加载映射（创建目录与空映射文件）
    pub async fn load(&self) -> Result<(), CacheError> {
        self.key_map.load().await?;
        tracing::info!(
            dir = %self.key_map.dir().display(),
            key_strategy = ?self.key_strategy,
            "FileAudioCache initialized"
        );
        Ok(())
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn dir(&self) -> &Path {
        self.key_map.dir()
    }

    /// 查找已存在的 artifact，不触发生成
    async fn lookup(
        &self,
        key: &str,
        text: &str,
        voice_id: &str,
    ) -> Result<Option<ResolvedArtifact>, CacheError> {
        if let Some(artifact_id) = self.key_map.get(key) {
            let path = self.key_map.artifact_path(&artifact_id);
            if file_exists(&path).await {
                return Ok(Some(ResolvedArtifact {
                    artifact_id,
                    path,
                    cached: true,
                }));
            }
        }

        // 内容哈希快速路径：文件存在但映射缺失时补写映射
        if let Some(artifact_id) = self.key_strategy.derived_artifact_id(text, Some(voice_id)) {
            let path = self.key_map.artifact_path(&artifact_id);
            if file_exists(&path).await {
                if self.key_map.get(key).as_deref() != Some(artifact_id.as_str()) {
                    self.key_map.set(key, &artifact_id).await?;
                }
                return Ok(Some(ResolvedArtifact {
                    artifact_id,
                    path,
                    cached: true,
                }));
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl AudioCachePort for FileAudioCache {
    async fn resolve(
        &self,
        text: &str,
        voice_id: &str,
        produce: Producer,
    ) -> Result<ResolvedArtifact, CacheError> {
        let key = dedup_key(text, Some(checked_voice_id(voice_id)?));

        if let Some(hit) = self.lookup(&key, text, voice_id).await? {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                dedup_key = %key,
                artifact_id = %hit.artifact_id,
                "Using cached audio"
            );
            return Ok(hit);
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);

        let key_map = self.key_map.clone();
        let counters = self.counters.clone();
        let strategy = self.key_strategy;
        let owned_key = key.clone();
        let text = text.to_string();
        let voice_id = voice_id.to_string();

        self.in_flight
            .resolve_once(&key, move || async move {
                // 上一个任务可能在本次查询之后刚刚完成
                let mapped = key_map.get(&owned_key);
                if let Some(artifact_id) = mapped.clone() {
                    let path = key_map.artifact_path(&artifact_id);
                    if file_exists(&path).await {
                        return Ok(ResolvedArtifact {
                            artifact_id,
                            path,
                            cached: true,
                        });
                    }
                }

                // 映射里已有 id（文件丢失）时沿用，否则分配新的
                let artifact_id = mapped
                    .unwrap_or_else(|| strategy.allocate_artifact_id(&text, Some(&voice_id)));
                let path = key_map.artifact_path(&artifact_id);

                counters.generations.fetch_add(1, Ordering::Relaxed);
                if let Err(e) = produce(path.clone()).await {
                    discard_partial(&path).await;
                    tracing::error!(dedup_key = %owned_key, error = %e, "Audio generation failed");
                    return Err(e);
                }

                if !file_exists(&path).await {
                    return Err(CacheError::StorageError(format!(
                        "generated artifact missing: {}",
                        path.display()
                    )));
                }

                key_map.set(&owned_key, &artifact_id).await?;
                tracing::info!(
                    dedup_key = %owned_key,
                    artifact_id = %artifact_id,
                    "Generated audio cached"
                );

                Ok(ResolvedArtifact {
                    artifact_id,
                    path,
                    cached: false,
                })
            })
            .await
    }

    async fn exists(&self, text: &str, voice_id: &str) -> Result<bool, CacheError> {
        let key = dedup_key(text, Some(checked_voice_id(voice_id)?));
        Ok(self.lookup(&key, text, voice_id).await?.is_some())
    }

    async fn clear_by_texts(
        &self,
        texts: &[String],
        voice_id: &str,
    ) -> Result<Vec<String>, CacheError> {
        let voice_id = checked_voice_id(voice_id)?;
        let keys: Vec<String> = texts
            .iter()
            .map(|text| dedup_key(text, Some(voice_id)))
            .collect();

        let removed = self.key_map.delete_keys(&keys).await?;

        // 按请求顺序返回，重复的文本只返回一次
        let mut cleared = Vec::with_capacity(removed.len());
        for (text, key) in texts.iter().zip(keys.iter()) {
            if removed.contains(key) && !cleared.contains(text) {
                cleared.push(text.clone());
            }
        }

        tracing::info!(
            requested = texts.len(),
            cleared = cleared.len(),
            "Cleared cache for texts"
        );
        Ok(cleared)
    }

    async fn clear_all(&self) -> Result<usize, CacheError> {
        self.key_map.clear_all().await
    }

    async fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
        Ok(self.key_map.entries().await)
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let mut artifact_files = 0usize;
        let mut total_size_bytes = 0u64;

        let dir = self.key_map.dir();
        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| CacheError::StorageError(format!("read {}: {}", dir.display(), e)))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::StorageError(format!("read {}: {}", dir.display(), e)))?
        {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == ARTIFACT_EXTENSION) {
                artifact_files += 1;
                if let Ok(metadata) = entry.metadata().await {
                    total_size_bytes += metadata.len();
                }
            }
        }

        Ok(CacheStats {
            total_entries: self.key_map.len(),
            artifact_files,
            total_size_bytes,
            in_flight: self.in_flight.len(),
            hit_count: self.counters.hits.load(Ordering::Relaxed),
            miss_count: self.counters.misses.load(Ordering::Relaxed),
            generation_count: self.counters.generations.load(Ordering::Relaxed),
        })
    }
}

async fn file_exists(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

/// 删除生成失败留下的残留文件
async fn discard_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => tracing::warn!(path = %path.display(), "Removed partial artifact"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::error!(
            path = %path.display(),
            error = %e,
            "Failed to remove partial artifact"
        ),
    }
}
