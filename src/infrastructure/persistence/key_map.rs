//! File Key Map - dedup_key -> artifact_id 持久化映射
//!
//! 映射整体加载到内存，每次修改后整体重写（临时文件 + rename）。
//! 所有写操作由同一把异步锁串行化，避免并发 read-modify-write 丢失更新。

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::application::ports::{CacheEntry, CacheError};

/// artifact 文件扩展名
pub const ARTIFACT_EXTENSION: &str = "mp3";

/// 持久化映射
pub struct FileKeyMap {
    /// 缓存根目录
    dir: PathBuf,
    /// 映射文件路径
    map_path: PathBuf,
    /// 内存映射
    entries: DashMap<String, String>,
    /// 写锁
    write_lock: Mutex<()>,
}

impl FileKeyMap {
    /// 创建映射（不做 I/O，使用前必须调用 `load`）
    pub fn new(dir: impl AsRef<Path>, map_file: &str) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let map_path = dir.join(map_file);
        Self {
            dir,
            map_path,
            entries: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn map_path(&self) -> &Path {
        &self.map_path
    }

    /// artifact 文件路径
    pub fn artifact_path(&self, artifact_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", artifact_id, ARTIFACT_EXTENSION))
    }

    /// 加载映射
    ///
    /// 目录或映射文件不存在时创建；映射文件损坏时备份后重置为空。
    pub async fn load(&self) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().await;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| self.storage_error("create cache dir", &self.dir, e))?;

        let loaded = match fs::read(&self.map_path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, String>>(&bytes) {
                Ok(map) => Some(map),
                Err(e) => {
                    tracing::warn!(
                        path = %self.map_path.display(),
                        error = %e,
                        "Malformed cache map, resetting to empty"
                    );
                    self.backup_corrupt_map().await;
                    None
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(self.storage_error("read cache map", &self.map_path, e)),
        };

        self.entries.clear();
        match loaded {
            Some(map) => {
                for (key, artifact_id) in map {
                    self.entries.insert(key, artifact_id);
                }
            }
            None => self.persist().await?,
        }

        tracing::info!(
            path = %self.map_path.display(),
            entries = self.entries.len(),
            "Cache map loaded"
        );
        Ok(())
    }

    pub fn get(&self, dedup_key: &str) -> Option<String> {
        self.entries.get(dedup_key).map(|v| v.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 写入映射并整体重写文件
    pub async fn set(&self, dedup_key: &str, artifact_id: &str) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().await;

        let previous = self
            .entries
            .insert(dedup_key.to_string(), artifact_id.to_string());

        if let Err(e) = self.persist().await {
            // 回滚，保持内存与磁盘一致
            match previous {
                Some(old) => self.entries.insert(dedup_key.to_string(), old),
                None => self.entries.remove(dedup_key).map(|(_, v)| v),
            };
            return Err(e);
        }

        tracing::debug!(dedup_key = %dedup_key, artifact_id = %artifact_id, "Cache map updated");
        Ok(())
    }

    /// 删除映射及对应 artifact 文件，返回实际删除的 key
    pub async fn delete_keys(&self, dedup_keys: &[String]) -> Result<Vec<String>, CacheError> {
        let _guard = self.write_lock.lock().await;

        let mut seen = HashSet::new();
        let mut removed = Vec::new();
        for key in dedup_keys {
            if !seen.insert(key.as_str()) {
                continue;
            }
            if let Some(entry) = self.entries.remove(key) {
                removed.push(entry);
            }
        }

        if removed.is_empty() {
            return Ok(Vec::new());
        }

        if let Err(e) = self.persist().await {
            for (key, artifact_id) in removed {
                self.entries.insert(key, artifact_id);
            }
            return Err(e);
        }

        let mut removed_keys = Vec::with_capacity(removed.len());
        for (key, artifact_id) in removed {
            let path = self.artifact_path(&artifact_id);
            match fs::remove_file(&path).await {
                Ok(()) => tracing::debug!(path = %path.display(), "Deleted cached file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to delete cached file, leaving orphan"
                ),
            }
            removed_keys.push(key);
        }

        Ok(removed_keys)
    }

    /// 删除目录下除映射文件外的所有文件，并把映射重置为空
    ///
    /// 返回删除的 artifact 文件数
    pub async fn clear_all(&self) -> Result<usize, CacheError> {
        let _guard = self.write_lock.lock().await;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| self.storage_error("create cache dir", &self.dir, e))?;

        let mut deleted = 0usize;
        let mut dir_entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| self.storage_error("read cache dir", &self.dir, e))?;

        while let Some(entry) = dir_entries
            .next_entry()
            .await
            .map_err(|e| self.storage_error("read cache dir", &self.dir, e))?
        {
            let path = entry.path();
            if path == self.map_path {
                continue;
            }
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            // 备份、临时文件也删除，但只统计 artifact
            let is_artifact = path
                .extension()
                .map_or(false, |ext| ext == ARTIFACT_EXTENSION);
            match fs::remove_file(&path).await {
                Ok(()) if is_artifact => deleted += 1,
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(self.storage_error("delete cached file", &path, e)),
            }
        }

        self.entries.clear();
        self.persist().await?;

        tracing::info!(deleted = deleted, "Cache cleared");
        Ok(deleted)
    }

    /// 列出所有条目，按 dedup_key 排序
    pub async fn entries(&self) -> Vec<CacheEntry> {
        let mut result = Vec::with_capacity(self.entries.len());
        for (dedup_key, artifact_id) in self.snapshot() {
            let created_at = fs::metadata(self.artifact_path(&artifact_id))
                .await
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Utc>::from);
            result.push(CacheEntry {
                dedup_key,
                artifact_id,
                created_at,
            });
        }
        result
    }

    fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// 整体重写映射文件，调用方必须持有写锁
    async fn persist(&self) -> Result<(), CacheError> {
        let data = serde_json::to_vec_pretty(&self.snapshot()).map_err(CacheError::storage)?;

        let tmp_path = self.map_path.with_extension("json.tmp");
        fs::write(&tmp_path, &data)
            .await
            .map_err(|e| self.storage_error("write cache map", &tmp_path, e))?;
        fs::rename(&tmp_path, &self.map_path)
            .await
            .map_err(|e| self.storage_error("replace cache map", &self.map_path, e))?;
        Ok(())
    }

    async fn backup_corrupt_map(&self) {
        let backup = self.map_path.with_extension(format!(
            "json.corrupt-{}",
            Utc::now().format("%Y%m%d%H%M%S")
        ));
        if let Err(e) = fs::rename(&self.map_path, &backup).await {
            tracing::warn!(error = %e, "Failed to back up malformed cache map");
        } else {
            tracing::warn!(backup = %backup.display(), "Malformed cache map backed up");
        }
    }

    fn storage_error(&self, action: &str, path: &Path, err: std::io::Error) -> CacheError {
        tracing::error!(path = %path.display(), error = %err, "Failed to {}", action);
        CacheError::StorageError(format!("{} {}: {}", action, path.display(), err))
    }
}
