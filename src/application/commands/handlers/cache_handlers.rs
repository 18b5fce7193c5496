//! Cache Command Handlers

use std::collections::HashSet;
use std::sync::Arc;

use crate::application::commands::{
    ClearAllCacheCommand, ClearAllCacheResponse, ClearCacheByTextsCommand,
    ClearCacheByTextsResponse,
};
use crate::application::error::ApplicationError;
use crate::application::ports::AudioCachePort;
use crate::domain::voiceover::{validate_texts, VoiceId};

/// ClearCacheByTexts Handler
pub struct ClearCacheByTextsHandler {
    audio_cache: Arc<dyn AudioCachePort>,
}

impl ClearCacheByTextsHandler {
    pub fn new(audio_cache: Arc<dyn AudioCachePort>) -> Self {
        Self { audio_cache }
    }

    pub async fn handle(
        &self,
        cmd: ClearCacheByTextsCommand,
    ) -> Result<ClearCacheByTextsResponse, ApplicationError> {
        validate_texts(&cmd.texts)?;
        let voice_id = VoiceId::new(cmd.voice_id)?;

        let cleared = self
            .audio_cache
            .clear_by_texts(&cmd.texts, voice_id.as_str())
            .await?;

        let cleared_set: HashSet<&str> = cleared.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();
        let not_cleared: Vec<String> = cmd
            .texts
            .iter()
            .filter(|t| !cleared_set.contains(t.as_str()) && seen.insert(t.as_str()))
            .cloned()
            .collect();

        if !not_cleared.is_empty() {
            tracing::warn!(
                voice_id = %voice_id,
                not_cleared = not_cleared.len(),
                "Some texts were not found in cache"
            );
        }
        tracing::info!(voice_id = %voice_id, cleared = cleared.len(), "Cache cleared by texts");

        Ok(ClearCacheByTextsResponse {
            cleared,
            not_cleared,
        })
    }
}

/// ClearAllCache Handler
pub struct ClearAllCacheHandler {
    audio_cache: Arc<dyn AudioCachePort>,
}

impl ClearAllCacheHandler {
    pub fn new(audio_cache: Arc<dyn AudioCachePort>) -> Self {
        Self { audio_cache }
    }

    pub async fn handle(
        &self,
        _cmd: ClearAllCacheCommand,
    ) -> Result<ClearAllCacheResponse, ApplicationError> {
        let removed_files = self.audio_cache.clear_all().await?;
        tracing::info!(removed_files = removed_files, "All cache cleared");
        Ok(ClearAllCacheResponse { removed_files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{CacheError, Producer};
    use crate::infrastructure::persistence::{FileAudioCache, FileCacheConfig};
    use futures_util::FutureExt;
    use tempfile::TempDir;

    const VOICE: &str = "voice_1";

    fn write_fixed() -> Producer {
        Box::new(|path| {
            async move {
                tokio::fs::write(&path, b"audio")
                    .await
                    .map_err(CacheError::storage)
            }
            .boxed()
        })
    }

    async fn populated_cache(texts: &[&str]) -> (TempDir, Arc<dyn AudioCachePort>) {
        let dir = tempfile::tempdir().unwrap();
        let cache: Arc<dyn AudioCachePort> = FileAudioCache::open(&FileCacheConfig::new(dir.path()))
            .await
            .unwrap()
            .arc();
        for text in texts {
            cache.resolve(text, VOICE, write_fixed()).await.unwrap();
        }
        (dir, cache)
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_clear_by_texts_reports_partial() {
        let (_dir, cache) = populated_cache(&["a", "b"]).await;
        let handler = ClearCacheByTextsHandler::new(cache.clone());

        let response = handler
            .handle(ClearCacheByTextsCommand {
                voice_id: VOICE.to_string(),
                texts: texts(&["a", "missing", "b", "missing"]),
            })
            .await
            .unwrap();

        assert_eq!(response.cleared, texts(&["a", "b"]));
        assert_eq!(response.not_cleared, texts(&["missing"]));
        assert!(response.is_partial());
        assert!(!cache.exists("a", VOICE).await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_by_texts_success() {
        let (_dir, cache) = populated_cache(&["a"]).await;
        let handler = ClearCacheByTextsHandler::new(cache);

        let response = handler
            .handle(ClearCacheByTextsCommand {
                voice_id: VOICE.to_string(),
                texts: texts(&["a"]),
            })
            .await
            .unwrap();

        assert!(!response.is_partial());
    }

    #[tokio::test]
    async fn test_clear_by_texts_validation() {
        let (_dir, cache) = populated_cache(&[]).await;
        let handler = ClearCacheByTextsHandler::new(cache);

        let err = handler
            .handle(ClearCacheByTextsCommand {
                voice_id: VOICE.to_string(),
                texts: Vec::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), "invalid_input");

        let err = handler
            .handle(ClearCacheByTextsCommand {
                voice_id: String::new(),
                texts: texts(&["a"]),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), "invalid_input");
    }

    #[tokio::test]
    async fn test_clear_all() {
        let (_dir, cache) = populated_cache(&["a", "b", "c"]).await;
        let handler = ClearAllCacheHandler::new(cache.clone());

        let response = handler.handle(ClearAllCacheCommand).await.unwrap();
        assert_eq!(response.removed_files, 3);
        assert!(cache.entries().await.unwrap().is_empty());
    }
}
