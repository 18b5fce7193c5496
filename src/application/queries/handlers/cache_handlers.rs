//! Cache Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{AudioCachePort, CacheEntry, CacheStats};
use crate::application::queries::{GetCacheStatsQuery, ListCacheEntriesQuery};
use crate::domain::voiceover::VoiceId;

/// GetCacheStats Handler
pub struct GetCacheStatsHandler {
    audio_cache: Arc<dyn AudioCachePort>,
}

impl GetCacheStatsHandler {
    pub fn new(audio_cache: Arc<dyn AudioCachePort>) -> Self {
        Self { audio_cache }
    }

    pub async fn handle(&self, _query: GetCacheStatsQuery) -> Result<CacheStats, ApplicationError> {
        Ok(self.audio_cache.stats().await?)
    }
}

/// ListCacheEntries Handler
pub struct ListCacheEntriesHandler {
    audio_cache: Arc<dyn AudioCachePort>,
}

impl ListCacheEntriesHandler {
    pub fn new(audio_cache: Arc<dyn AudioCachePort>) -> Self {
        Self { audio_cache }
    }

    pub async fn handle(
        &self,
        query: ListCacheEntriesQuery,
    ) -> Result<Vec<CacheEntry>, ApplicationError> {
        let voice_id = match query.voice_id.filter(|v| !v.is_empty()) {
            Some(voice_id) => Some(VoiceId::new(voice_id)?),
            None => None,
        };

        let entries = self.audio_cache.entries().await?;

        // voice id 不含 '-'，第一个 '-' 之前就是音色
        let entries = match voice_id {
            Some(voice_id) => entries
                .into_iter()
                .filter(|e| {
                    e.dedup_key.split_once('-').map(|(voice, _)| voice) == Some(voice_id.as_str())
                })
                .collect(),
            None => entries,
        };

        Ok(entries)
    }
}
