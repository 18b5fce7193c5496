//! Voiceover Command Handlers
//!
//! 配音生成：缓存（组合）+ TTS 引擎。缓存层负责去重与持久化，
//! 本 handler 负责校验、额度预检以及把 TTS 调用包装成 producer。

use futures_util::FutureExt;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::application::commands::{
    GenerateVoiceoverCommand, GenerateVoiceoverResponse, GeneratedClip,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AudioCachePort, CacheError, Producer, SynthesisRequest, TtsEnginePort,
};
use crate::domain::voiceover::{requested_characters, validate_messages, VoiceId};

/// GenerateVoiceover Handler
pub struct GenerateVoiceoverHandler {
    audio_cache: Arc<dyn AudioCachePort>,
    tts_engine: Arc<dyn TtsEnginePort>,
}

impl GenerateVoiceoverHandler {
    pub fn new(audio_cache: Arc<dyn AudioCachePort>, tts_engine: Arc<dyn TtsEnginePort>) -> Self {
        Self {
            audio_cache,
            tts_engine,
        }
    }

    pub async fn handle(
        &self,
        cmd: GenerateVoiceoverCommand,
    ) -> Result<GenerateVoiceoverResponse, ApplicationError> {
        let voice_id = VoiceId::new(cmd.voice_id.clone())?;
        validate_messages(&cmd.messages)?;

        let mut skipped = 0usize;
        let mut pending = Vec::with_capacity(cmd.messages.len());
        for message in &cmd.messages {
            match message.parts() {
                Some((name, text)) => pending.push((name.to_string(), text.to_string())),
                None => {
                    skipped += 1;
                    tracing::warn!(
                        msg = ?message,
                        "Skipping message due to missing 'name' or 'text' property"
                    );
                }
            }
        }

        self.check_credits(&voice_id, &pending).await?;

        let mut clips = Vec::with_capacity(pending.len());
        for (name, text) in pending {
            let request = SynthesisRequest::new(text.clone(), voice_id.as_str())
                .with_overrides(cmd.request_overrides.clone());
            let resolved = self
                .audio_cache
                .resolve(&text, voice_id.as_str(), self.producer(request))
                .await?;

            if resolved.cached {
                tracing::info!(name = %name, "Using cached audio");
            } else {
                tracing::info!(name = %name, artifact_id = %resolved.artifact_id, "Generated audio");
            }

            clips.push(GeneratedClip {
                name,
                text,
                path: resolved.path,
                cached: resolved.cached,
            });
        }

        let remaining_credits = match self.tts_engine.remaining_credits().await {
            Ok(credits) => credits,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch remaining credits");
                None
            }
        };
        if let Some(credits) = remaining_credits {
            tracing::info!(remaining_credits = credits, "TTS API credits remaining");
        }

        Ok(GenerateVoiceoverResponse {
            clips,
            skipped,
            remaining_credits,
        })
    }

    /// 额度预检
    ///
    /// 只统计未命中缓存的文本，同一文本只计一次
    async fn check_credits(
        &self,
        voice_id: &VoiceId,
        pending: &[(String, String)],
    ) -> Result<(), ApplicationError> {
        let mut seen = HashSet::new();
        let mut uncached = Vec::new();
        for (_, text) in pending {
            if !seen.insert(text.as_str()) {
                continue;
            }
            if !self.audio_cache.exists(text, voice_id.as_str()).await? {
                uncached.push(text.as_str());
            }
        }

        let requested = requested_characters(uncached);
        if requested == 0 {
            return Ok(());
        }

        if let Some(remaining) = self.tts_engine.remaining_credits().await? {
            if remaining < requested {
                let message = format!(
                    "API Credit Limit reached remaining: {}, requested: {}",
                    remaining, requested
                );
                tracing::warn!(remaining = remaining, requested = requested, "{}", message);
                return Err(ApplicationError::quota_exceeded(message));
            }
        }

        Ok(())
    }

    fn producer(&self, request: SynthesisRequest) -> Producer {
        let tts_engine = self.tts_engine.clone();
        Box::new(move |path: PathBuf| {
            async move {
                tts_engine
                    .synthesize_to_file(request, &path)
                    .await
                    .map(|_| ())
                    .map_err(CacheError::from)
            }
            .boxed()
        })
    }
}
