//! Job Runner
//!
//! 持有所有 Command/Query Handlers，按 action 分发

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::dto::{JobRequest, JobResponse};
use crate::application::{
    // Command handlers
    ClearAllCacheCommand, ClearAllCacheHandler, ClearCacheByTextsCommand,
    ClearCacheByTextsHandler, GenerateVoiceoverCommand, GenerateVoiceoverHandler,
    // Query handlers
    GetCacheStatsHandler, GetCacheStatsQuery, ListCacheEntriesHandler, ListCacheEntriesQuery,
    // Ports
    ApplicationError, AudioCachePort, TtsEnginePort,
};

/// 任务执行器
pub struct JobRunner {
    // ========== Command Handlers ==========
    generate_handler: GenerateVoiceoverHandler,
    clear_by_texts_handler: ClearCacheByTextsHandler,
    clear_all_handler: ClearAllCacheHandler,

    // ========== Query Handlers ==========
    stats_handler: GetCacheStatsHandler,
    entries_handler: ListCacheEntriesHandler,
}

impl JobRunner {
    pub fn new(audio_cache: Arc<dyn AudioCachePort>, tts_engine: Arc<dyn TtsEnginePort>) -> Self {
        Self {
            generate_handler: GenerateVoiceoverHandler::new(audio_cache.clone(), tts_engine),
            clear_by_texts_handler: ClearCacheByTextsHandler::new(audio_cache.clone()),
            clear_all_handler: ClearAllCacheHandler::new(audio_cache.clone()),
            stats_handler: GetCacheStatsHandler::new(audio_cache.clone()),
            entries_handler: ListCacheEntriesHandler::new(audio_cache),
        }
    }

    /// 解析并执行 JSON 任务
    pub async fn run_json(&self, input: &str) -> JobResponse {
        match serde_json::from_str::<JobRequest>(input) {
            Ok(request) => self.run(request).await,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid job request");
                JobResponse::error("invalid_request", format!("Invalid Request: {}", e))
            }
        }
    }

    /// 执行任务
    pub async fn run(&self, request: JobRequest) -> JobResponse {
        let result = match request {
            JobRequest::Generate {
                voice_id,
                messages,
                request,
            } => self.generate(voice_id, messages, request).await,
            JobRequest::Clear { voice_id, texts } => self.clear(voice_id, texts).await,
            JobRequest::ClearAll => self.clear_all().await,
            JobRequest::Stats => self.stats().await,
            JobRequest::Entries { voice_id } => self.entries(voice_id).await,
        };

        result.unwrap_or_else(error_response)
    }

    async fn generate(
        &self,
        voice_id: String,
        messages: Vec<crate::domain::voiceover::VoiceoverMessage>,
        request_overrides: serde_json::Map<String, Value>,
    ) -> Result<JobResponse, ApplicationError> {
        let response = self
            .generate_handler
            .handle(GenerateVoiceoverCommand {
                voice_id,
                messages,
                request_overrides,
            })
            .await?;

        let message = format!("Generated {} voiceover clips.", response.clips.len());
        Ok(JobResponse::success(message, Some(to_data(&response)?)))
    }

    async fn clear(
        &self,
        voice_id: String,
        texts: Vec<String>,
    ) -> Result<JobResponse, ApplicationError> {
        let response = self
            .clear_by_texts_handler
            .handle(ClearCacheByTextsCommand { voice_id, texts })
            .await?;

        let data = to_data(&response)?;
        if response.is_partial() {
            Ok(JobResponse::partial(
                "Some of text are not cleared.",
                response.not_cleared,
                Some(data),
            ))
        } else {
            Ok(JobResponse::success(
                "Cache cleared for specified texts.",
                Some(data),
            ))
        }
    }

    async fn clear_all(&self) -> Result<JobResponse, ApplicationError> {
        let response = self.clear_all_handler.handle(ClearAllCacheCommand).await?;
        Ok(JobResponse::success(
            "Cache cleared.",
            Some(to_data(&response)?),
        ))
    }

    async fn stats(&self) -> Result<JobResponse, ApplicationError> {
        let stats = self.stats_handler.handle(GetCacheStatsQuery).await?;
        Ok(JobResponse::success("Cache stats.", Some(to_data(&stats)?)))
    }

    async fn entries(&self, voice_id: Option<String>) -> Result<JobResponse, ApplicationError> {
        let entries = self
            .entries_handler
            .handle(ListCacheEntriesQuery { voice_id })
            .await?;
        Ok(JobResponse::success(
            format!("{} cache entries.", entries.len()),
            Some(to_data(&entries)?),
        ))
    }
}

fn to_data<T: Serialize>(value: &T) -> Result<Value, ApplicationError> {
    serde_json::to_value(value).map_err(|e| ApplicationError::StorageError(e.to_string()))
}

fn error_response(err: ApplicationError) -> JobResponse {
    let status = err.status();
    match &err {
        ApplicationError::StorageError(_) => {
            tracing::error!(status = status, error = %err, "Job failed");
        }
        _ => {
            tracing::warn!(status = status, error = %err, "Job rejected");
        }
    }
    JobResponse::error(status, err.to_string())
}
