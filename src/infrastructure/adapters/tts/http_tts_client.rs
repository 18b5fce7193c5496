//! HTTP TTS Client - 调用 ElevenLabs 兼容的 TTS HTTP 服务
//!
//! 实现 TtsEnginePort trait
//!
//! 外部 TTS API:
//! POST {base_url}/v1/text-to-speech/{voice_id}/stream?output_format=mp3_44100_128
//! Header: xi-api-key
//! Request: {"text": "...", "model_id": "...", "voice_settings": {...}}  (JSON)
//! Response: audio/mpeg 流
//!
//! GET {base_url}/v1/user/subscription -> {"character_count": .., "character_limit": ..}

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::application::ports::{SynthesisRequest, TtsEnginePort, TtsError};

const API_KEY_HEADER: &str = "xi-api-key";

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// API Key
    pub api_key: String,
    /// 模型 ID
    pub model_id: String,
    /// 输出格式
    pub output_format: String,
    /// 稳定性
    pub stability: f32,
    /// 相似度增强
    pub similarity_boost: f32,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".to_string(),
            api_key: String::new(),
            model_id: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_44100_128".to_string(),
            stability: 0.5,
            similarity_boost: 0.5,
            timeout_secs: 120,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// 订阅信息（只取额度字段）
#[derive(Debug, Deserialize)]
struct Subscription {
    character_count: u64,
    character_limit: u64,
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// 获取合成 URL
    fn stream_url(&self, voice_id: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}/stream?output_format={}",
            self.base_url(),
            voice_id,
            self.config.output_format
        )
    }

    /// 获取订阅信息 URL
    fn subscription_url(&self) -> String {
        format!("{}/v1/user/subscription", self.base_url())
    }

    /// 构造请求体，overrides 浅合并到默认字段之上
    fn request_body(&self, text: &str, overrides: &Map<String, Value>) -> Value {
        let mut body = json!({
            "text": text,
            "model_id": self.config.model_id,
            "voice_settings": {
                "stability": self.config.stability,
                "similarity_boost": self.config.similarity_boost,
            },
        });
        if let Value::Object(fields) = &mut body {
            for (key, value) in overrides {
                fields.insert(key.clone(), value.clone());
            }
            // 文本不允许被覆盖
            fields.insert("text".to_string(), Value::String(text.to_string()));
        }
        body
    }
}

fn map_send_error(e: reqwest::Error) -> TtsError {
    if e.is_timeout() {
        TtsError::Timeout
    } else if e.is_connect() {
        TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
    } else {
        TtsError::NetworkError(e.to_string())
    }
}

/// 把非 2xx 响应转换为 TtsError
///
/// 响应体形如 `{"detail": {"status": "quota_exceeded", "message": "..."}}` 时视为额度耗尽
pub fn classify_error_response(status: StatusCode, body: &str) -> TtsError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned());

    let detail_status = detail
        .as_ref()
        .and_then(|d| d.get("status"))
        .and_then(Value::as_str);

    if detail_status == Some("quota_exceeded") {
        let message = detail
            .as_ref()
            .and_then(|d| d.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("Character limit reached.");
        return TtsError::QuotaExceeded(message.to_string());
    }

    if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        return TtsError::Timeout;
    }

    TtsError::ServiceError(format!("HTTP {}: {}", status, body))
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn synthesize_to_file(
        &self,
        request: SynthesisRequest,
        target: &Path,
    ) -> Result<u64, TtsError> {
        let url = self.stream_url(&request.voice_id);
        let body = self.request_body(&request.text, &request.overrides);

        tracing::debug!(
            url = %url,
            text_len = request.text.len(),
            voice_id = %request.voice_id,
            "Sending TTS request"
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_error_response(status, &error_text));
        }

        let mut file = tokio::fs::File::create(target)
            .await
            .map_err(|e| TtsError::IoError(format!("{}: {}", target.display(), e)))?;

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else {
                    TtsError::InvalidResponse(format!("Failed to read audio: {}", e))
                }
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| TtsError::IoError(e.to_string()))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| TtsError::IoError(e.to_string()))?;

        if written == 0 {
            return Err(TtsError::InvalidResponse("Empty audio stream".to_string()));
        }

        tracing::info!(
            voice_id = %request.voice_id,
            audio_size = written,
            "TTS generation completed"
        );

        Ok(written)
    }

    async fn remaining_credits(&self) -> Result<Option<u64>, TtsError> {
        let response = self
            .client
            .get(self.subscription_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_error_response(status, &error_text));
        }

        let subscription: Subscription = response
            .json()
            .await
            .map_err(|e| TtsError::InvalidResponse(e.to_string()))?;

        Ok(Some(
            subscription
                .character_limit
                .saturating_sub(subscription.character_count),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpTtsClientConfig::default();
        assert_eq!(config.base_url, "https://api.elevenlabs.io");
        assert_eq!(config.model_id, "eleven_multilingual_v2");
        assert_eq!(config.output_format, "mp3_44100_128");
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_config_builder() {
        let config = HttpTtsClientConfig::new("http://example.com:9000", "key").with_timeout(60);
        assert_eq!(config.base_url, "http://example.com:9000");
        assert_eq!(config.api_key, "key");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_urls() {
        let client =
            HttpTtsClient::new(HttpTtsClientConfig::new("http://tts.local/", "key")).unwrap();
        assert_eq!(
            client.stream_url("voice1"),
            "http://tts.local/v1/text-to-speech/voice1/stream?output_format=mp3_44100_128"
        );
        assert_eq!(client.subscription_url(), "http://tts.local/v1/user/subscription");
    }

    #[test]
    fn test_request_body_merges_overrides() {
        let client = HttpTtsClient::new(HttpTtsClientConfig::default()).unwrap();
        let mut overrides = Map::new();
        overrides.insert("model_id".to_string(), json!("eleven_turbo_v2"));
        overrides.insert("text".to_string(), json!("ignored"));
        overrides.insert("seed".to_string(), json!(42));

        let body = client.request_body("Hello", &overrides);
        assert_eq!(body["text"], "Hello");
        assert_eq!(body["model_id"], "eleven_turbo_v2");
        assert_eq!(body["seed"], 42);
        assert_eq!(body["voice_settings"]["stability"], 0.5);
    }

    #[test]
    fn test_classify_quota_exceeded() {
        let body = r#"{"detail":{"status":"quota_exceeded","message":"You have 3 credits remaining"}}"#;
        let err = classify_error_response(StatusCode::UNAUTHORIZED, body);
        assert_eq!(
            err,
            TtsError::QuotaExceeded("You have 3 credits remaining".to_string())
        );
    }

    #[test]
    fn test_classify_other_errors() {
        assert_eq!(
            classify_error_response(StatusCode::GATEWAY_TIMEOUT, ""),
            TtsError::Timeout
        );
        assert!(matches!(
            classify_error_response(StatusCode::INTERNAL_SERVER_ERROR, "oops"),
            TtsError::ServiceError(_)
        ));
        assert!(matches!(
            classify_error_response(
                StatusCode::BAD_REQUEST,
                r#"{"detail":{"status":"voice_not_found"}}"#
            ),
            TtsError::ServiceError(_)
        ));
    }
}
