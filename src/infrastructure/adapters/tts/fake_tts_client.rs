//! Fake TTS Client - 用于本地调试与测试的 TTS 客户端
//!
//! 始终写入固定的音频数据，不实际调用 TTS 服务

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::application::ports::{SynthesisRequest, TtsEnginePort, TtsError};

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 固定写入的音频数据
    pub audio_data: Vec<u8>,
    /// 模拟合成延迟（毫秒）
    pub delay_ms: u64,
    /// 初始剩余额度，None 表示不限
    pub credits: Option<u64>,
    /// 设置后每次合成写入一半数据再返回该错误
    pub fail_with: Option<TtsError>,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            audio_data: b"ID3\x04\x00\x00\x00\x00\x00\x00fake-mp3-frame".to_vec(),
            delay_ms: 0,
            credits: None,
            fail_with: None,
        }
    }
}

/// Fake TTS Client
///
/// 记录调用次数；配置了额度时按文本字符数扣减
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
    calls: AtomicUsize,
    used_credits: AtomicU64,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        tracing::info!(
            delay_ms = config.delay_ms,
            credits = ?config.credits,
            "FakeTtsClient initialized"
        );
        Self {
            config,
            calls: AtomicUsize::new(0),
            used_credits: AtomicU64::new(0),
        }
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self::new(FakeTtsClientConfig::default())
    }

    /// 合成调用次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize_to_file(
        &self,
        request: SynthesisRequest,
        target: &Path,
    ) -> Result<u64, TtsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            text_len = request.text.len(),
            voice_id = %request.voice_id,
            "FakeTtsClient: writing fixed audio"
        );

        if self.config.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.delay_ms)).await;
        }

        if let Some(err) = &self.config.fail_with {
            let half = &self.config.audio_data[..self.config.audio_data.len() / 2];
            tokio::fs::write(target, half)
                .await
                .map_err(|e| TtsError::IoError(e.to_string()))?;
            return Err(err.clone());
        }

        let cost = request.text.chars().count() as u64;
        if let Some(limit) = self.config.credits {
            let used = self.used_credits.load(Ordering::SeqCst);
            if used + cost > limit {
                return Err(TtsError::QuotaExceeded(format!(
                    "You have {} credits remaining, while {} credits are required",
                    limit - used,
                    cost
                )));
            }
        }
        self.used_credits.fetch_add(cost, Ordering::SeqCst);

        tokio::fs::write(target, &self.config.audio_data)
            .await
            .map_err(|e| TtsError::IoError(e.to_string()))?;

        Ok(self.config.audio_data.len() as u64)
    }

    async fn remaining_credits(&self) -> Result<Option<u64>, TtsError> {
        Ok(self
            .config
            .credits
            .map(|limit| limit.saturating_sub(self.used_credits.load(Ordering::SeqCst))))
    }
}
