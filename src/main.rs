//! voxcache - 去重的 TTS 配音缓存
//!
//! 从 stdin 读取一个 JSON 任务，执行后把结果 JSON 写到 stdout。
//! 日志输出到 stderr。
//!
//! 用法: `voxcache [--config <path>] < job.json`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncReadExt;

use voxcache::application::TtsEnginePort;
use voxcache::config::{load_config_from_path, print_config, AppConfig, TtsProvider};
use voxcache::infrastructure::adapters::{FakeTtsClient, HttpTtsClient};
use voxcache::infrastructure::job::JobRunner;
use voxcache::infrastructure::persistence::FileAudioCache;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = parse_config_arg()?;

    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config_from_path(config_path.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);
    print_config(&config);

    // 创建并加载文件缓存
    let audio_cache = Arc::new(
        FileAudioCache::open(&config.cache.to_file_cache_config())
            .await
            .context("Failed to open voiceover cache")?,
    );

    // 创建 TTS 引擎
    let tts_engine: Arc<dyn TtsEnginePort> = match config.tts.provider {
        TtsProvider::Elevenlabs => Arc::new(
            HttpTtsClient::new(config.tts.to_http_config())
                .context("Failed to create TTS client")?,
        ),
        TtsProvider::Fake => Arc::new(FakeTtsClient::with_defaults()),
    };

    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read job from stdin")?;

    let runner = JobRunner::new(audio_cache, tts_engine);
    let response = runner.run_json(&input).await;

    println!("{}", serde_json::to_string_pretty(&response)?);

    if response.status != "success" && response.status != "partial" {
        std::process::exit(1);
    }

    Ok(())
}

/// 解析 `--config <path>`
fn parse_config_arg() -> anyhow::Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    let mut config_path = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config requires a path")?;
                config_path = Some(PathBuf::from(path));
            }
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }
    Ok(config_path)
}

/// 初始化日志（stdout 留给任务结果）
fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},voxcache={}",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
