//! Domain Layer - 领域层
//!
//! Voiceover Context: 配音请求、消息校验

pub mod voiceover;
