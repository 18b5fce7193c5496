//! Voiceover Context - 配音限界上下文
//!
//! 职责:
//! - 配音消息与音色标识
//! - 请求校验（消息数量、必填字段）

mod errors;
mod value_objects;

pub use errors::VoiceoverError;
pub use value_objects::{
    is_valid_voice_id, requested_characters, validate_messages, validate_texts, VoiceId,
    VoiceoverMessage, MAX_MESSAGES,
};
