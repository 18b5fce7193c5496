//! Voiceover Context - Errors

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VoiceoverError {
    #[error("Invalid input: messages must be a non-empty array.")]
    InvalidMessages,

    #[error("Too many messages. Please provide up to {0} messages.")]
    TooManyMessages(usize),

    #[error("Invalid input: 'voiceId' is required.")]
    MissingVoiceId,

    #[error("Invalid input: 'voiceId' may only contain ASCII letters, digits and '_': {0}")]
    InvalidVoiceId(String),

    #[error("Invalid input: 'texts' must be a non-empty array.")]
    InvalidTexts,
}

impl VoiceoverError {
    /// 对外返回的状态码
    pub fn status(&self) -> &'static str {
        match self {
            Self::InvalidMessages => "invalid_messages",
            Self::TooManyMessages(_) => "too_many_messages",
            Self::MissingVoiceId | Self::InvalidVoiceId(_) | Self::InvalidTexts => "invalid_input",
        }
    }
}
