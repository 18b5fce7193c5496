//! Voiceover Context - Value Objects

use serde::{Deserialize, Serialize};

use super::VoiceoverError;

/// 单次请求允许的消息数上限（不含）
pub const MAX_MESSAGES: usize = 100;

/// voice id 是否只含 `[A-Za-z0-9_]`
///
/// 去重 key 是 `{voice_id}-{text}`，voice id 不能含 `-`，否则不同音色的 key 会重叠
pub fn is_valid_voice_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// 音色标识（TTS 服务侧的 voice id）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoiceId(String);

impl VoiceId {
    pub fn new(id: impl Into<String>) -> Result<Self, VoiceoverError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(VoiceoverError::MissingVoiceId);
        }
        if !is_valid_voice_id(&id) {
            return Err(VoiceoverError::InvalidVoiceId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 配音消息
///
/// `name` 与 `text` 都可能缺失，缺失的消息会被跳过而不是整体报错
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceoverMessage {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl VoiceoverMessage {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            text: Some(text.into()),
        }
    }

    /// name 与 text 都存在时返回二者
    pub fn parts(&self) -> Option<(&str, &str)> {
        match (&self.name, &self.text) {
            (Some(name), Some(text)) => Some((name.as_str(), text.as_str())),
            _ => None,
        }
    }
}

/// 校验消息列表
pub fn validate_messages(messages: &[VoiceoverMessage]) -> Result<(), VoiceoverError> {
    if messages.is_empty() {
        return Err(VoiceoverError::InvalidMessages);
    }
    if messages.len() >= MAX_MESSAGES {
        return Err(VoiceoverError::TooManyMessages(MAX_MESSAGES));
    }
    Ok(())
}

/// 校验待清除的文本列表
pub fn validate_texts(texts: &[String]) -> Result<(), VoiceoverError> {
    if texts.is_empty() {
        return Err(VoiceoverError::InvalidTexts);
    }
    Ok(())
}

/// 文本的字符总数（额度按字符计费）
pub fn requested_characters<'a>(texts: impl IntoIterator<Item = &'a str>) -> u64 {
    texts.into_iter().map(|t| t.chars().count() as u64).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_id_required() {
        assert!(VoiceId::new("JBFqnCBsd6RMkjVDRZzb").is_ok());
        assert_eq!(VoiceId::new("  "), Err(VoiceoverError::MissingVoiceId));
        assert!(VoiceId::new("voice_1").is_ok());
    }

    #[test]
    fn test_voice_id_rejects_key_separator() {
        assert_eq!(
            VoiceId::new("a-b"),
            Err(VoiceoverError::InvalidVoiceId("a-b".to_string()))
        );
        assert!(VoiceId::new("a b").is_err());
        assert!(VoiceId::new("voix-é").is_err());
        assert!(!is_valid_voice_id(""));
    }

    #[test]
    fn test_validate_messages() {
        assert_eq!(validate_messages(&[]), Err(VoiceoverError::InvalidMessages));

        let one = vec![VoiceoverMessage::new("intro", "Hello")];
        assert!(validate_messages(&one).is_ok());

        let ninety_nine = vec![VoiceoverMessage::default(); MAX_MESSAGES - 1];
        assert!(validate_messages(&ninety_nine).is_ok());

        let hundred = vec![VoiceoverMessage::default(); MAX_MESSAGES];
        assert_eq!(
            validate_messages(&hundred),
            Err(VoiceoverError::TooManyMessages(MAX_MESSAGES))
        );
    }

    #[test]
    fn test_message_parts() {
        assert_eq!(
            VoiceoverMessage::new("a", "b").parts(),
            Some(("a", "b"))
        );
        let missing_text = VoiceoverMessage {
            name: Some("a".to_string()),
            text: None,
        };
        assert_eq!(missing_text.parts(), None);
        // 空文本是合法的
        assert_eq!(VoiceoverMessage::new("a", "").parts(), Some(("a", "")));
    }

    #[test]
    fn test_message_deserialize_with_missing_fields() {
        let msg: VoiceoverMessage = serde_json::from_str(r#"{"name":"only-name"}"#).unwrap();
        assert_eq!(msg.name.as_deref(), Some("only-name"));
        assert!(msg.text.is_none());
    }

    #[test]
    fn test_requested_characters_counts_chars() {
        assert_eq!(requested_characters(["héllo", "ok"]), 7);
        assert_eq!(requested_characters(Vec::<&str>::new()), 0);
    }
}
