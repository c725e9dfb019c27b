use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The default for [`Transcript::show_think`].
pub const DEFAULT_SHOW_THINK: bool = true;

/// The default for [`Transcript::typewriter_delay_ms`].
pub const DEFAULT_TYPEWRITER_DELAY_MS: u64 = 50;

/// The author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A prompt typed by the user.
    User,
    /// A reply from the remote service.
    Assistant,
}

/// A complete message in the conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl Message {
    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The persisted conversation state.
///
/// Every field is optional when reading, so older and newer history files
/// load without complaint. Unknown keys are ignored. The preference keys
/// `ShowThink` and `TypewriterDelay` used by earlier clients are still
/// read; when a file carries both spellings the current one wins. Saving
/// always writes the current spelling.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawTranscript")]
pub struct Transcript {
    /// The conversation identifier assigned by the remote service.
    ///
    /// Empty until the first stream event that carries one. Once set it
    /// never changes, see [`Transcript::latch_conversation_id`].
    pub conversation_id: String,
    /// Messages in chronological order.
    pub messages: Vec<Message>,
    /// Whether reasoning spans are displayed.
    pub show_think: bool,
    /// Delay between rendered characters, in milliseconds.
    pub typewriter_delay_ms: u64,
}

/// The on-disk shape, with both spellings of each preference.
#[derive(Default, Deserialize)]
#[serde(default)]
struct RawTranscript {
    conversation_id: String,
    messages: Vec<Message>,
    show_think: Option<bool>,
    #[serde(rename = "ShowThink")]
    legacy_show_think: Option<bool>,
    typewriter_delay_ms: Option<u64>,
    #[serde(rename = "TypewriterDelay")]
    legacy_typewriter_delay: Option<u64>,
}

impl From<RawTranscript> for Transcript {
    fn from(raw: RawTranscript) -> Self {
        Self {
            conversation_id: raw.conversation_id,
            messages: raw.messages,
            show_think: raw
                .show_think
                .or(raw.legacy_show_think)
                .unwrap_or(DEFAULT_SHOW_THINK),
            typewriter_delay_ms: raw
                .typewriter_delay_ms
                .or(raw.legacy_typewriter_delay)
                .unwrap_or(DEFAULT_TYPEWRITER_DELAY_MS),
        }
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self {
            conversation_id: String::new(),
            messages: Vec::new(),
            show_think: DEFAULT_SHOW_THINK,
            typewriter_delay_ms: DEFAULT_TYPEWRITER_DELAY_MS,
        }
    }
}

impl Transcript {
    /// Records `id` as the conversation identifier if none is known yet.
    ///
    /// Returns `true` if the identifier was taken. Empty values are
    /// never taken, and a known identifier is never replaced.
    pub fn latch_conversation_id(&mut self, id: &str) -> bool {
        if !self.conversation_id.is_empty() || id.is_empty() {
            return false;
        }
        self.conversation_id = id.to_owned();
        true
    }

    /// Appends a user turn.
    #[inline]
    pub fn push_user<S: Into<String>>(&mut self, content: S) {
        self.messages.push(Message::user(content));
    }

    /// Appends an assistant turn.
    #[inline]
    pub fn push_assistant<S: Into<String>>(&mut self, content: S) {
        self.messages.push(Message::assistant(content));
    }

    /// Returns the configured delay between rendered characters.
    #[inline]
    pub fn typewriter_delay(&self) -> Duration {
        Duration::from_millis(self.typewriter_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_defaults_when_fields_missing() {
        let transcript: Transcript = serde_json::from_str("{}").unwrap();
        assert_eq!(transcript, Transcript::default());
        assert!(transcript.show_think);
        assert_eq!(transcript.typewriter_delay_ms, 50);
    }

    #[test]
    fn test_legacy_keys_and_unknown_fields() {
        let transcript: Transcript = serde_json::from_value(json!({
            "ShowThink": false,
            "TypewriterDelay": 5,
            "conversation_id": "cv1",
            "messages": [
                { "role": "user", "content": "hello" },
                { "role": "assistant", "content": "Hi" }
            ],
            "theme": "dark"
        }))
        .unwrap();
        assert!(!transcript.show_think);
        assert_eq!(transcript.typewriter_delay_ms, 5);
        assert_eq!(transcript.conversation_id, "cv1");
        assert_eq!(
            transcript.messages,
            vec![Message::user("hello"), Message::assistant("Hi")]
        );
    }

    #[test]
    fn test_current_keys_win_over_legacy_keys() {
        let transcript: Transcript = serde_json::from_value(json!({
            "ShowThink": true,
            "show_think": false,
            "typewriter_delay_ms": 10,
            "TypewriterDelay": 5
        }))
        .unwrap();
        assert!(!transcript.show_think);
        assert_eq!(transcript.typewriter_delay_ms, 10);

        let value = serde_json::to_value(&transcript).unwrap();
        assert_eq!(value["show_think"], json!(false));
        assert_eq!(value["typewriter_delay_ms"], json!(10));
        assert!(value.get("ShowThink").is_none());
        assert!(value.get("TypewriterDelay").is_none());
    }

    #[test]
    fn test_serialize_writes_all_fields() {
        let value = serde_json::to_value(Transcript::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "conversation_id": "",
                "messages": [],
                "show_think": true,
                "typewriter_delay_ms": 50
            })
        );
    }

    #[test]
    fn test_latch_first_non_empty_id() {
        let mut transcript = Transcript::default();
        assert!(!transcript.latch_conversation_id(""));
        assert!(transcript.latch_conversation_id("cv1"));
        assert!(!transcript.latch_conversation_id("cv2"));
        assert!(!transcript.latch_conversation_id(""));
        assert_eq!(transcript.conversation_id, "cv1");
    }
}
