use serde::{Deserialize, Serialize};
use stream_chat_model::StreamEvent;

/// A line in a preset response body.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetLine {
    /// Raw bytes sent as they are, useful for malformed records.
    #[serde(rename = "raw")]
    Raw(String),
    /// The body fails to read at this point.
    #[serde(rename = "broken")]
    Broken,
}

/// The preset outcome of a request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresetResponse {
    /// A streaming body with these lines.
    Stream {
        /// Lines of the body.
        lines: Vec<PresetLine>,
    },
    /// A failure status with a body.
    Remote {
        /// The status code.
        status: u16,
        /// Lines of the body.
        body: Vec<String>,
    },
    /// The request never reaches the remote service.
    Transport,
}

impl PresetResponse {
    /// Creates a streaming response with the specified lines.
    #[inline]
    pub fn with_lines<S: Into<String>>(
        lines: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::Stream {
            lines: lines
                .into_iter()
                .map(|line| PresetLine::Raw(line.into()))
                .collect(),
        }
    }

    /// Creates a streaming response of `message` events.
    ///
    /// Each pair is a `(conversation_id, answer)`.
    pub fn with_answers<'a>(
        answers: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        Self::with_lines(
            answers
                .into_iter()
                .map(|(conversation_id, answer)| message_line(conversation_id, answer)),
        )
    }

    /// Creates a failure response.
    #[inline]
    pub fn with_status<S: Into<String>>(
        status: u16,
        body: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::Remote {
            status,
            body: body.into_iter().map(Into::into).collect(),
        }
    }

    /// Makes the body fail to read after the existing lines.
    pub fn then_broken(mut self) -> Self {
        if let Self::Stream { lines } = &mut self {
            lines.push(PresetLine::Broken);
        }
        self
    }
}

/// Encodes a `message` event the way the remote service does.
pub fn message_line(conversation_id: &str, answer: &str) -> String {
    let event = StreamEvent {
        event: "message".to_owned(),
        conversation_id: Some(conversation_id.to_owned()),
        answer: Some(answer.to_owned()),
        created_at: Some(1705395332),
        ..Default::default()
    };
    serde_json::to_string(&event).unwrap_or_default()
}
