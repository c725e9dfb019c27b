use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One decoded record of a streaming answer.
///
/// Only `conversation_id` and `answer` drive the turn. The rest is kept:
/// keys this type doesn't name are collected verbatim in
/// [`StreamEvent::extra`], and absent keys stay absent when the event is
/// serialized again. An explicit `null` on a named key reads the same as
/// a missing key and is not written back.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// The event kind, e.g. `message`, `message_end` or `error`.
    #[serde(default)]
    pub event: String,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// The conversation this event belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// A fragment of the assistant's reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Usage and other bookkeeping, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// Creation time in seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Any other keys of the record.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StreamEvent {
    /// Returns the conversation id, or an empty string if absent.
    #[inline]
    pub fn conversation_id(&self) -> &str {
        self.conversation_id.as_deref().unwrap_or_default()
    }

    /// Returns the answer fragment, or an empty string if absent.
    #[inline]
    pub fn answer(&self) -> &str {
        self.answer.as_deref().unwrap_or_default()
    }

    /// Returns the message of an `error` event.
    pub fn error_message(&self) -> Option<&str> {
        if self.event != "error" {
            return None;
        }
        self.extra.get("message").and_then(Value::as_str)
    }
}

/// The `metadata` block of a stream event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Token and price accounting for the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Any other keys, e.g. retriever resources.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Token and price accounting reported at the end of an answer.
///
/// Prices are decimal strings as sent by the remote service.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_unit_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_price_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_unit_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_price_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_message_end_keeps_everything() {
        let raw = json!({
            "event": "message_end",
            "task_id": "t1",
            "id": "m1",
            "message_id": "m1",
            "conversation_id": "cv1",
            "metadata": {
                "usage": {
                    "prompt_tokens": 1033,
                    "prompt_unit_price": "0.001",
                    "total_tokens": 1161,
                    "currency": "USD",
                    "latency": 0.768
                },
                "retriever_resources": []
            },
            "created_at": 1705395332,
            "files": null
        });
        let event: StreamEvent = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(event.answer(), "");
        assert_eq!(event.conversation_id(), "cv1");
        let usage = event.metadata.as_ref().unwrap().usage.as_ref().unwrap();
        assert_eq!(usage.total_tokens, Some(1161));
        assert_eq!(serde_json::to_value(&event).unwrap(), raw);
    }

    #[test]
    fn test_error_message() {
        let event: StreamEvent = serde_json::from_value(json!({
            "event": "error",
            "status": 400,
            "code": "invalid_param",
            "message": "query is required"
        }))
        .unwrap();
        assert_eq!(event.error_message(), Some("query is required"));

        let event: StreamEvent = serde_json::from_value(json!({
            "event": "message",
            "message": "not an error"
        }))
        .unwrap();
        assert_eq!(event.error_message(), None);
    }

    #[test]
    fn test_null_named_key_reads_as_absent() {
        let event: StreamEvent = serde_json::from_value(json!({
            "event": "message",
            "conversation_id": "cv1",
            "answer": null,
            "files": null
        }))
        .unwrap();
        assert_eq!(event.answer, None);
        assert_eq!(event.answer(), "");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event": "message",
                "conversation_id": "cv1",
                "files": null
            })
        );
    }
}
