use serde::Serialize;
use serde_json::{Map, Value};
use stream_chat_model::{Message, Role, TurnRequest};

use crate::DifyConfig;

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatMessagesRequest {
    messages: Vec<WireMessage>,
    user: String,
    inputs: Map<String, Value>,
    query: String,
    stream: bool,
    conversation_id: String,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &TurnRequest,
    config: &DifyConfig,
) -> ChatMessagesRequest {
    ChatMessagesRequest {
        messages: req.history.iter().map(create_message).collect(),
        user: config.user.clone(),
        inputs: Map::new(),
        query: req.query.clone(),
        stream: true,
        conversation_id: req.conversation_id.clone(),
    }
}

#[inline]
fn create_message(msg: &Message) -> WireMessage {
    WireMessage {
        role: match msg.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        },
        content: msg.content.clone(),
    }
}
