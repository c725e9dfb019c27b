use stream_chat_model::{Transcript, TurnRequest};

/// Builds the request for a new turn.
///
/// The prompt travels as its own `query`; `history` holds only the
/// earlier messages. The transcript is left untouched, appending the user
/// turn is up to the caller.
pub fn compose(transcript: &Transcript, prompt: &str) -> TurnRequest {
    TurnRequest {
        history: transcript.messages.clone(),
        query: prompt.to_owned(),
        conversation_id: transcript.conversation_id.clone(),
    }
}
