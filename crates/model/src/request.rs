use crate::Message;

/// A request for one turn, independent of any wire format.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TurnRequest {
    /// Messages from earlier turns, in chronological order. The new
    /// prompt is not part of this list.
    pub history: Vec<Message>,
    /// The new user prompt.
    pub query: String,
    /// The conversation to continue. Empty asks the remote service to
    /// start a new one.
    pub conversation_id: String,
}
