use stream_chat_model::StreamEvent;

use crate::Error;

/// Decodes one line of a streaming body.
///
/// Each line is an independent JSON record. Lines may also carry SSE
/// framing: a `data:` prefix is stripped, while blank lines, comments
/// and `event:` lines carry no record and yield `Ok(None)`.
pub fn decode(line: &[u8]) -> Result<Option<StreamEvent>, Error> {
    let line = line.trim_ascii();
    if line.is_empty() || line.starts_with(b":") || line.starts_with(b"event:")
    {
        return Ok(None);
    }
    let payload = match line.strip_prefix(b"data:") {
        Some(rest) => rest.trim_ascii_start(),
        None => line,
    };
    serde_json::from_slice(payload)
        .map(Some)
        .map_err(|err| Error::decode(format!("invalid stream record: {err}")))
}

#[cfg(test)]
mod tests {
    use stream_chat_model::ErrorKind;

    use super::*;

    #[test]
    fn test_plain_record() {
        let event = decode(
            br#"{"event":"message","conversation_id":"cv1","answer":"Hi"}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(event.event, "message");
        assert_eq!(event.conversation_id(), "cv1");
        assert_eq!(event.answer(), "Hi");
    }

    #[test]
    fn test_sse_framing() {
        let event = decode(br#"data: {"answer":"Hi"}"#).unwrap().unwrap();
        assert_eq!(event.answer(), "Hi");
        assert!(decode(b"").unwrap().is_none());
        assert!(decode(b"  \r").unwrap().is_none());
        assert!(decode(b": keep-alive").unwrap().is_none());
        assert!(decode(b"event: ping").unwrap().is_none());
    }

    #[test]
    fn test_malformed_lines() {
        for line in [
            &b"{\"answer\": \"Hi\""[..],
            b"not json",
            b"\"just a string\"",
            b"data: [DONE]",
            b"\xff\xfe",
        ] {
            let err = decode(line).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Decode);
        }
    }
}
