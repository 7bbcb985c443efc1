//! Line and payload parsing.

use serde_json::Value;

use super::events::{FrameLine, FrameParseError, FullMessage, InboundFrame};
use super::payloads::{ChunkPayload, CompletePayload, MessagePayload, OptionsPayload};
use crate::models::{MessageMetadata, MessagePart, MessageRole};

/// Parse a single transport line into its component type.
///
/// Unlike plain SSE, a line with no `data:` prefix is still a payload:
/// newline-delimited JSON backends send bare objects.
pub fn parse_frame_line(line: &str) -> FrameLine {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return FrameLine::Empty;
    }

    if let Some(stripped) = line.strip_prefix(':') {
        return FrameLine::Comment(stripped.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("event:") {
        return FrameLine::Event(rest.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("data:") {
        return FrameLine::Data(rest.trim().to_string());
    }

    FrameLine::Data(line.trim().to_string())
}

/// Decode one JSON payload into a frame.
///
/// Returns:
/// - `Ok(Some(frame))` - a frame the reconciler understands
/// - `Ok(None)` - valid JSON, but nothing to reconcile (unknown `type`, or
///   an object that is neither a control frame nor a message)
/// - `Err(error)` - the payload cannot be decoded; the caller skips it
pub fn decode_frame(
    data: &str,
    fallback_id: Option<&str>,
) -> Result<Option<InboundFrame>, FrameParseError> {
    let value: Value =
        serde_json::from_str(data).map_err(|e| FrameParseError::InvalidJson(e.to_string()))?;
    decode_value(value, fallback_id)
}

fn decode_value(
    value: Value,
    fallback_id: Option<&str>,
) -> Result<Option<InboundFrame>, FrameParseError> {
    if !value.is_object() {
        return Ok(None);
    }

    let frame_type = value.get("type").and_then(Value::as_str).map(str::to_string);
    match frame_type.as_deref() {
        Some("chunk") => {
            let payload: ChunkPayload = from_payload("chunk", value)?;
            let id = resolve_id(payload.id, fallback_id, "chunk")?;
            Ok(Some(InboundFrame::Chunk {
                id,
                text_delta: payload.content.unwrap_or_default(),
            }))
        }
        Some("complete") => {
            let payload: CompletePayload = from_payload("complete", value)?;
            let id = resolve_id(payload.id, fallback_id, "complete")?;
            Ok(Some(InboundFrame::Complete { id }))
        }
        Some("options") => {
            let payload: OptionsPayload = from_payload("options", value)?;
            let id = resolve_id(payload.id, fallback_id, "options")?;
            Ok(Some(InboundFrame::Options {
                id,
                options: payload.options,
            }))
        }
        Some(_) => Ok(None),
        None if MessagePayload::is_message_shaped(&value) => {
            let payload: MessagePayload = from_payload("full_message", value)?;
            payload
                .into_full_message(fallback_id)
                .map(InboundFrame::FullMessage)
                .map(Some)
        }
        None => Ok(None),
    }
}

fn from_payload<T: serde::de::DeserializeOwned>(
    frame_type: &'static str,
    value: Value,
) -> Result<T, FrameParseError> {
    serde_json::from_value(value).map_err(|e| FrameParseError::InvalidPayload {
        frame_type,
        message: e.to_string(),
    })
}

fn resolve_id(
    id: Option<String>,
    fallback_id: Option<&str>,
    frame_type: &'static str,
) -> Result<String, FrameParseError> {
    id.or_else(|| fallback_id.map(str::to_string))
        .ok_or(FrameParseError::MissingId { frame_type })
}

/// Decode a complete, non-streamed reply body into frames.
///
/// Never fails: anything unrecognised becomes one assistant message holding
/// the raw body. Array elements without an id get a fresh one so they do not
/// collapse into each other.
pub fn decode_reply(body: &str, fallback_id: Option<&str>) -> Vec<InboundFrame> {
    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(_) => return vec![raw_reply(body, fallback_id)],
    };

    match value {
        Value::Array(items) => {
            let frames: Vec<InboundFrame> = items
                .into_iter()
                .filter(MessagePayload::is_message_shaped)
                .filter_map(|item| {
                    let fresh = uuid::Uuid::new_v4().to_string();
                    serde_json::from_value::<MessagePayload>(item)
                        .ok()?
                        .into_full_message(Some(&fresh))
                        .ok()
                })
                .map(InboundFrame::FullMessage)
                .collect();
            if frames.is_empty() {
                vec![raw_reply(body, fallback_id)]
            } else {
                frames
            }
        }
        Value::Object(ref map) => {
            if map.contains_key("type") || MessagePayload::is_message_shaped(&value) {
                if let Ok(Some(frame)) = decode_value(value.clone(), fallback_id) {
                    return vec![frame];
                }
            }
            let text = ["message", "response"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str));
            match text {
                Some(text) => vec![raw_reply(text, fallback_id)],
                None => vec![raw_reply(body, fallback_id)],
            }
        }
        _ => vec![raw_reply(body, fallback_id)],
    }
}

fn raw_reply(text: &str, fallback_id: Option<&str>) -> InboundFrame {
    let id = fallback_id
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let parts = if text.is_empty() {
        Vec::new()
    } else {
        vec![MessagePart::text(text)]
    };
    InboundFrame::FullMessage(FullMessage {
        id,
        role: MessageRole::Assistant,
        content: text.to_string(),
        parts,
        metadata: MessageMetadata::default(),
        timestamp: None,
        partial: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_line() {
        assert_eq!(
            parse_frame_line(r#"data: {"type":"complete","id":"m1"}"#),
            FrameLine::Data(r#"{"type":"complete","id":"m1"}"#.to_string())
        );
    }

    #[test]
    fn test_parse_bare_json_line() {
        assert_eq!(
            parse_frame_line(r#"{"type":"complete","id":"m1"}"#),
            FrameLine::Data(r#"{"type":"complete","id":"m1"}"#.to_string())
        );
    }

    #[test]
    fn test_parse_event_comment_and_empty() {
        assert_eq!(parse_frame_line("event: message"), FrameLine::Event("message".to_string()));
        assert_eq!(parse_frame_line(": keepalive"), FrameLine::Comment("keepalive".to_string()));
        assert_eq!(parse_frame_line(""), FrameLine::Empty);
        assert_eq!(parse_frame_line("\r"), FrameLine::Empty);
    }

    #[test]
    fn test_parse_strips_carriage_return() {
        assert_eq!(
            parse_frame_line("data: {}\r"),
            FrameLine::Data("{}".to_string())
        );
    }

    #[test]
    fn test_decode_chunk() {
        let frame = decode_frame(r#"{"type":"chunk","id":"m1","content":"Hel"}"#, None)
            .unwrap()
            .unwrap();
        assert_eq!(frame, InboundFrame::chunk("m1", "Hel"));
    }

    #[test]
    fn test_decode_chunk_text_aliases() {
        let frame = decode_frame(r#"{"type":"chunk","id":"m1","text":"a"}"#, None)
            .unwrap()
            .unwrap();
        assert_eq!(frame, InboundFrame::chunk("m1", "a"));

        let frame = decode_frame(r#"{"type":"chunk","id":"m1","delta":"b"}"#, None)
            .unwrap()
            .unwrap();
        assert_eq!(frame, InboundFrame::chunk("m1", "b"));
    }

    #[test]
    fn test_decode_chunk_without_text_is_empty_delta() {
        let frame = decode_frame(r#"{"type":"chunk","id":"m1"}"#, None)
            .unwrap()
            .unwrap();
        assert_eq!(frame, InboundFrame::chunk("m1", ""));
    }

    #[test]
    fn test_decode_complete_and_options() {
        let frame = decode_frame(r#"{"type":"complete","id":"m1"}"#, None)
            .unwrap()
            .unwrap();
        assert_eq!(frame, InboundFrame::complete("m1"));

        let frame = decode_frame(r#"{"type":"options","id":"m1","options":["Yes","No"]}"#, None)
            .unwrap()
            .unwrap();
        assert_eq!(frame, InboundFrame::options("m1", ["Yes", "No"]));
    }

    #[test]
    fn test_decode_numeric_id() {
        let frame = decode_frame(r#"{"type":"complete","id":7}"#, None)
            .unwrap()
            .unwrap();
        assert_eq!(frame.id(), "7");
    }

    #[test]
    fn test_decode_uses_fallback_id() {
        let frame = decode_frame(r#"{"type":"chunk","content":"hi"}"#, Some("local-1"))
            .unwrap()
            .unwrap();
        assert_eq!(frame, InboundFrame::chunk("local-1", "hi"));
    }

    #[test]
    fn test_decode_missing_id_without_fallback() {
        let err = decode_frame(r#"{"type":"complete"}"#, None).unwrap_err();
        assert_eq!(err, FrameParseError::MissingId { frame_type: "complete" });
    }

    #[test]
    fn test_decode_unknown_type_is_ignored() {
        assert_eq!(decode_frame(r#"{"type":"ping"}"#, None).unwrap(), None);
        assert_eq!(decode_frame(r#"{"status":"ok"}"#, None).unwrap(), None);
        assert_eq!(decode_frame("42", None).unwrap(), None);
    }

    #[test]
    fn test_decode_invalid_json() {
        let err = decode_frame("{not json", None).unwrap_err();
        assert!(matches!(err, FrameParseError::InvalidJson(_)));
    }

    #[test]
    fn test_decode_wrong_shape() {
        let err = decode_frame(r#"{"type":"options","id":"m1","options":"Yes"}"#, None).unwrap_err();
        assert!(matches!(
            err,
            FrameParseError::InvalidPayload { frame_type: "options", .. }
        ));
    }

    #[test]
    fn test_decode_message_shaped_object() {
        let frame = decode_frame(
            r#"{"id":"evt-1","author":"root_agent","content":{"role":"model","parts":[{"text":"Hi"}]}}"#,
            None,
        )
        .unwrap()
        .unwrap();
        match frame {
            InboundFrame::FullMessage(msg) => {
                assert_eq!(msg.id, "evt-1");
                assert_eq!(msg.content, "Hi");
                assert_eq!(msg.metadata.author.as_deref(), Some("root_agent"));
            }
            other => panic!("expected FullMessage, got {:?}", other),
        }
    }

    fn full(frame: &InboundFrame) -> &FullMessage {
        match frame {
            InboundFrame::FullMessage(msg) => msg,
            other => panic!("expected FullMessage, got {:?}", other),
        }
    }

    #[test]
    fn test_reply_array_of_events() {
        let body = r#"[
            {"id":"e1","content":{"role":"model","parts":[{"functionCall":{"name":"lookup","args":{}}}]}},
            {"content":{"role":"model","parts":[{"text":"Found it."}]}}
        ]"#;
        let frames = decode_reply(body, Some("local"));
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].id(), "e1");
        assert_ne!(frames[1].id(), "local");
        assert_eq!(full(&frames[1]).content, "Found it.");
    }

    #[test]
    fn test_reply_message_field() {
        let frames = decode_reply(r#"{"message":"Hello there"}"#, Some("local"));
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].id(), "local");
        assert_eq!(full(&frames[0]).content, "Hello there");
    }

    #[test]
    fn test_reply_response_field() {
        let frames = decode_reply(r#"{"response":"Sure"}"#, None);
        assert_eq!(full(&frames[0]).content, "Sure");
    }

    #[test]
    fn test_reply_typed_frame() {
        let frames = decode_reply(r#"{"type":"chunk","id":"m1","content":"x"}"#, None);
        assert_eq!(frames, vec![InboundFrame::chunk("m1", "x")]);
    }

    #[test]
    fn test_reply_raw_text() {
        let frames = decode_reply("plain text reply", Some("local"));
        assert_eq!(full(&frames[0]).content, "plain text reply");
        assert_eq!(full(&frames[0]).role, MessageRole::Assistant);

        let frames = decode_reply(r#"{"status":"ok"}"#, Some("local"));
        assert_eq!(full(&frames[0]).content, r#"{"status":"ok"}"#);
    }
}
