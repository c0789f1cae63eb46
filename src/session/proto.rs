//! Wire frames exchanged with the console service.
//!
//! Outbound commands and the fallback request share one body shape. Inbound
//! frames are tolerant of missing fields: the service may omit `sender`, and
//! frames without `text` carry nothing displayable.

use serde::{Deserialize, Serialize};

/// Sender label applied when an inbound frame omits `sender`.
pub const PROBLEM_STATEMENT_SENDER: &str = "problem statement";

/// Outbound command frame, also the body of the fallback request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandFrame {
    pub event: String,
}

impl CommandFrame {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
        }
    }

    pub fn from_text(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Inbound event frame pushed by the console service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl EventFrame {
    pub fn from_text(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Fallback response body from the task execution endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskReply {
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_frame_serializes_event_field_only() {
        let frame = CommandFrame::new("restart api pods");
        let encoded = frame.to_text().expect("encode");
        assert_eq!(encoded, r#"{"event":"restart api pods"}"#);

        let decoded = CommandFrame::from_text(&encoded).expect("decode");
        assert_eq!(decoded, frame);
    }

    #[test]
    fn event_frame_decodes_without_sender() {
        let frame = EventFrame::from_text(r#"{"text":"hello"}"#).expect("decode");
        assert_eq!(frame.sender, None);
        assert_eq!(frame.text.as_deref(), Some("hello"));
    }

    #[test]
    fn event_frame_decodes_without_text() {
        let frame = EventFrame::from_text(r#"{"sender":"SYSTEM"}"#).expect("decode");
        assert_eq!(frame.sender.as_deref(), Some("SYSTEM"));
        assert_eq!(frame.text, None);
    }

    #[test]
    fn event_frame_ignores_unknown_fields() {
        let frame = EventFrame::from_text(r#"{"sender":"agent","text":"ok","seq":7}"#)
            .expect("decode");
        assert_eq!(frame.sender.as_deref(), Some("agent"));
        assert_eq!(frame.text.as_deref(), Some("ok"));
    }

    #[test]
    fn event_frame_rejects_malformed_payloads() {
        assert!(EventFrame::from_text("not json").is_err());
        assert!(EventFrame::from_text(r#"{"text":42}"#).is_err());
    }

    #[test]
    fn event_frame_round_trip() {
        let frame = EventFrame {
            sender: Some("SYSTEM".to_string()),
            text: Some("Console streaming started".to_string()),
        };
        let encoded = frame.to_text().expect("encode");
        let decoded = EventFrame::from_text(&encoded).expect("decode");
        assert_eq!(decoded, frame);
    }

    #[test]
    fn task_reply_round_trip() {
        let reply = TaskReply {
            response: "scaled deployment to 3 replicas".to_string(),
        };
        let encoded = serde_json::to_string(&reply).expect("encode");
        let decoded: TaskReply = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded, reply);
    }
}
