//! Server-sent event frames.

use bytes::Bytes;
use serde_json::json;

/// One `event: <kind>\ndata: <payload>\n\n` frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A serialized item (JSON text, no raw newlines).
    Data(String),
    /// An error message, sent as `{"error": ...}`.
    Error(String),
    /// End of stream, empty data.
    Eof,
}

impl Frame {
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Data(_) => "data",
            Frame::Error(_) => "error",
            Frame::Eof => "EOF",
        }
    }

    pub fn encode(&self) -> Bytes {
        let payload = match self {
            Frame::Data(json) => json.clone(),
            Frame::Error(message) => json!({ "error": message }).to_string(),
            Frame::Eof => String::new(),
        };
        Bytes::from(format!("event: {}\ndata: {}\n\n", self.kind(), payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        assert_eq!(
            Frame::Data("{\"n\":1}".into()).encode(),
            "event: data\ndata: {\"n\":1}\n\n"
        );
        assert_eq!(
            Frame::Error("Server Timeout".into()).encode(),
            "event: error\ndata: {\"error\":\"Server Timeout\"}\n\n"
        );
        assert_eq!(Frame::Eof.encode(), "event: EOF\ndata: \n\n");
    }

    #[test]
    fn test_error_message_is_escaped() {
        let frame = Frame::Error("bad \"quote\"\nnext".into()).encode();
        assert_eq!(
            frame,
            "event: error\ndata: {\"error\":\"bad \\\"quote\\\"\\nnext\"}\n\n"
        );
    }
}
