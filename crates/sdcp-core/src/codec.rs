//! JSON codec for SDCP frames
//!
//! Outbound frames are plain `serde_json` documents. Inbound frames are read
//! in two steps: the shared [`Envelope`] first, then the full shape selected
//! by the topic. The two steps fail with different error kinds so a session
//! can tell a broken stream apart from one malformed message.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::message::{
    AttributesMessage, ErrorMessage, NotificationMessage, Response, StatusMessage, TopicKind,
    Topics,
};
use crate::{Error, Result};

/// Encode any wire shape to a JSON frame
pub fn encode<T: Serialize>(message: &T) -> Result<Bytes> {
    serde_json::to_vec(message)
        .map(Bytes::from)
        .map_err(|e| Error::Encode(e.to_string()))
}

/// Decode a JSON frame into a known shape
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    serde_json::from_slice(data).map_err(|e| Error::Decode(e.to_string()))
}

/// A decoded inbound frame
#[derive(Debug, Clone)]
pub enum Inbound {
    Response(Response<Value>),
    Status(StatusMessage),
    Attributes(AttributesMessage),
    Error(ErrorMessage),
    Notice(NotificationMessage),
    /// A frame on a topic this device does not own (or our own request echoed back)
    Other(String),
}

/// Classify and decode one inbound frame for the device owning `topics`
pub fn decode_inbound(topics: &Topics, data: &[u8]) -> Result<Inbound> {
    let value: Value = serde_json::from_slice(data).map_err(|e| Error::Envelope(e.to_string()))?;
    let topic = value
        .get("Topic")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Envelope("missing Topic".to_string()))?
        .to_string();

    let payload = |e: serde_json::Error| Error::Payload {
        topic: topic.clone(),
        reason: e.to_string(),
    };

    let inbound = match topics.classify(&topic) {
        TopicKind::Response => Inbound::Response(serde_json::from_value(value).map_err(payload)?),
        TopicKind::Status => Inbound::Status(serde_json::from_value(value).map_err(payload)?),
        TopicKind::Attributes => {
            Inbound::Attributes(serde_json::from_value(value).map_err(payload)?)
        }
        TopicKind::Error => Inbound::Error(serde_json::from_value(value).map_err(payload)?),
        TopicKind::Notice => Inbound::Notice(serde_json::from_value(value).map_err(payload)?),
        TopicKind::Request | TopicKind::Unknown => Inbound::Other(topic.clone()),
    };

    Ok(inbound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_errors_are_distinct() {
        let topics = Topics::new("A1B2");

        let err = decode_inbound(&topics, b"not json").unwrap_err();
        assert!(err.is_envelope());

        let err = decode_inbound(&topics, br#"{"Data":{}}"#).unwrap_err();
        assert!(err.is_envelope());

        let err = decode_inbound(&topics, br#"{"Topic":"sdcp/status/A1B2","Status":5}"#).unwrap_err();
        assert!(!err.is_envelope());
    }

    #[test]
    fn test_foreign_topic_is_other() {
        let topics = Topics::new("A1B2");
        let inbound = decode_inbound(&topics, br#"{"Topic":"sdcp/status/C3D4"}"#).unwrap();
        assert!(matches!(inbound, Inbound::Other(t) if t == "sdcp/status/C3D4"));
    }
}
