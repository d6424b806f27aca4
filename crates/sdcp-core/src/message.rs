//! Envelope shapes and per-device topics
//!
//! All four message kinds ride the same JSON object keyed by `Topic`; the
//! topic names are derived from the mainboard id so one WebSocket carries
//! requests, responses and both push channels for a single printer.

use serde::{Deserialize, Serialize};

use crate::command::{CommandCode, Source};
use crate::time::Timestamp;
use crate::types::{Attributes, Status};

/// The common part of every frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "Topic")]
    pub topic: String,
}

/// Kind of channel a topic names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    Request,
    Response,
    Status,
    Attributes,
    Error,
    Notice,
    Unknown,
}

/// Topic names for one mainboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    pub request: String,
    pub response: String,
    pub status: String,
    pub attributes: String,
    pub error: String,
    pub notice: String,
}

impl Topics {
    pub fn new(mainboard_id: &str) -> Self {
        Self {
            request: format!("sdcp/request/{}", mainboard_id),
            response: format!("sdcp/response/{}", mainboard_id),
            status: format!("sdcp/status/{}", mainboard_id),
            attributes: format!("sdcp/attributes/{}", mainboard_id),
            error: format!("sdcp/error/{}", mainboard_id),
            notice: format!("sdcp/notice/{}", mainboard_id),
        }
    }

    /// Map a topic string onto this device's channels
    pub fn classify(&self, topic: &str) -> TopicKind {
        if topic == self.response {
            TopicKind::Response
        } else if topic == self.status {
            TopicKind::Status
        } else if topic == self.attributes {
            TopicKind::Attributes
        } else if topic == self.request {
            TopicKind::Request
        } else if topic == self.error {
            TopicKind::Error
        } else if topic == self.notice {
            TopicKind::Notice
        } else {
            TopicKind::Unknown
        }
    }
}

/// Correlation fields and payload of a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestData<T> {
    #[serde(rename = "Cmd")]
    pub cmd: CommandCode,
    #[serde(rename = "Data")]
    pub data: T,
    #[serde(rename = "RequestID")]
    pub request_id: String,
    #[serde(rename = "MainboardID")]
    pub mainboard_id: String,
    #[serde(rename = "TimeStamp")]
    pub timestamp: Timestamp,
    #[serde(rename = "From")]
    pub from: Source,
}

/// A command sent to the printer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request<T> {
    #[serde(rename = "Topic")]
    pub topic: String,
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Data")]
    pub data: RequestData<T>,
}

/// Correlation fields and payload of a response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseData<T> {
    #[serde(rename = "Cmd")]
    pub cmd: CommandCode,
    #[serde(rename = "Data")]
    pub data: T,
    #[serde(rename = "RequestID")]
    pub request_id: String,
    #[serde(rename = "MainboardID")]
    pub mainboard_id: String,
    #[serde(rename = "TimeStamp", default)]
    pub timestamp: Timestamp,
}

/// The printer's answer to a [`Request`], matched by `RequestID`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response<T> {
    #[serde(rename = "Topic")]
    pub topic: String,
    #[serde(rename = "Id", default)]
    pub id: String,
    #[serde(rename = "Data")]
    pub data: ResponseData<T>,
}

impl Response<serde_json::Value> {
    pub fn request_id(&self) -> &str {
        &self.data.request_id
    }

    /// Decode the untyped payload into the command's response type
    pub fn into_payload<T: serde::de::DeserializeOwned>(self) -> crate::Result<T> {
        serde_json::from_value(self.data.data).map_err(|e| crate::Error::Payload {
            topic: self.topic,
            reason: e.to_string(),
        })
    }
}

/// Status push
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMessage {
    #[serde(rename = "Topic")]
    pub topic: String,
    #[serde(rename = "Status")]
    pub status: Status,
    #[serde(rename = "MainboardID", alias = "MachineID", default)]
    pub mainboard_id: String,
    #[serde(rename = "TimeStamp", default)]
    pub timestamp: Timestamp,
}

/// Attributes push
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributesMessage {
    #[serde(rename = "Topic")]
    pub topic: String,
    #[serde(rename = "Attributes")]
    pub attributes: Attributes,
    #[serde(rename = "MainboardID", default)]
    pub mainboard_id: String,
    #[serde(rename = "TimeStamp", default)]
    pub timestamp: Timestamp,
}

code_enum! {
    /// Failures reported on the error topic
    pub enum ErrorCode: u8 else Unknown {
        #[default]
        Md5Failed = 1,
        FormatFailed = 2,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorCodeData {
    #[serde(rename = "ErrorCode")]
    pub error_code: ErrorCode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorData {
    #[serde(rename = "Data")]
    pub data: ErrorCodeData,
    #[serde(rename = "MainboardID", default)]
    pub mainboard_id: String,
    #[serde(rename = "TimeStamp", default)]
    pub timestamp: Timestamp,
}

/// Error push
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "Topic")]
    pub topic: String,
    #[serde(rename = "Id", default)]
    pub id: String,
    #[serde(rename = "Data")]
    pub data: ErrorData,
}

code_enum! {
    pub enum NotificationType: u8 else Unknown {
        #[default]
        HistorySynchronized = 1,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationBody {
    /// Free text or embedded JSON
    #[serde(rename = "Message", default)]
    pub message: String,
    #[serde(rename = "Type")]
    pub kind: NotificationType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationData {
    #[serde(rename = "Data")]
    pub data: NotificationBody,
    #[serde(rename = "MainboardID", default)]
    pub mainboard_id: String,
    #[serde(rename = "TimeStamp", default)]
    pub timestamp: Timestamp,
}

/// Notification push
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationMessage {
    #[serde(rename = "Topic")]
    pub topic: String,
    #[serde(rename = "Id", default)]
    pub id: String,
    #[serde(rename = "Data")]
    pub data: NotificationData,
}

/// Body of a discovery reply
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryData {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "MachineName")]
    pub model: String,
    #[serde(rename = "BrandName")]
    pub brand_name: String,
    #[serde(rename = "MainboardIP")]
    pub mainboard_ip: String,
    #[serde(rename = "MainboardID")]
    pub mainboard_id: String,
    #[serde(rename = "ProtocolVersion")]
    pub protocol_version: String,
    #[serde(rename = "FirmwareVersion")]
    pub firmware_version: String,
}

/// A printer's reply to the discovery probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryMessage {
    /// Brand identifier
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Data")]
    pub data: DiscoveryData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topics_are_namespaced() {
        let topics = Topics::new("A1B2");
        assert_eq!(topics.request, "sdcp/request/A1B2");
        assert_eq!(topics.classify("sdcp/status/A1B2"), TopicKind::Status);
        assert_eq!(topics.classify("sdcp/status/FFFF"), TopicKind::Unknown);
    }

    #[test]
    fn test_status_push_accepts_machine_id_alias() {
        let msg: StatusMessage = serde_json::from_str(
            r#"{"Topic":"sdcp/status/A1B2","Status":{},"MachineID":"A1B2","TimeStamp":1}"#,
        )
        .unwrap();
        assert_eq!(msg.mainboard_id, "A1B2");
    }
}
